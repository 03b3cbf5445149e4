// ==========================================
// 商机数据装载工具 - 交互菜单
// ==========================================
// 每轮读取一行选择,直到选择退出或输入结束
// 1 端点源码 / 2 上传 / 3 批处理作业 / 4 上传进度 / 5 最近运行 / 6 退出
// 红线: 登录失败中止菜单;其他错误输出后继续
// ==========================================

use crate::app::commands::{
    show_batch_jobs, show_endpoint_source, show_recent_runs, show_upload_progress, upload_csv,
};
use crate::app::error::AppResult;
use crate::app::state::AppState;
use crate::config::UploadConfig;
use crate::salesforce::DEFAULT_JOB_LIMIT;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::warn;

/// 最近运行展示条数
const RECENT_RUN_LIMIT: usize = 10;

const MENU_TEXT: &str = "\
请选择操作:
1. 显示需部署的 REST 端点 Apex 代码
2. 上传 CSV 文件
3. 查看批处理作业状态
4. 查看上传进度
5. 查看最近的上传运行
6. 退出";

/// 读取一行（输入结束返回 None）
fn read_line<R: BufRead>(input: &mut R) -> AppResult<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn prompt<W: Write>(out: &mut W, text: &str) -> AppResult<()> {
    write!(out, "{}", text)?;
    out.flush()?;
    Ok(())
}

/// 运行交互菜单
///
/// # 参数
/// - state: 应用状态（台账 + 延迟登录的客户端）
/// - upload: 上传配置（默认文件路径、批次参数）
/// - input / out: 用户输入与输出
pub async fn run_menu<R: BufRead, W: Write>(
    state: &AppState,
    upload: &UploadConfig,
    mut input: R,
    out: &mut W,
) -> AppResult<()> {
    loop {
        writeln!(out)?;
        writeln!(out, "{}", MENU_TEXT)?;
        prompt(out, "\n请输入选项 (1-6): ")?;

        let Some(choice) = read_line(&mut input)? else {
            break;
        };

        let result = match choice.as_str() {
            "1" => show_endpoint_source(out),
            "2" => menu_upload(state, upload, &mut input, out).await,
            "3" => match state.monitor().await {
                Ok(monitor) => show_batch_jobs(&monitor, DEFAULT_JOB_LIMIT, out).await,
                Err(e) => Err(e),
            },
            "4" => match state.monitor().await {
                Ok(monitor) => show_upload_progress(&monitor, out).await.map(|_| ()),
                Err(e) => Err(e),
            },
            "5" => show_recent_runs(&state.ledger, RECENT_RUN_LIMIT, out),
            "6" => {
                writeln!(out, "\n再见!")?;
                break;
            }
            _ => {
                writeln!(out, "\n✗ 无效选项")?;
                Ok(())
            }
        };

        if let Err(e) = result {
            if e.is_login_failure() {
                return Err(e);
            }
            warn!(choice = %choice, error = %e, "菜单操作失败");
            writeln!(out, "\n✗ {}", e)?;
        }
    }

    Ok(())
}

/// 菜单上传: 文件缺失时询问替代路径,yes 确认后执行
async fn menu_upload<R: BufRead, W: Write>(
    state: &AppState,
    upload: &UploadConfig,
    input: &mut R,
    out: &mut W,
) -> AppResult<()> {
    let mut path = upload.csv_path.clone();

    if !path.exists() {
        writeln!(out, "\n✗ 未找到 CSV 文件: {}", path.display())?;
        prompt(out, "请输入 CSV 文件路径: ")?;
        let Some(line) = read_line(input)? else {
            return Ok(());
        };
        path = PathBuf::from(line);
        if !path.exists() {
            writeln!(out, "✗ 文件不存在: {}", path.display())?;
            return Ok(());
        }
    }

    prompt(
        out,
        &format!("\n确认上传 {}? 将处理全部记录 (yes/no): ", path.display()),
    )?;
    let confirmed = read_line(input)?
        .map(|answer| answer.eq_ignore_ascii_case("yes"))
        .unwrap_or(false);
    if !confirmed {
        writeln!(out, "已取消上传")?;
        return Ok(());
    }

    let config = upload.clone().with_csv_path(path);
    upload_csv(state, &config, out).await.map(|_| ())
}
