// ==========================================
// 商机数据装载工具 - 命令行入口
// ==========================================
// 子命令: generate / upload / jobs / progress / runs / endpoint / menu
// 无子命令时进入交互菜单
// ==========================================

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use opportunity_loader::app::{self, commands, AppError, AppState};
use opportunity_loader::config::{GeneratorConfig, SalesforceConfig, UploadConfig};
use opportunity_loader::salesforce::DEFAULT_JOB_LIMIT;
use opportunity_loader::{logging, CloseDateFormat, SubmitProtocol};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "opportunity-loader", version)]
#[command(about = "商机测试数据生成与 Salesforce 分批上传", long_about = None)]
struct Cli {
    /// 台账数据库路径 [默认: $OPPORTUNITY_LOADER_DB_PATH 或用户数据目录]
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<String>,

    /// 以 JSON 格式输出日志
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// 从客户清单生成商机 CSV
    Generate {
        /// 客户清单（需含 Id 列）
        #[arg(long, value_name = "FILE", default_value = "Accounts.csv")]
        accounts: PathBuf,

        /// 输出 CSV（已存在则覆盖）
        #[arg(short, long, value_name = "FILE", default_value = "generated_opportunities_enhanced.csv")]
        output: PathBuf,

        /// 生成条数
        #[arg(short = 'n', long, default_value_t = 2_000_000)]
        count: usize,

        /// 随机种子（固定后结果可复现）
        #[arg(long)]
        seed: Option<u64>,

        /// 成交日期格式: dmy | iso
        #[arg(long, default_value = "dmy")]
        date_format: CloseDateFormat,
    },

    /// 分批上传商机 CSV
    Upload(UploadArgs),

    /// 查看远端作业状态
    Jobs {
        /// 展示条数
        #[arg(long, default_value_t = DEFAULT_JOB_LIMIT)]
        limit: usize,

        /// 只看某次上传运行产生的作业
        #[arg(long, value_name = "RUN_ID")]
        run: Option<String>,
    },

    /// 查看已上传的商机数
    Progress,

    /// 查看本地台账中的最近上传
    Runs {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// 输出需部署的 REST 端点 Apex 代码
    Endpoint,

    /// 交互菜单
    Menu(UploadArgs),
}

#[derive(Args, Clone)]
struct UploadArgs {
    /// 提交协议: apex-script | rest-json | bulk-ingest
    #[arg(short, long, default_value = "rest-json")]
    protocol: SubmitProtocol,

    /// 商机 CSV 路径
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,

    /// 每批记录数 [默认按协议]
    #[arg(long)]
    batch_size: Option<usize>,

    /// 批间等待毫秒数 [默认按协议]
    #[arg(long)]
    delay_ms: Option<u64>,

    /// 单次请求超时秒数
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl Default for UploadArgs {
    fn default() -> Self {
        Self {
            protocol: SubmitProtocol::RestJson,
            csv: None,
            batch_size: None,
            delay_ms: None,
            timeout_secs: None,
        }
    }
}

impl UploadArgs {
    fn to_config(&self) -> UploadConfig {
        let mut config = UploadConfig::for_protocol(self.protocol);
        if let Some(csv) = &self.csv {
            config = config.with_csv_path(csv);
        }
        if let Some(batch_size) = self.batch_size {
            config = config.with_batch_size(batch_size);
        }
        if let Some(delay_ms) = self.delay_ms {
            config = config.with_inter_batch_delay(Duration::from_millis(delay_ms));
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config = config.with_request_timeout(Duration::from_secs(timeout_secs));
        }
        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env 不存在时忽略
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    if cli.json_logs {
        logging::init_json();
    } else {
        logging::init();
    }

    tracing::info!("{} v{}", opportunity_loader::APP_NAME, opportunity_loader::VERSION);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\n✗ {:#}", e);
            let login_failed = e
                .downcast_ref::<AppError>()
                .map(AppError::is_login_failure)
                .unwrap_or(false);
            if login_failed {
                eprintln!("\n{}", SalesforceConfig::setup_hint());
            }
            ExitCode::FAILURE
        }
    }
}

fn open_state(db: Option<String>, timeout: Option<Duration>) -> anyhow::Result<AppState> {
    let db_path = db.unwrap_or_else(app::get_default_db_path);
    let state = AppState::new(db_path.clone(), SalesforceConfig::from_env())
        .with_context(|| format!("无法打开上传台账: {}", db_path))?;
    Ok(match timeout {
        Some(timeout) => state.with_request_timeout(timeout),
        None => state,
    })
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command.unwrap_or_else(|| Commands::Menu(UploadArgs::default())) {
        Commands::Generate {
            accounts,
            output,
            count,
            seed,
            date_format,
        } => {
            let config = GeneratorConfig {
                accounts_path: accounts,
                output_path: output,
                record_count: count,
                seed,
                date_format,
                ..GeneratorConfig::default()
            };
            commands::generate(&config, &mut out)?;
        }
        Commands::Upload(args) => {
            let config = args.to_config();
            let state = open_state(cli.db, Some(config.request_timeout))?;
            commands::upload_csv(&state, &config, &mut out).await?;
        }
        Commands::Jobs { limit, run } => {
            let state = open_state(cli.db, None)?;
            let monitor = state.monitor().await?;
            match run {
                Some(run_id) => {
                    commands::show_run_jobs(&state.ledger, &monitor, &run_id, &mut out).await?
                }
                None => commands::show_batch_jobs(&monitor, limit, &mut out).await?,
            }
        }
        Commands::Progress => {
            let state = open_state(cli.db, None)?;
            let monitor = state.monitor().await?;
            commands::show_upload_progress(&monitor, &mut out).await?;
        }
        Commands::Runs { limit } => {
            let state = open_state(cli.db, None)?;
            commands::show_recent_runs(&state.ledger, limit, &mut out)?;
        }
        Commands::Endpoint => commands::show_endpoint_source(&mut out)?,
        Commands::Menu(args) => {
            let config = args.to_config();
            let state = open_state(cli.db, Some(config.request_timeout))?;
            let stdin = io::stdin();
            app::run_menu(&state, &config, stdin.lock(), &mut out).await?;
        }
    }

    out.flush()?;
    Ok(())
}
