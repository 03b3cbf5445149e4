// ==========================================
// 商机数据装载工具 - 应用层
// ==========================================
// 职责: 命令行子命令与交互菜单,连接各层
// ==========================================

pub mod commands;
pub mod error;
pub mod menu;
pub mod state;

// 重导出
pub use error::{AppError, AppResult};
pub use menu::run_menu;
pub use state::{get_default_db_path, AppState, DB_PATH_ENV};
