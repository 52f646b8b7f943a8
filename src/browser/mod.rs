pub mod connection;
pub mod headless;

pub use connection::connect_to_browser_and_page;
pub use headless::launch_browser;

use crate::config::Config;
use anyhow::Result;
use chromiumoxide::{Browser, Page};

/// 按配置打开浏览器会话：设置了调试端口则连接，否则启动新浏览器
pub async fn open_session(config: &Config) -> Result<(Browser, Page)> {
    match config.browser_debug_port {
        Some(port) => connect_to_browser_and_page(port).await,
        None => launch_browser(config).await,
    }
}
