use std::path::Path;

use anyhow::Result;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::AppError;

/// 浏览器启动参数
const LAUNCH_ARGS: [&str; 7] = [
    "--disable-infobars",
    "--disable-extensions",
    "--disable-notifications",
    "--start-maximized",
    "--disable-gpu",           // 无头模式下禁用 GPU
    "--no-sandbox",            // 容器内以 root 运行时需要
    "--disable-dev-shm-usage", // 防止共享内存不足
];

/// 启动浏览器并打开空白页面
pub async fn launch_browser(config: &Config) -> Result<(Browser, Page)> {
    info!(
        "🚀 启动{}浏览器...",
        if config.headless { "无头" } else { "有头" }
    );

    let (width, height) = config.window_size;
    let mut builder = BrowserConfig::builder()
        .window_size(width, height)
        .args(LAUNCH_ARGS.to_vec());

    builder = if config.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };

    if let Some(path) = &config.chrome_executable {
        debug!("使用浏览器可执行文件: {}", path);
        builder = builder.chrome_executable(Path::new(path));
    }

    let browser_config = builder.build().map_err(|e| {
        error!("配置浏览器失败: {}", e);
        AppError::Browser(format!("配置浏览器失败: {}", e))
    })?;

    let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        AppError::Browser(format!("启动浏览器失败: {}", e))
    })?;
    debug!("浏览器启动成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建页面失败: {}", e);
        AppError::from(e)
    })?;

    info!("✅ 浏览器已就绪");
    Ok((browser, page))
}
