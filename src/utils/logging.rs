/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// `RUST_LOG` 优先，未设置时使用 `default_level`。
/// 重复调用时静默忽略（测试中会多次初始化）。
pub fn init(default_level: &str) {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(default_level),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(user_id: &str, headless: bool, login_url: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - UCAM 课程评价自动提交");
    info!("👤 账号: {}", user_id);
    info!("🌐 登录地址: {}", login_url);
    info!("🖥️ 浏览器模式: {}", if headless { "无头" } else { "有头" });
    info!("{}", "=".repeat(60));
}

/// 记录课程列表加载信息
pub fn log_courses_loaded(total: usize, limit: Option<usize>) {
    info!("✓ 找到 {} 门待评价课程", total);
    if let Some(n) = limit {
        info!("🧪 抽样模式: 只处理前 {} 门", n);
    }
}

/// 记录轮次开始信息
pub fn log_round_start(round: usize, max_rounds: usize, pending: usize) {
    info!("\n{}", "=".repeat(60));
    info!(
        "📦 开始第 {}/{} 轮, 未处理课程 {} 门",
        round, max_rounds, pending
    );
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(success: usize, failed: usize, courses: usize, audit_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("📚 课程数: {}", courses);
    info!("✅ 提交成功: {}", success);
    if failed > 0 {
        warn!("❌ 提交失败: {}", failed);
    } else {
        info!("❌ 提交失败: 0");
    }
    info!("{}", "=".repeat(60));
    info!("\n审计记录已保存至: {}", audit_path);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
