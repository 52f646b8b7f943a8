use tracing::error;
use ucam_course_eval::utils::logging;
use ucam_course_eval::{exit_code_of, App, AppError, Config};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // 加载配置
    let config = match Config::load().map_err(AppError::from) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(e.exit_code());
        }
    };

    // 初始化日志
    logging::init(&config.log_level);

    // 初始化并运行应用
    let result = match App::initialize(config).await {
        Ok(app) => app.run().await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        error!("❌ 运行失败: {:#}", e);
        std::process::exit(exit_code_of(&e));
    }
}
