//! 评价会话 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一次完整的评价会话和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：启动或连接浏览器、创建 JsExecutor
//! 2. **登录与导航**：登录 UCAM，进入 Course Evaluation 页面
//! 3. **课程处理**：委托 `CourseProcessor` 处理全部课程
//! 4. **结果输出**：写审计文件、发送通知、打印统计
//! 5. **资源管理**：持有 Browser，结束时关闭

use std::time::Duration;

use anyhow::Result;
use chromiumoxide::Browser;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::browser;
use crate::config::Config;
use crate::infrastructure::JsExecutor;
use crate::models::{AuditRecord, AuditSummary};
use crate::orchestrator::course_processor::CourseProcessor;
use crate::services::{AuditWriter, LoginService, MenuNavigator, TelegramNotifier};
use crate::utils::logging::{log_startup, print_final_stats};

/// 全部处理结束后等待 `Completed!` 的时间
const FINAL_COMPLETED_TIMEOUT: Duration = Duration::from_secs(20);
/// 主流程结束后检查是否需要补处理
const LEFTOVER_CHECK_TIMEOUT: Duration = Duration::from_secs(6);

/// 应用主结构
pub struct App {
    config: Config,
    browser: Browser,
    executor: JsExecutor,
    processor: CourseProcessor,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config.user_id, config.headless, &config.login_url);

        let (browser, page) = browser::open_session(&config).await?;
        let executor = JsExecutor::new(page);
        let processor = CourseProcessor::new(&config);

        Ok(Self {
            config,
            browser,
            executor,
            processor,
        })
    }

    /// 运行应用主逻辑
    ///
    /// 登录或导航失败时直接返回错误，课程级别的失败只记入审计记录。
    pub async fn run(mut self) -> Result<Vec<AuditRecord>> {
        let outcome = self.evaluate().await;
        self.shutdown().await;
        outcome
    }

    async fn evaluate(&self) -> Result<Vec<AuditRecord>> {
        let timeout = self.config.wait_timeout();

        let retries = self.config.login_max_retries;
        LoginService::new(&self.config.login_url, retries, timeout)
            .login(&self.executor, &self.config.user_id, &self.config.password)
            .await?;

        MenuNavigator::new(timeout)
            .open_course_evaluation(&self.executor)
            .await?;

        let records = self.process_courses().await?;

        let completed = self.wait_final_status().await;
        self.report(&records, completed).await;

        Ok(records)
    }

    /// 处理课程（全部或抽样）
    async fn process_courses(&self) -> Result<Vec<AuditRecord>> {
        let processor = &self.processor;
        let courses = processor.load_courses(&self.executor).await?;

        if courses.is_empty() {
            warn!("⚠️ 没有找到可评价的课程");
            return Ok(Vec::new());
        }

        if let Some(limit) = self.config.course_limit {
            return Ok(processor
                .process_first_n(&self.executor, &courses, limit)
                .await);
        }

        let mut records = processor.process_all(&self.executor, &courses).await;
        info!("主流程处理结束");

        if !processor
            .wait_until_completed(&self.executor, LEFTOVER_CHECK_TIMEOUT)
            .await
        {
            processor
                .process_leftovers(&self.executor, &mut records)
                .await;
        }

        Ok(records)
    }

    async fn wait_final_status(&self) -> bool {
        let completed = self
            .processor
            .wait_until_completed(&self.executor, FINAL_COMPLETED_TIMEOUT)
            .await;
        if completed {
            info!("🎉 评价状态: Completed!");
        } else {
            warn!(
                "⚠️ 等待 {:?} 后评价状态仍未显示 Completed!",
                FINAL_COMPLETED_TIMEOUT
            );
        }
        completed
    }

    /// 写审计文件、发送通知、打印统计
    async fn report(&self, records: &[AuditRecord], completed: bool) {
        let writer = AuditWriter::new(&self.config.audit_log_file);
        if let Err(e) = writer.write(records).await {
            error!("❌ {}", e);
        }

        if let Some(notifier) = TelegramNotifier::from_options(
            self.config.telegram_bot_token.as_deref(),
            self.config.telegram_chat_id.as_deref(),
        ) {
            notifier
                .notify_summary(&self.config.user_id, records, completed)
                .await;
        }

        let summary = AuditSummary::from_records(records);
        print_final_stats(
            summary.succeeded,
            summary.failed,
            summary.courses,
            &writer.path().display().to_string(),
        );
    }

    /// 有头模式下保留窗口一段时间，然后关闭浏览器
    async fn shutdown(&mut self) {
        if !self.config.headless && self.config.keep_open_secs > 0 {
            info!("浏览器将在 {} 秒后关闭", self.config.keep_open_secs);
            sleep(Duration::from_secs(self.config.keep_open_secs)).await;
        }
        if let Err(e) = self.browser.close().await {
            warn!("⚠️ 关闭浏览器失败: {}", e);
        }
    }
}
