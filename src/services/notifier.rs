//! Telegram 通知服务 - 业务能力层
//!
//! 运行结束后把汇总发到 Telegram，失败只记录日志

use std::time::Duration;

use serde_json::{json, Value as JsonValue};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{AuditRecord, AuditSummary};

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Telegram 通知服务
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_base: TELEGRAM_API_BASE.to_string(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        }
    }

    /// 替换 Bot API 地址（自建 Bot API 服务或测试时使用）
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// 两个参数都存在时才创建
    pub fn from_options(bot_token: Option<&str>, chat_id: Option<&str>) -> Option<Self> {
        match (bot_token, chat_id) {
            (Some(token), Some(chat)) => Some(Self::new(token, chat)),
            _ => None,
        }
    }

    /// 发送文本消息
    pub async fn send(&self, text: &str) -> AppResult<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let body = json!({
            "chat_id": self.chat_id,
            "text": text,
            "disable_web_page_preview": true,
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Notify(e.to_string()))?;

        let status = response.status();
        let payload: JsonValue = response
            .json()
            .await
            .map_err(|e| AppError::Notify(e.to_string()))?;
        debug!("Telegram 响应: {}", payload);

        if !status.is_success() || !is_ok_response(&payload) {
            return Err(AppError::Notify(format!(
                "HTTP {}: {}",
                status,
                payload
                    .get("description")
                    .and_then(|v| v.as_str())
                    .unwrap_or("未知错误")
            )));
        }
        Ok(())
    }

    /// 发送运行汇总，失败时只警告
    pub async fn notify_summary(&self, user_id: &str, records: &[AuditRecord], completed: bool) {
        let text = summary_message(user_id, records, completed);
        match self.send(&text).await {
            Ok(()) => info!("📨 已发送 Telegram 通知"),
            Err(e) => warn!("⚠️ {}", e),
        }
    }
}

fn is_ok_response(payload: &JsonValue) -> bool {
    payload.get("ok").and_then(|v| v.as_bool()).unwrap_or(false)
}

/// 构造汇总消息
pub fn summary_message(user_id: &str, records: &[AuditRecord], completed: bool) -> String {
    let summary = AuditSummary::from_records(records);
    let mut lines = vec![
        format!("UCAM 课程评价 - {}", user_id),
        format!(
            "课程 {} 门, 成功 {}, 失败 {} (共尝试 {} 次)",
            summary.courses, summary.succeeded, summary.failed, summary.attempts
        ),
        format!(
            "评价状态: {}",
            if completed { "Completed!" } else { "未完成" }
        ),
    ];
    for value in crate::models::audit::failed_courses(records) {
        if let Some(record) = records.iter().rev().find(|r| r.course_value == value) {
            lines.push(format!(
                "✗ {} ({})",
                record.course_name,
                record.error.as_deref().unwrap_or("unknown")
            ));
        }
    }
    lines.join("\n")
}
