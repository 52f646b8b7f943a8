//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS"和"导航"的能力

use anyhow::{Context, Result};
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() / goto() 能力
/// - 不认识课程 / 评价表单
/// - 不处理业务流程
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 导航到指定 URL 并等待加载完成
    pub async fn goto(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("导航到 {} 失败", url))?;
        Ok(())
    }

    /// 当前页面 URL
    pub async fn current_url(&self) -> Result<String> {
        self.eval_as::<String>("window.location.href").await
    }

    /// 执行 JS 代码并返回 JSON 结果
    ///
    /// CDP 对 `null` / `undefined` 不返回 value 字段，这里统一映射为 `JsonValue::Null`，
    /// 方便脚本用 `null` 表示"元素不存在"。
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.value().cloned().unwrap_or(JsonValue::Null);
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }
}

/// 把 Rust 字符串编码为 JS 字符串字面量
pub fn js_str(value: &str) -> String {
    // serde_json 的字符串输出同时是合法的 JS 字面量
    serde_json::Value::String(value.to_string()).to_string()
}
