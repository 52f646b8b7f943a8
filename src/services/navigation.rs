//! 菜单导航服务 - 业务能力层
//!
//! 只负责从登录后的首页进入"课程评价"页面

use std::time::Duration;

use anyhow::Result;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::AppError;
use crate::infrastructure::wait::{wait_for_selector, wait_until, DEFAULT_POLL};
use crate::infrastructure::{js_str, with_retries, JsExecutor};
use crate::models::selectors;

/// 每个菜单项的重试次数
const CLICK_RETRIES: usize = 3;
/// 菜单点击重试间隔
const CLICK_RETRY_DELAY: Duration = Duration::from_secs(1);

/// 菜单导航服务
pub struct MenuNavigator {
    timeout: Duration,
}

impl MenuNavigator {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// 依次点击三级菜单进入课程评价页
    ///
    /// 第 N 步失败返回 `AppError::NavigationFailed { step: N }`。
    pub async fn open_course_evaluation(&self, executor: &JsExecutor) -> Result<()> {
        // (XPath, 点击后等待菜单展开的时间)
        let steps = [
            (selectors::MENU_TOP_XPATH, Duration::from_millis(800)),
            (selectors::MENU_SECOND_XPATH, Duration::from_millis(500)),
            (selectors::MENU_EVALUATION_XPATH, Duration::ZERO),
        ];

        for (index, (xpath, pause)) in steps.into_iter().enumerate() {
            let step = index + 1;
            debug!("点击第 {} 个菜单项: {}", step, xpath);

            with_retries("菜单点击", CLICK_RETRIES, CLICK_RETRY_DELAY, move |_| {
                self.click_xpath(executor, xpath)
            })
            .await
            .map_err(|e| {
                error!("第 {} 个菜单项点击失败: {}", step, e);
                AppError::NavigationFailed {
                    step,
                    xpath: xpath.to_string(),
                }
            })?;

            if !pause.is_zero() {
                sleep(pause).await;
            }
        }

        // 页面没有更可靠的标识，这里只做尽力确认
        let confirmed = wait_for_selector(executor, "h1", self.timeout).await;
        if confirmed.is_err() {
            debug!("已进入目标页面，但未能通过 h1 确认");
        }

        info!("✓ 已进入课程评价页面");
        Ok(())
    }

    /// 等待 XPath 元素可点击（存在、可见、未禁用）后点击
    async fn click_xpath(&self, executor: &JsExecutor, xpath: &str) -> Result<()> {
        let clickable_js = format!(
            r#"(() => {{
                const el = {locate};
                return !!el && el.getClientRects().length > 0 && !el.disabled;
            }})()"#,
            locate = xpath_locator(xpath)
        );
        wait_until(
            &format!("菜单项可点击 {}", xpath),
            self.timeout,
            DEFAULT_POLL,
            move || executor.eval_as::<bool>(clickable_js.clone()),
        )
        .await?;

        let click_js = format!(
            r#"(() => {{
                const el = {locate};
                if (!el) return false;
                el.scrollIntoView({{ block: 'center' }});
                setTimeout(() => el.click(), 0);
                return true;
            }})()"#,
            locate = xpath_locator(xpath)
        );
        let clicked: bool = executor.eval_as(click_js).await?;
        if !clicked {
            anyhow::bail!("菜单项在点击前消失: {}", xpath);
        }
        Ok(())
    }
}

/// 按 XPath 取第一个匹配节点的 JS 表达式
pub fn xpath_locator(xpath: &str) -> String {
    format!(
        "document.evaluate({}, document, null, {}, null).singleNodeValue",
        js_str(xpath),
        FIRST_ORDERED_NODE_TYPE
    )
}

const FIRST_ORDERED_NODE_TYPE: &str = "XPathResult.FIRST_ORDERED_NODE_TYPE";
