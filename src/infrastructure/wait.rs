//! 轮询等待 - 基础设施层
//!
//! ASP.NET 的 UpdatePanel 会在局部回发后整体替换 DOM，
//! 所有"等某个元素出现 / 消失 / 变成某个值"的逻辑都通过这里的轮询实现。

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tokio::time::{sleep, Instant};
use tracing::trace;

use crate::error::{AppError, AppResult};
use crate::infrastructure::JsExecutor;

/// 默认轮询间隔
pub const DEFAULT_POLL: Duration = Duration::from_millis(250);

/// 回发状态轮询间隔
pub const POSTBACK_POLL: Duration = Duration::from_millis(120);

/// jQuery 与 PageRequestManager 是否都处于空闲
const AJAX_IDLE_JS: &str = r#"
(() => {
    const jq = window.jQuery ? window.jQuery.active : 0;
    const prm = (window.Sys && Sys.WebForms && Sys.WebForms.PageRequestManager)
        ? Sys.WebForms.PageRequestManager.getInstance().get_isInAsyncPostBack()
        : false;
    return !jq && !prm;
})()
"#;

/// 轮询直到 `check` 返回 `true`
///
/// `check` 返回错误时视为"条件尚未满足"（DOM 正在被替换时很常见），
/// 超过 `timeout` 返回 [`AppError::Timeout`]。
pub async fn wait_until<F, Fut>(
    what: &str,
    timeout: Duration,
    poll: Duration,
    mut check: F,
) -> AppResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        match check().await {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(e) => trace!("等待 {} 时检查失败: {}", what, e),
        }
        if Instant::now() >= deadline {
            return Err(AppError::timeout(what, timeout));
        }
        sleep(poll).await;
    }
}

/// 等待 jQuery 请求与 ASP.NET 异步回发全部结束
pub async fn wait_for_ajax_and_postbacks(
    executor: &JsExecutor,
    timeout: Duration,
) -> AppResult<()> {
    wait_until("ajax / postback 空闲", timeout, POSTBACK_POLL, || async move {
        executor.eval_as::<bool>(AJAX_IDLE_JS).await
    })
    .await
}

/// 尽力等待 ajax 空闲，超时只记录日志
pub async fn settle(executor: &JsExecutor, timeout: Duration) {
    if let Err(e) = wait_for_ajax_and_postbacks(executor, timeout).await {
        trace!("{}", e);
    }
}

/// 等待指定 CSS 选择器的元素出现
pub async fn wait_for_selector(
    executor: &JsExecutor,
    selector: &str,
    timeout: Duration,
) -> AppResult<()> {
    let js = format!(
        "document.querySelector({}) !== null",
        super::js_str(selector)
    );
    wait_until(&format!("元素 {} 出现", selector), timeout, DEFAULT_POLL, move || {
        executor.eval_as::<bool>(js.clone())
    })
    .await
}

/// 等待指定 id 的元素不可见（不存在也算不可见）
pub async fn wait_for_invisible(
    executor: &JsExecutor,
    element_id: &str,
    timeout: Duration,
) -> AppResult<()> {
    let js = format!(
        r#"(() => {{
            const el = document.getElementById({});
            return !el || el.offsetParent === null || getComputedStyle(el).visibility === 'hidden';
        }})()"#,
        super::js_str(element_id)
    );
    wait_until(&format!("元素 #{} 消失", element_id), timeout, DEFAULT_POLL, move || {
        executor.eval_as::<bool>(js.clone())
    })
    .await
}

/// 进度指示器周期：若 1 秒内出现，则最多再等 8 秒让它消失
pub async fn wait_for_progress_cycle(executor: &JsExecutor, progress_id: &str) {
    let appear_js = format!(
        r#"(() => {{
            const el = document.getElementById({});
            return !!el && el.offsetParent !== null;
        }})()"#,
        super::js_str(progress_id)
    );
    let appeared = wait_until("进度指示器出现", Duration::from_secs(1), POSTBACK_POLL, move || {
        executor.eval_as::<bool>(appear_js.clone())
    })
    .await;

    if appeared.is_ok() {
        if let Err(e) = wait_for_invisible(executor, progress_id, Duration::from_secs(8)).await {
            trace!("{}", e);
        }
    }
}
