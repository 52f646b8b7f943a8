//! 登录服务 - 业务能力层
//!
//! 只负责"登录 UCAM"能力

use std::time::Duration;

use anyhow::Result;
use tracing::info;

use crate::error::AppError;
use crate::infrastructure::wait::{wait_for_selector, wait_until, DEFAULT_POLL};
use crate::infrastructure::{js_str, with_retries, JsExecutor};
use crate::models::selectors;

/// 两次登录尝试之间的间隔
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// 登录服务
pub struct LoginService {
    login_url: String,
    max_retries: usize,
    timeout: Duration,
}

impl LoginService {
    pub fn new(login_url: impl Into<String>, max_retries: usize, timeout: Duration) -> Self {
        Self {
            login_url: login_url.into(),
            max_retries: max_retries.max(1),
            timeout,
        }
    }

    /// 登录 UCAM
    ///
    /// 成功判定：URL 离开登录页；兜底判定：用户名输入框不可见。
    pub async fn login(&self, executor: &JsExecutor, user_id: &str, password: &str) -> Result<()> {
        if user_id.is_empty() || password.is_empty() {
            return Err(AppError::MissingCredentials.into());
        }

        with_retries("登录", self.max_retries, RETRY_DELAY, move |_| {
            self.attempt_login(executor, user_id, password)
        })
        .await
        .map_err(|e| AppError::LoginFailed {
            attempts: self.max_retries,
            reason: e.to_string(),
        })?;

        info!("✓ 登录成功");
        Ok(())
    }

    async fn attempt_login(
        &self,
        executor: &JsExecutor,
        user_id: &str,
        password: &str,
    ) -> Result<()> {
        executor.goto(&self.login_url).await?;

        wait_for_selector(
            executor,
            &format!("#{}", selectors::LOGIN_USERNAME),
            self.timeout,
        )
        .await?;

        let filled: bool = executor
            .eval_as(fill_login_form_js(user_id, password))
            .await?;
        if !filled {
            anyhow::bail!("登录表单元素缺失");
        }

        // 主判定：URL 变化
        let url_changed = wait_until("离开登录页", self.timeout, DEFAULT_POLL, || async move {
            let url = executor.current_url().await?;
            Ok(!same_page(&url, &self.login_url))
        })
        .await;

        if url_changed.is_ok() {
            return Ok(());
        }

        // 兜底：用户名输入框消失
        let field_gone_js = format!(
            r#"(() => {{
                const el = document.getElementById({});
                return !el || el.offsetParent === null;
            }})()"#,
            js_str(selectors::LOGIN_USERNAME)
        );
        wait_until("登录表单消失", self.timeout, DEFAULT_POLL, move || {
            executor.eval_as::<bool>(field_gone_js.clone())
        })
        .await?;

        Ok(())
    }
}

/// 清空并填写用户名密码，异步点击登录按钮
///
/// 点击放在 setTimeout 中，避免页面跳转销毁当前执行上下文导致 evaluate 报错。
fn fill_login_form_js(user_id: &str, password: &str) -> String {
    format!(
        r#"
        (() => {{
            const user = document.getElementById({user_el});
            const pass = document.getElementById({pass_el});
            const btn = document.getElementById({btn_el});
            if (!user || !pass || !btn) return false;
            for (const [el, value] of [[user, {user}], [pass, {pass}]]) {{
                el.focus();
                el.value = '';
                el.value = value;
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            }}
            setTimeout(() => btn.click(), 0);
            return true;
        }})()
        "#,
        user_el = js_str(selectors::LOGIN_USERNAME),
        pass_el = js_str(selectors::LOGIN_PASSWORD),
        btn_el = js_str(selectors::LOGIN_BUTTON),
        user = js_str(user_id),
        pass = js_str(password),
    )
}

/// 忽略大小写、末尾斜杠与查询串比较两个 URL 是否为同一页面
fn same_page(current: &str, login_url: &str) -> bool {
    let normalize = |url: &str| {
        url.split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/')
            .to_lowercase()
    };
    normalize(current) == normalize(login_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN: &str = "https://ucam.uiu.ac.bd/Security/Login.aspx";

    #[test]
    fn test_same_page() {
        assert!(same_page(LOGIN, LOGIN));
        let with_query = "https://ucam.uiu.ac.bd/Security/login.aspx?ReturnUrl=%2f";
        assert!(same_page(with_query, LOGIN));
        let home = "https://ucam.uiu.ac.bd/Security/StudentHome.aspx";
        assert!(!same_page(home, LOGIN));
    }

    #[test]
    fn test_login_js_escapes_credentials() {
        let js = fill_login_form_js("011201234", r#"pa"ss\word"#);
        assert!(js.contains(r#""011201234""#));
        assert!(js.contains(r#""pa\"ss\\word""#));
        assert!(js.contains(r#""logMain_Button1""#));
    }
}
