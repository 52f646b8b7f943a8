//! 课程选择服务 - 业务能力层
//!
//! 读取课程下拉框、切换课程并等待 UpdatePanel 刷新

use std::time::Duration;

use anyhow::Result;
use tracing::{debug, warn};

use crate::infrastructure::wait::{self, wait_until, DEFAULT_POLL};
use crate::infrastructure::{js_str, JsExecutor};
use crate::models::course::{selectable_courses, CourseOption};
use crate::models::selectors;

/// 课程选择服务
pub struct CourseSelector {
    timeout: Duration,
    postback_timeout: Duration,
}

impl CourseSelector {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            postback_timeout: Duration::from_secs(20),
        }
    }

    /// 等待课程下拉框出现并读取全部可选课程
    pub async fn options(&self, executor: &JsExecutor) -> Result<Vec<CourseOption>> {
        wait::wait_for_selector(
            executor,
            &format!("#{}", selectors::COURSE_SELECT),
            self.timeout,
        )
        .await?;

        let js = format!(
            r#"(() => {{
                const sel = document.getElementById({});
                if (!sel) return [];
                return Array.from(sel.options).map(o => ({{
                    value: o.value || '',
                    text: (o.text || '').trim(),
                }}));
            }})()"#,
            js_str(selectors::COURSE_SELECT)
        );
        let raw: Vec<CourseOption> = executor.eval_as(js).await?;
        debug!("课程下拉框共 {} 项", raw.len());
        Ok(selectable_courses(raw))
    }

    /// 通过 JS 选中课程并触发回发，等待评价面板加载
    ///
    /// 显式回发失败时退回到只设置值并派发 change 事件。
    pub async fn select(&self, executor: &JsExecutor, course_value: &str) -> Result<()> {
        match self.select_with_postback(executor, course_value).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("回发选择课程失败, 改用普通选择: {}", e);
                let js = set_select_value_js(selectors::COURSE_SELECT, course_value, None);
                let ok: bool = executor.eval_as(js).await?;
                if !ok {
                    anyhow::bail!("课程下拉框中没有 {}", course_value);
                }
                Ok(())
            }
        }
    }

    async fn select_with_postback(&self, executor: &JsExecutor, course_value: &str) -> Result<()> {
        wait::wait_for_selector(
            executor,
            &format!("#{}", selectors::COURSE_SELECT),
            self.timeout,
        )
        .await?;

        let js = set_select_value_js(
            selectors::COURSE_SELECT,
            course_value,
            Some(selectors::COURSE_SELECT_POSTBACK_TARGET),
        );
        let ok: bool = executor.eval_as(js).await?;
        if !ok {
            anyhow::bail!("课程下拉框中没有 {}", course_value);
        }

        wait::settle(executor, self.postback_timeout).await;

        // 评价表格出现，或教师姓名已填充
        let ready_js = format!(
            r#"(() => {{
                if (document.querySelector({table})) return true;
                const label = document.getElementById({faculty});
                if (!label) return false;
                const text = (label.innerText || '').trim();
                return text !== '' && !/^[_ ]+$/.test(text);
            }})()"#,
            table = js_str(selectors::EVALUATION_TABLE_CSS),
            faculty = js_str(selectors::FACULTY_LABEL),
        );
        wait_until("课程评价面板刷新", self.postback_timeout, DEFAULT_POLL, move || {
            executor.eval_as::<bool>(ready_js.clone())
        })
        .await?;
        Ok(())
    }
}

/// 设置下拉框的值并派发 change，可选地显式调用 `__doPostBack`
///
/// 返回 JS 表达式，结果为值是否设置成功。
pub fn set_select_value_js(select_id: &str, value: &str, postback_target: Option<&str>) -> String {
    let postback = match postback_target {
        Some(target) => format!(
            "if (typeof __doPostBack === 'function') {{ __doPostBack({}, ''); }}",
            js_str(target)
        ),
        None => String::new(),
    };
    format!(
        r#"(() => {{
            const el = document.getElementById({id});
            if (!el) return false;
            el.value = {value};
            if (el.value !== {value}) return false;
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            {postback}
            return true;
        }})()"#,
        id = js_str(select_id),
        value = js_str(value),
        postback = postback,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_select_js_with_postback() {
        let js = set_select_value_js(
            selectors::COURSE_SELECT,
            "1203_45",
            Some(selectors::COURSE_SELECT_POSTBACK_TARGET),
        );
        let lookup = r#"getElementById("ctl00_MainContainer_ddlAcaCalSection")"#;
        let postback = r#"__doPostBack("ctl00$MainContainer$ddlAcaCalSection", '')"#;
        assert!(js.contains(lookup));
        assert!(js.contains(r#"el.value = "1203_45";"#));
        assert!(js.contains(postback));
    }

    #[test]
    fn test_set_select_js_without_postback() {
        let js = set_select_value_js(selectors::EXPECTED_GRADE_SELECT, "A", None);
        assert!(!js.contains("__doPostBack"));
        assert!(js.contains("dispatchEvent(new Event('change'"));
    }
}
