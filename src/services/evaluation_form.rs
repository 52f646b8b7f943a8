//! 评价表单服务 - 业务能力层
//!
//! 封装课程评价面板上的所有操作：预期成绩、单选题、评语、提交、状态标签。
//! 面板位于 UpdatePanel 内，每次回发都会替换 DOM，
//! 因此所有操作都在 JS 中按 id / XPath 重新定位元素，不持有元素句柄。

use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::infrastructure::wait::{self, wait_until, DEFAULT_POLL};
use crate::infrastructure::{js_str, JsExecutor};
use crate::models::course::{is_expected_grade_message, is_placeholder_text, EvaluationStatus};
use crate::models::selectors;
use crate::services::course_select::set_select_value_js;
use crate::services::navigation::xpath_locator;

/// 点击提交后等待回发结束的时长
const SUBMIT_POSTBACK: Duration = Duration::from_secs(12);

/// 单选题填写结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct FillOutcome {
    /// 处理过的单选框数量（包括原本已选中的）
    pub answered: usize,
    /// 本次实际点击的数量
    pub clicked: usize,
}

/// 评价表单服务
pub struct EvaluationForm {
    timeout: Duration,
}

impl EvaluationForm {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// 等待评价表格出现且教师姓名不再是占位符
    pub async fn wait_for_evaluation_loaded(
        &self,
        executor: &JsExecutor,
        timeout: Duration,
    ) -> bool {
        let js = format!(
            r#"(() => {{
                if (!document.querySelector({table})) return null;
                const label = document.getElementById({faculty});
                return label ? (label.innerText || '') : null;
            }})()"#,
            table = js_str(selectors::EVALUATION_TABLE_CSS),
            faculty = js_str(selectors::FACULTY_LABEL),
        );
        let result = wait_until("评价面板加载", timeout, DEFAULT_POLL, || {
            let js = js.clone();
            async move {
                let faculty: Option<String> = executor.eval_as(js).await?;
                Ok(faculty.is_some_and(|text| !is_placeholder_text(&text)))
            }
        })
        .await;

        if let Err(e) = &result {
            debug!("{}", e);
        }
        result.is_ok()
    }

    /// 读取教师姓名
    pub async fn faculty_name(&self, executor: &JsExecutor) -> Result<Option<String>> {
        let text = self.label_text(executor, selectors::FACULTY_LABEL).await?;
        Ok(text.filter(|t| !is_placeholder_text(t)))
    }

    /// 在评价面板内按 "Expected Grade" 标签定位下拉框并设置
    pub async fn set_expected_grade_in_panel(
        &self,
        executor: &JsExecutor,
        value: &str,
        attempts: usize,
        delay: Duration,
    ) -> bool {
        let set_js = format!(
            r#"(() => {{
                const el = {locate};
                if (!el) return false;
                el.value = {value};
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"#,
            locate = xpath_locator(selectors::PANEL_EXPECTED_GRADE_XPATH),
            value = js_str(value),
        );
        let read_js = format!(
            "(() => {{ const el = {}; return el ? el.value : null; }})()",
            xpath_locator(selectors::PANEL_EXPECTED_GRADE_XPATH)
        );

        let mut last_error = None;
        for attempt in 1..=attempts {
            let outcome: Result<bool> = async {
                wait_until("面板内预期成绩下拉框", self.timeout, DEFAULT_POLL, || {
                    let js = read_js.clone();
                    async move { Ok(executor.eval_as::<Option<String>>(js).await?.is_some()) }
                })
                .await?;

                if let Err(e) = executor.eval(set_js.clone()).await {
                    debug!("面板内设置预期成绩失败: {}", e);
                }
                wait::settle(executor, Duration::from_secs(6)).await;
                sleep(Duration::from_millis(250)).await;

                let current: Option<String> = executor.eval_as(read_js.clone()).await?;
                Ok(current.as_deref() == Some(value))
            }
            .await;

            match outcome {
                Ok(true) => return true,
                Ok(false) => debug!("面板内预期成绩第 {}/{} 次校验未通过", attempt, attempts),
                Err(e) => last_error = Some(e),
            }
            sleep(delay).await;
        }

        error!(
            "面板内设置预期成绩 {} 次后仍失败; 最后错误: {:?}",
            attempts, last_error
        );
        false
    }

    /// 按 id 定位预期成绩下拉框，多策略设置并校验
    ///
    /// 每次尝试：选中匹配的 option（按 value 或文本）→ 直接赋值并派发 change
    /// → 等待回发与进度条 → 重新读取校验。失败后线性退避 `base_delay * attempt`。
    pub async fn set_expected_grade(
        &self,
        executor: &JsExecutor,
        value: &str,
        attempts: usize,
        base_delay: Duration,
    ) -> Option<String> {
        let mut last_error = None;
        for attempt in 1..=attempts {
            match self.try_set_grade(executor, value, base_delay).await {
                Ok(Some(selected)) => return Some(selected),
                Ok(None) => debug!("预期成绩第 {}/{} 次校验未通过", attempt, attempts),
                Err(e) => last_error = Some(e),
            }
            sleep(base_delay * attempt as u32).await;
        }

        if let Some(e) = last_error {
            error!("设置预期成绩最终失败: {}", e);
        }
        None
    }

    async fn try_set_grade(
        &self,
        executor: &JsExecutor,
        value: &str,
        settle_delay: Duration,
    ) -> Result<Option<String>> {
        wait::wait_for_selector(
            executor,
            &format!("#{}", selectors::EXPECTED_GRADE_SELECT),
            self.timeout,
        )
        .await?;

        // 策略 1：选中 option 元素（按 value 或可见文本）
        let option_js = format!(
            r#"(() => {{
                const el = document.getElementById({id});
                if (!el) return false;
                const target = Array.from(el.options)
                    .find(o => o.value === {value} || (o.text || '').trim() === {value});
                if (!target) return false;
                el.scrollIntoView({{ block: 'center' }});
                target.selected = true;
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"#,
            id = js_str(selectors::EXPECTED_GRADE_SELECT),
            value = js_str(value),
        );
        if let Err(e) = executor.eval(option_js).await {
            debug!("选中 option 失败: {}", e);
        }

        // 策略 2：直接赋值
        let direct_js = set_select_value_js(selectors::EXPECTED_GRADE_SELECT, value, None);
        if let Err(e) = executor.eval(direct_js).await {
            debug!("直接赋值失败: {}", e);
        }

        sleep(settle_delay).await;
        wait::settle(executor, Duration::from_secs(6)).await;
        wait::wait_for_progress_cycle(executor, selectors::PROGRESS_INDICATOR).await;

        let selected = self.selected_expected_grade(executor).await?;
        Ok(selected.filter(|v| v == value))
    }

    /// 读取当前预期成绩
    pub async fn selected_expected_grade(&self, executor: &JsExecutor) -> Result<Option<String>> {
        let js = format!(
            r#"(() => {{
                const el = document.getElementById({});
                return el ? el.value : null;
            }})()"#,
            js_str(selectors::EXPECTED_GRADE_SELECT)
        );
        executor.eval_as(js).await
    }

    /// 先用面板定位方式设置，失败再按 id 设置
    pub async fn ensure_expected_grade(&self, executor: &JsExecutor, value: &str) -> bool {
        if self
            .set_expected_grade_in_panel(executor, value, 6, Duration::from_millis(600))
            .await
        {
            return true;
        }
        self.set_expected_grade(executor, value, 6, Duration::from_millis(500))
            .await
            .is_some()
    }

    /// 把评价表格中所有 `value` 为指定值的单选框选中
    pub async fn fill_radios(
        &self,
        executor: &JsExecutor,
        answer_value: &str,
    ) -> Result<FillOutcome> {
        let js = format!(
            r#"(() => {{
                const table = document.querySelector({table});
                if (!table) return {{ answered: 0, clicked: 0 }};
                const query = 'input[type=radio][value=' + JSON.stringify({value}) + ']';
                const radios = table.querySelectorAll(query);
                let answered = 0, clicked = 0;
                for (const r of radios) {{
                    try {{
                        r.scrollIntoView({{ block: 'center' }});
                        if (!r.checked) {{
                            r.click();
                            clicked++;
                        }}
                        answered++;
                    }} catch (e) {{}}
                }}
                return {{ answered, clicked }};
            }})()"#,
            table = js_str(selectors::EVALUATION_TABLE_CSS),
            value = js_str(answer_value),
        );
        executor.eval_as(js).await
    }

    /// 全部选择 "Strongly Agree"
    pub async fn fill_strongly_agree(&self, executor: &JsExecutor) -> Result<FillOutcome> {
        self.fill_radios(executor, selectors::STRONGLY_AGREE_VALUE)
            .await
    }

    /// 清空评语（存在时）
    pub async fn clear_comments(&self, executor: &JsExecutor) -> Result<()> {
        let js = format!(
            r#"(() => {{
                const el = document.getElementById({});
                if (el) el.value = '';
                return !!el;
            }})()"#,
            js_str(selectors::COMMENTS_TEXTAREA)
        );
        executor.eval(js).await?;
        Ok(())
    }

    /// 点击第一个存在的提交按钮并等待回发结束
    ///
    /// 返回被点击按钮的 id；没有任何按钮时返回 `None`。
    pub async fn submit(&self, executor: &JsExecutor) -> Result<Option<String>> {
        for button_id in selectors::SUBMIT_BUTTONS {
            // 点击放入 setTimeout，防止同步回发打断本次 evaluate
            let js = format!(
                r#"(() => {{
                    const btn = document.getElementById({});
                    if (!btn) return false;
                    btn.scrollIntoView({{ block: 'center' }});
                    setTimeout(() => btn.click(), 0);
                    return true;
                }})()"#,
                js_str(button_id)
            );
            let clicked = match executor.eval_as::<bool>(js).await {
                Ok(clicked) => clicked,
                Err(e) => {
                    debug!("提交按钮 {} 点击失败: {}", button_id, e);
                    false
                }
            };
            if !clicked {
                continue;
            }

            info!("📤 已点击提交按钮: {}", button_id);
            // 给 setTimeout 中的点击留出执行时间
            sleep(Duration::from_millis(200)).await;
            let idle = wait::wait_for_ajax_and_postbacks(executor, SUBMIT_POSTBACK).await;
            if idle.is_err() {
                let progress = selectors::PROGRESS_INDICATOR;
                if let Err(e) = wait::wait_for_invisible(executor, progress, self.timeout).await {
                    debug!("{}", e);
                }
            }
            return Ok(Some(button_id.to_string()));
        }
        Ok(None)
    }

    /// 提示标签中要求填写预期成绩的消息
    pub async fn expected_grade_error(&self, executor: &JsExecutor) -> Result<Option<String>> {
        let message = self
            .label_text(executor, selectors::MESSAGE_LABEL)
            .await?
            .unwrap_or_default();
        if is_expected_grade_message(&message) {
            warn!("检测到预期成绩提示: \"{}\"", message);
            Ok(Some(message))
        } else {
            Ok(None)
        }
    }

    /// 读取评价状态标签
    pub async fn status(&self, executor: &JsExecutor) -> Result<Option<EvaluationStatus>> {
        let text = self.label_text(executor, selectors::STATUS_LABEL).await?;
        Ok(text.map(|t| EvaluationStatus::parse(&t)))
    }

    /// 等待状态不再是 `Pending!`
    pub async fn wait_until_not_pending(&self, executor: &JsExecutor, timeout: Duration) -> bool {
        let what = "评价状态离开 Pending!";
        self.wait_for_status(executor, timeout, what, |s| !s.is_pending())
            .await
    }

    /// 等待状态变为 `Completed!`
    pub async fn wait_until_completed(&self, executor: &JsExecutor, timeout: Duration) -> bool {
        let what = "评价状态变为 Completed!";
        self.wait_for_status(executor, timeout, what, |s| s.is_completed())
            .await
    }

    async fn wait_for_status<P>(
        &self,
        executor: &JsExecutor,
        timeout: Duration,
        what: &str,
        predicate: P,
    ) -> bool
    where
        P: Fn(&EvaluationStatus) -> bool,
    {
        let predicate = &predicate;
        wait_until(what, timeout, DEFAULT_POLL, || async move {
            // 标签不存在时视为条件不满足
            Ok(self.status(executor).await?.is_some_and(|s| predicate(&s)))
        })
        .await
        .is_ok()
    }

    async fn label_text(&self, executor: &JsExecutor, element_id: &str) -> Result<Option<String>> {
        let js = format!(
            r#"(() => {{
                const el = document.getElementById({});
                return el ? (el.innerText || '').trim() : null;
            }})()"#,
            js_str(element_id)
        );
        executor.eval_as(js).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_outcome_deserializes_from_js_result() {
        let outcome: FillOutcome =
            serde_json::from_value(serde_json::json!({ "answered": 12, "clicked": 10 })).unwrap();
        assert_eq!(
            outcome,
            FillOutcome {
                answered: 12,
                clicked: 10
            }
        );
    }
}
