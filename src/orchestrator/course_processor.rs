//! 课程列表处理器 - 编排层
//!
//! ## 职责
//!
//! 遍历课程下拉框中的全部课程，按轮次调度 `CourseFlow`，
//! 并根据页面上的评价状态决定是否重试失败课程、补处理新出现的课程。
//!
//! ## 处理顺序
//!
//! 1. **主轮次**：最多 `max_rounds` 轮，每轮处理尚未处理过的课程；
//!    状态离开 `Pending!` 或本轮没有进展时提前结束
//! 2. **失败重试**：状态仍未 `Completed!` 时，重试最后一次失败的课程，最多 `extra_retry_attempts` 遍
//! 3. **补处理**：重新读取下拉框，处理此前未出现过的课程

use std::collections::HashSet;
use std::time::Duration;

use anyhow::Result;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::Config;
use crate::infrastructure::wait;
use crate::infrastructure::JsExecutor;
use crate::models::audit::{attempts_for, failed_courses};
use crate::models::{AuditRecord, CourseOption};
use crate::services::{CourseSelector, EvaluationForm};
use crate::utils::logging::{log_courses_loaded, log_round_start};
use crate::workflow::{CourseCtx, CourseFlow};

/// 每门课程处理后等待回发结束
const BETWEEN_COURSES_SETTLE: Duration = Duration::from_secs(8);
/// 重试 / 补处理时的回发等待
const RETRY_SETTLE: Duration = Duration::from_secs(6);
/// 轮次之间检查状态的等待时间
const STATUS_CHECK_TIMEOUT: Duration = Duration::from_secs(6);
/// 抽样模式下课程之间的间隔
const SAMPLE_DELAY: Duration = Duration::from_millis(800);

/// 课程列表处理器
pub struct CourseProcessor {
    flow: CourseFlow,
    form: EvaluationForm,
    selector: CourseSelector,
    max_rounds: usize,
    extra_retry_attempts: usize,
}

impl CourseProcessor {
    pub fn new(config: &Config) -> Self {
        let timeout = config.wait_timeout();
        Self {
            flow: CourseFlow::new(timeout),
            form: EvaluationForm::new(timeout),
            selector: CourseSelector::new(timeout),
            max_rounds: config.max_rounds.max(1),
            extra_retry_attempts: config.extra_retry_attempts,
        }
    }

    /// 读取当前可选课程
    pub async fn load_courses(&self, executor: &JsExecutor) -> Result<Vec<CourseOption>> {
        self.selector.options(executor).await
    }

    /// 抽样模式：只处理前 `limit` 门课程各一次
    pub async fn process_first_n(
        &self,
        executor: &JsExecutor,
        courses: &[CourseOption],
        limit: usize,
    ) -> Vec<AuditRecord> {
        let sample: Vec<&CourseOption> = courses.iter().take(limit).collect();
        log_courses_loaded(courses.len(), Some(limit));

        let mut records = Vec::with_capacity(sample.len());
        for (index, course) in sample.iter().enumerate() {
            let ctx = CourseCtx::new((*course).clone(), index + 1, sample.len(), 1);
            records.push(self.flow.run(executor, &ctx).await);
            sleep(SAMPLE_DELAY).await;
        }
        records
    }

    /// 主轮次 + 失败重试
    pub async fn process_all(
        &self,
        executor: &JsExecutor,
        courses: &[CourseOption],
    ) -> Vec<AuditRecord> {
        log_courses_loaded(courses.len(), None);

        let mut records: Vec<AuditRecord> = Vec::new();
        let mut processed: HashSet<String> = HashSet::new();

        for round in 1..=self.max_rounds {
            let pending = pending_courses(courses, &processed);
            if pending.is_empty() {
                break;
            }
            log_round_start(round, self.max_rounds, pending.len());

            for course in pending {
                let index = position_of(courses, &course.value);
                let ctx = CourseCtx::new(course.clone(), index, courses.len(), 1);
                records.push(self.flow.run(executor, &ctx).await);
                processed.insert(course.value.clone());
                wait::settle(executor, BETWEEN_COURSES_SETTLE).await;
            }

            if self
                .form
                .wait_until_not_pending(executor, STATUS_CHECK_TIMEOUT)
                .await
            {
                info!("✓ 评价状态已不再是 Pending!");
                break;
            }
        }

        if !self
            .form
            .wait_until_completed(executor, STATUS_CHECK_TIMEOUT)
            .await
        {
            info!("评价状态尚未 Completed!，重试失败的课程");
            self.retry_failed(executor, courses, &mut records).await;
        }

        records
    }

    /// 重试最后一次尝试失败的课程
    async fn retry_failed(
        &self,
        executor: &JsExecutor,
        courses: &[CourseOption],
        records: &mut Vec<AuditRecord>,
    ) {
        for pass in 1..=self.extra_retry_attempts {
            let retry_values = failed_courses(records);
            if retry_values.is_empty() {
                break;
            }
            info!(
                "🔁 第 {}/{} 遍重试, 共 {} 门课程",
                pass,
                self.extra_retry_attempts,
                retry_values.len()
            );

            for value in retry_values {
                let course = courses
                    .iter()
                    .find(|c| c.value == value)
                    .cloned()
                    .unwrap_or_else(|| CourseOption::new(value.clone(), ""));
                let attempt = attempts_for(records, &value) + 1;
                let index = position_of(courses, &value);
                let ctx = CourseCtx::new(course, index, courses.len(), attempt);
                records.push(self.flow.run(executor, &ctx).await);
                wait::settle(executor, RETRY_SETTLE).await;
            }
        }
    }

    /// 重新读取下拉框，处理此前从未尝试过的课程
    pub async fn process_leftovers(&self, executor: &JsExecutor, records: &mut Vec<AuditRecord>) {
        let current = match self.load_courses(executor).await {
            Ok(courses) => courses,
            Err(e) => {
                warn!("⚠️ 重新读取课程列表失败: {}", e);
                return;
            }
        };

        let attempted: HashSet<String> = records.iter().map(|r| r.course_value.clone()).collect();
        let leftovers = pending_courses(&current, &attempted);
        if leftovers.is_empty() {
            info!("没有遗漏的课程");
            return;
        }

        info!("发现 {} 门遗漏课程, 开始补处理", leftovers.len());
        for course in leftovers {
            let ctx = CourseCtx::new(
                course.clone(),
                position_of(&current, &course.value),
                current.len(),
                1,
            );
            records.push(self.flow.run(executor, &ctx).await);
            wait::settle(executor, RETRY_SETTLE).await;
        }
    }

    /// 检查评价状态是否已完成
    pub async fn wait_until_completed(&self, executor: &JsExecutor, timeout: Duration) -> bool {
        self.form.wait_until_completed(executor, timeout).await
    }
}

/// 尚未处理的课程，保持下拉框顺序
fn pending_courses<'a>(
    courses: &'a [CourseOption],
    done: &HashSet<String>,
) -> Vec<&'a CourseOption> {
    courses
        .iter()
        .filter(|c| !done.contains(&c.value))
        .collect()
}

/// 课程在列表中的序号（从 1 开始），不存在时为 0
fn position_of(courses: &[CourseOption], value: &str) -> usize {
    courses
        .iter()
        .position(|c| c.value == value)
        .map(|i| i + 1)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn courses() -> Vec<CourseOption> {
        vec![
            CourseOption::new("10", "CSE 1110"),
            CourseOption::new("11", "CSE 1111"),
            CourseOption::new("12", "MATH 1151"),
        ]
    }

    #[test]
    fn test_pending_courses_keeps_order() {
        let all = courses();
        let done: HashSet<String> = ["11".to_string()].into_iter().collect();
        let pending: Vec<&str> = pending_courses(&all, &done)
            .into_iter()
            .map(|c| c.value.as_str())
            .collect();
        assert_eq!(pending, vec!["10", "12"]);
    }

    #[test]
    fn test_position_of() {
        let all = courses();
        assert_eq!(position_of(&all, "10"), 1);
        assert_eq!(position_of(&all, "12"), 3);
        assert_eq!(position_of(&all, "99"), 0);
    }

    #[test]
    fn test_retry_attempt_numbering() {
        let all = courses();
        let records = vec![
            AuditRecord::start(&all[0], 1).fail("evaluation_load_timeout"),
            AuditRecord::start(&all[1], 1).succeed("btn"),
            AuditRecord::start(&all[0], 2).fail("no_submit_button_found"),
        ];
        let retry = failed_courses(&records);
        assert_eq!(retry, vec!["10".to_string()]);
        assert_eq!(attempts_for(&records, &retry[0]) + 1, 3);
    }
}
