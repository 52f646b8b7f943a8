use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::course::CourseOption;

/// 提交状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Success,
    Failure,
}

/// 单门课程一次处理尝试的审计记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub course_value: String,
    pub course_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faculty_name: Option<String>,
    /// 第几次尝试（从 1 开始）
    pub attempt: usize,
    pub questions_filled: usize,
    pub expected_grade_set: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_expected_grade: Option<String>,
    pub status: SubmissionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clicked_submit_id: Option<String>,
    pub resubmitted_after_fix: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl AuditRecord {
    /// 开始处理一门课程，状态先记为失败，提交成功后再改写
    pub fn start(course: &CourseOption, attempt: usize) -> Self {
        let now = Utc::now();
        Self {
            course_value: course.value.clone(),
            course_name: course.text.clone(),
            faculty_name: None,
            attempt,
            questions_filled: 0,
            expected_grade_set: false,
            selected_expected_grade: None,
            status: SubmissionStatus::Failure,
            clicked_submit_id: None,
            resubmitted_after_fix: false,
            error: None,
            started_at: now,
            finished_at: now,
        }
    }

    /// 标记提交成功
    pub fn succeed(mut self, clicked_submit_id: &str) -> Self {
        self.status = SubmissionStatus::Success;
        self.clicked_submit_id = Some(clicked_submit_id.to_string());
        self.error = None;
        self.finished_at = Utc::now();
        self
    }

    /// 标记失败并记录原因
    pub fn fail(mut self, error: impl Into<String>) -> Self {
        self.status = SubmissionStatus::Failure;
        self.error = Some(error.into());
        self.finished_at = Utc::now();
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == SubmissionStatus::Success
    }
}

/// 审计记录汇总
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AuditSummary {
    /// 涉及的课程数（按 course_value 去重）
    pub courses: usize,
    /// 最终提交成功的课程数
    pub succeeded: usize,
    /// 最终仍未成功的课程数
    pub failed: usize,
    /// 总尝试次数
    pub attempts: usize,
}

impl AuditSummary {
    /// 以每门课程最后一次尝试的结果为准
    pub fn from_records(records: &[AuditRecord]) -> Self {
        let mut latest: Vec<(&str, bool)> = Vec::new();
        for record in records {
            let value = record.course_value.as_str();
            match latest.iter().position(|(v, _)| *v == value) {
                Some(i) => latest[i].1 = record.is_success(),
                None => latest.push((value, record.is_success())),
            }
        }
        let succeeded = latest.iter().filter(|(_, ok)| *ok).count();
        Self {
            courses: latest.len(),
            succeeded,
            failed: latest.len() - succeeded,
            attempts: records.len(),
        }
    }
}

/// 最后一次尝试仍失败的课程，按首次出现顺序
pub fn failed_courses(records: &[AuditRecord]) -> Vec<String> {
    let mut order: Vec<&str> = Vec::new();
    for record in records {
        if !order.contains(&record.course_value.as_str()) {
            order.push(record.course_value.as_str());
        }
    }
    order
        .into_iter()
        .filter(|value| {
            records
                .iter()
                .rev()
                .find(|r| r.course_value == *value)
                .is_some_and(|r| !r.is_success())
        })
        .map(str::to_string)
        .collect()
}

/// 某门课程已经尝试的次数
pub fn attempts_for(records: &[AuditRecord], course_value: &str) -> usize {
    records
        .iter()
        .filter(|r| r.course_value == course_value)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(value: &str) -> CourseOption {
        CourseOption::new(value, format!("Course {}", value))
    }

    #[test]
    fn test_record_serialization_shape() {
        let button = "ctl00_MainContainer_btnLabSubmit";
        let record = AuditRecord::start(&course("101_1"), 1).succeed(button);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["status"], "success");
        assert_eq!(json["course_value"], "101_1");
        assert_eq!(json["clicked_submit_id"], button);
        assert!(json.get("error").is_none());
        assert!(json.get("faculty_name").is_none());
        assert!(json["started_at"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_failure_always_has_error() {
        let record = AuditRecord::start(&course("101_1"), 1).fail("evaluation_load_timeout");
        assert!(!record.is_success());
        assert_eq!(record.error.as_deref(), Some("evaluation_load_timeout"));
        assert!(record.finished_at >= record.started_at);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "failure");
    }

    #[test]
    fn test_summary_uses_latest_attempt() {
        let records = vec![
            AuditRecord::start(&course("a"), 1).fail("no_submit_button_found"),
            AuditRecord::start(&course("b"), 1).succeed("x"),
            AuditRecord::start(&course("c"), 1).fail("evaluation_load_timeout"),
            AuditRecord::start(&course("a"), 2).succeed("x"),
        ];

        let summary = AuditSummary::from_records(&records);
        assert_eq!(
            summary,
            AuditSummary {
                courses: 3,
                succeeded: 2,
                failed: 1,
                attempts: 4,
            }
        );
        assert_eq!(failed_courses(&records), vec!["c".to_string()]);
        assert_eq!(attempts_for(&records, "a"), 2);
        assert_eq!(attempts_for(&records, "z"), 0);
    }
}
