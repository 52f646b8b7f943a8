use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// 课程下拉框中的一项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseOption {
    /// option 的 value
    pub value: String,
    /// option 的显示文本（已去除首尾空白）
    pub text: String,
}

impl CourseOption {
    pub fn new(value: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            text: text.into().trim().to_string(),
        }
    }

    /// 是否为真实课程（排除 "请选择" 一类的占位项）
    pub fn is_selectable(&self) -> bool {
        !self.value.is_empty() && !matches!(self.value.to_lowercase().as_str(), "0" | "0_0")
    }
}

impl Display for CourseOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.value, self.text)
    }
}

/// 只保留可选课程，保持原有顺序
pub fn selectable_courses(options: Vec<CourseOption>) -> Vec<CourseOption> {
    options
        .into_iter()
        .filter(CourseOption::is_selectable)
        .collect()
}

/// 评价状态标签
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationStatus {
    /// `Pending!`
    Pending,
    /// `Completed!`
    Completed,
    /// 其他文本（包括空字符串）
    Other(String),
}

impl EvaluationStatus {
    pub fn parse(label: &str) -> Self {
        let text = label.trim();
        match text.to_lowercase().as_str() {
            "pending!" => EvaluationStatus::Pending,
            "completed!" => EvaluationStatus::Completed,
            _ => EvaluationStatus::Other(text.to_string()),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, EvaluationStatus::Pending)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, EvaluationStatus::Completed)
    }
}

impl Display for EvaluationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvaluationStatus::Pending => write!(f, "Pending!"),
            EvaluationStatus::Completed => write!(f, "Completed!"),
            EvaluationStatus::Other(text) => write!(f, "{}", text),
        }
    }
}

/// 教师姓名标签是否仍是占位内容（空，或只有下划线和空格）
pub fn is_placeholder_text(text: &str) -> bool {
    text.trim().chars().all(|c| c == '_' || c == ' ')
}

/// 提示信息是否在要求填写 Expected Grade
pub fn is_expected_grade_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("expected") && lower.contains("grade")
}
