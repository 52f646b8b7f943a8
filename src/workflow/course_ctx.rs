//! 课程处理上下文
//!
//! 封装"我正在处理第几门课程、第几次尝试"这一信息

use std::fmt::Display;

use crate::models::CourseOption;

/// 课程处理上下文
#[derive(Debug, Clone)]
pub struct CourseCtx {
    pub course: CourseOption,

    /// 课程在列表中的序号（从 1 开始，仅用于日志）
    pub course_index: usize,

    /// 课程总数
    pub total: usize,

    /// 第几次尝试（从 1 开始）
    pub attempt: usize,
}

impl CourseCtx {
    pub fn new(course: CourseOption, course_index: usize, total: usize, attempt: usize) -> Self {
        Self {
            course,
            course_index,
            total,
            attempt,
        }
    }
}

impl Display for CourseCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[课程 {}/{}", self.course_index, self.total)?;
        if self.attempt > 1 {
            write!(f, " 重试#{}", self.attempt - 1)?;
        }
        write!(f, "]")
    }
}
