pub mod audit;
pub mod course;
pub mod selectors;

pub use audit::{AuditRecord, AuditSummary, SubmissionStatus};
pub use course::{CourseOption, EvaluationStatus};
