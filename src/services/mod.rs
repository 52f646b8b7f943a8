pub mod audit_writer;
pub mod auth_service;
pub mod course_select;
pub mod evaluation_form;
pub mod navigation;
pub mod notifier;

pub use audit_writer::AuditWriter;
pub use auth_service::LoginService;
pub use course_select::CourseSelector;
pub use evaluation_form::{EvaluationForm, FillOutcome};
pub use navigation::MenuNavigator;
pub use notifier::TelegramNotifier;
