pub mod course_ctx;
pub mod course_flow;

pub use course_ctx::CourseCtx;
pub use course_flow::CourseFlow;
