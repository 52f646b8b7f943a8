pub mod js_executor;
pub mod retry;
pub mod wait;

pub use js_executor::{js_str, JsExecutor};
pub use retry::with_retries;
