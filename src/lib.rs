//! # UCAM Course Eval
//!
//! 自动完成 UCAM 门户课程评价的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 能力
//! - `wait` / `retry` - 轮询等待 ASP.NET 回发、有限次重试
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `LoginService` - 登录能力
//! - `MenuNavigator` - 菜单导航能力
//! - `CourseSelector` / `EvaluationForm` - 课程选择与评价表单能力
//! - `AuditWriter` / `TelegramNotifier` - 写审计文件、发送通知
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一门课程"的完整处理流程
//! - `CourseCtx` - 上下文封装（课程 + 序号 + 尝试次数）
//! - `CourseFlow` - 流程编排（select → grade → radios → submit → fix）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/session` - 一次评价会话，管理浏览器资源
//! - `orchestrator/course_processor` - 多轮处理课程列表
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::{connect_to_browser_and_page, launch_browser};
pub use config::Config;
pub use error::{exit_code_of, AppError, AppResult};
pub use infrastructure::JsExecutor;
pub use models::{AuditRecord, AuditSummary, CourseOption, EvaluationStatus};
pub use orchestrator::{App, CourseProcessor};
pub use workflow::{CourseCtx, CourseFlow};
