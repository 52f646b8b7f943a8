//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责会话生命周期和课程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `session` - 评价会话
//! - 管理应用生命周期（初始化、运行、关闭浏览器）
//! - 登录、导航到 Course Evaluation 页面
//! - 写审计文件、发送通知、输出全局统计信息
//!
//! ### `course_processor` - 课程列表处理器
//! - 遍历课程下拉框（Vec<CourseOption>）
//! - 多轮处理、失败重试、补处理遗漏课程
//! - 抽样模式（只处理前 N 门）
//!
//! ## 层次关系
//!
//! ```text
//! session (一次会话)
//!     ↓
//! course_processor (处理 Vec<CourseOption>)
//!     ↓
//! workflow::CourseFlow (处理单门课程)
//!     ↓
//! services (能力层：login / navigation / course_select / evaluation_form)
//!     ↓
//! infrastructure (基础设施：JsExecutor / wait / retry)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：session 管资源和输出，course_processor 管调度
//! 2. **资源隔离**：只有编排层持有 Browser 和 JsExecutor
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure

pub mod course_processor;
pub mod session;

// 重新导出主要类型
pub use course_processor::CourseProcessor;
pub use session::App;
