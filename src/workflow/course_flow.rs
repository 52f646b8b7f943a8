//! 课程评价流程 - 流程层
//!
//! 核心职责：定义"一门课程"的完整处理流程
//!
//! 流程顺序：
//! 1. 选择课程（回发）→ 等待面板加载
//! 2. 设置预期成绩 A → 全部 Strongly Agree → 清空评语
//! 3. 提交 → 若提示缺少预期成绩，修正后重新提交一次

use std::time::Duration;

use anyhow::Result;
use tracing::{debug, error, info, warn};

use crate::infrastructure::wait;
use crate::infrastructure::JsExecutor;
use crate::models::{selectors, AuditRecord};
use crate::services::{CourseSelector, EvaluationForm};
use crate::utils::logging::truncate_text;
use crate::workflow::course_ctx::CourseCtx;

/// 面板加载超时
const LOAD_TIMEOUT: Duration = Duration::from_secs(25);
/// 提交后等待服务端更新提示信息
const AFTER_SUBMIT_SETTLE: Duration = Duration::from_secs(6);

pub const ERR_LOAD_TIMEOUT: &str = "evaluation_load_timeout";
pub const ERR_NO_SUBMIT_BUTTON: &str = "no_submit_button_found";

/// 单门课程的处理结局
#[derive(Debug, Clone, PartialEq, Eq)]
enum Submission {
    /// 已点击的提交按钮 id
    Submitted(String),
    /// 未能提交，附带原因
    Skipped(&'static str),
}

/// 课程评价流程
///
/// - 编排单门课程的处理步骤
/// - 不持有任何资源（page）
/// - 任何错误都转换为失败的审计记录，不中断整体运行
pub struct CourseFlow {
    selector: CourseSelector,
    form: EvaluationForm,
}

impl CourseFlow {
    pub fn new(timeout: Duration) -> Self {
        Self {
            selector: CourseSelector::new(timeout),
            form: EvaluationForm::new(timeout),
        }
    }

    pub async fn run(&self, executor: &JsExecutor, ctx: &CourseCtx) -> AuditRecord {
        info!("{} 开始处理: {}", ctx, truncate_text(&ctx.course.text, 60));

        let mut record = AuditRecord::start(&ctx.course, ctx.attempt);
        let outcome = self.process(executor, ctx, &mut record).await;
        if let Err(e) = &outcome {
            error!("{} ❌ 处理失败: {:#}", ctx, e);
        }
        let record = finish(record, outcome);

        if record.is_success() {
            info!("{} ✓ 提交成功 (已填写 {} 题)", ctx, record.questions_filled);
        } else {
            let reason = record.error.as_deref().unwrap_or("unknown");
            warn!("{} ⚠️ 提交失败: {}", ctx, reason);
        }
        record
    }

    /// 按步骤处理并把收集到的信息写入 `record`
    ///
    /// 只有选择课程和点击提交的失败会中止流程，其余读取与填写失败只记录日志。
    async fn process(
        &self,
        executor: &JsExecutor,
        ctx: &CourseCtx,
        record: &mut AuditRecord,
    ) -> Result<Submission> {
        // 1. 选择课程
        self.selector.select(executor, &ctx.course.value).await?;

        let loaded = self
            .form
            .wait_for_evaluation_loaded(executor, LOAD_TIMEOUT)
            .await;
        if !loaded {
            return Ok(Submission::Skipped(ERR_LOAD_TIMEOUT));
        }
        let faculty = self.form.faculty_name(executor).await;
        record.faculty_name = or_default(ctx, "读取教师姓名", faculty);
        if let Some(faculty) = &record.faculty_name {
            info!("{} 教师: {}", ctx, faculty);
        }

        // 2. 预期成绩
        record.expected_grade_set = self.ensure_grade(executor).await;
        let grade = self.form.selected_expected_grade(executor).await;
        record.selected_expected_grade = or_default(ctx, "读取预期成绩", grade);
        if !record.expected_grade_set {
            warn!(
                "{} ⚠️ 预期成绩未能确认, 当前值: {:?}",
                ctx, record.selected_expected_grade
            );
        }

        // 3. 单选题与评语
        let filled = self.form.fill_strongly_agree(executor).await;
        let filled = or_default(ctx, "填写单选题", filled);
        record.questions_filled = filled.answered;
        info!(
            "{} 已选择 Strongly Agree: {} 题 (新点击 {})",
            ctx, filled.answered, filled.clicked
        );
        let cleared = self.form.clear_comments(executor).await;
        or_default(ctx, "清空评语", cleared);

        // 4. 提交
        let Some(clicked_id) = self.form.submit(executor).await? else {
            return Ok(Submission::Skipped(ERR_NO_SUBMIT_BUTTON));
        };

        // 5. 服务端提示缺少预期成绩时修正并重新提交一次
        wait::settle(executor, AFTER_SUBMIT_SETTLE).await;
        let grade_error = self.form.expected_grade_error(executor).await;
        if or_default(ctx, "读取提示信息", grade_error).is_none() {
            return Ok(Submission::Submitted(clicked_id));
        }

        if !self.ensure_grade(executor).await {
            warn!("{} ⚠️ 提示后仍无法设置预期成绩", ctx);
            return Ok(Submission::Submitted(clicked_id));
        }

        info!("{} 已修正预期成绩, 重新提交", ctx);
        record.expected_grade_set = true;
        let grade = self.form.selected_expected_grade(executor).await;
        record.selected_expected_grade = or_default(ctx, "读取预期成绩", grade);
        match self.form.submit(executor).await? {
            Some(resubmit_id) => {
                record.resubmitted_after_fix = true;
                Ok(Submission::Submitted(resubmit_id))
            }
            None => Ok(Submission::Submitted(clicked_id)),
        }
    }

    async fn ensure_grade(&self, executor: &JsExecutor) -> bool {
        self.form
            .ensure_expected_grade(executor, selectors::EXPECTED_GRADE)
            .await
    }
}

/// 根据处理结果收尾审计记录，失败时保留已收集的字段
fn finish(record: AuditRecord, outcome: Result<Submission>) -> AuditRecord {
    match outcome {
        Ok(Submission::Submitted(clicked_id)) => record.succeed(&clicked_id),
        Ok(Submission::Skipped(reason)) => record.fail(reason),
        Err(e) => record.fail(format!("{:#}", e)),
    }
}

/// 可选步骤失败时记录日志并使用默认值
fn or_default<T: Default>(ctx: &CourseCtx, step: &str, result: Result<T>) -> T {
    result.unwrap_or_else(|e| {
        debug!("{} {}失败, 继续处理: {:#}", ctx, step, e);
        T::default()
    })
}
