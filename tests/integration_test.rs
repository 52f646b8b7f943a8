use std::collections::HashMap;
use std::time::Duration;

use chromiumoxide::Browser;

use ucam_course_eval::browser::launch_browser;
use ucam_course_eval::config::Config;
use ucam_course_eval::infrastructure::JsExecutor;
use ucam_course_eval::models::{AuditRecord, AuditSummary, CourseOption, SubmissionStatus};
use ucam_course_eval::services::{
    AuditWriter, CourseSelector, EvaluationForm, LoginService, MenuNavigator,
};
use ucam_course_eval::utils::logging;
use ucam_course_eval::workflow::{CourseCtx, CourseFlow};

/// 评价页面的精简版本：课程下拉框、评价面板、三道单选题、评语和理论课提交按钮
///
/// 切换课程 300ms 后才填充教师姓名，模拟 UpdatePanel 回发。
const EVALUATION_PAGE: &str = r#"<!DOCTYPE html>
<html>
<body>
<form>
  <select id="ctl00_MainContainer_ddlAcaCalSection"
          onchange="setTimeout(() => { document.getElementById('ctl00_MainContainer_lblFacultyName').innerText = 'Dr. Rahman'; }, 300)">
    <option value="0">Select</option>
    <option value="1203_45">CSE 2215 - Data Structure</option>
  </select>
  <div class="panel panel-default pp">
    <span id="ctl00_MainContainer_lblFacultyName">____</span>
    <span id="ctl00_MainContainer_lblEvaluationStatus">Pending!</span>
    <label>Expected Grade</label>
    <select id="ctl00_MainContainer_ddlExpectedGrade">
      <option value=""></option>
      <option value="A">A</option>
      <option value="B">B</option>
    </select>
    <table class="evaluationTable">
      <tr><td>Q1</td>
        <td><input type="radio" name="q1" value="1"></td>
        <td><input type="radio" name="q1" value="3"></td>
        <td><input type="radio" name="q1" value="5"></td></tr>
      <tr><td>Q2</td>
        <td><input type="radio" name="q2" value="1" checked></td>
        <td><input type="radio" name="q2" value="3"></td>
        <td><input type="radio" name="q2" value="5"></td></tr>
      <tr><td>Q3</td>
        <td><input type="radio" name="q3" value="1"></td>
        <td><input type="radio" name="q3" value="3"></td>
        <td><input type="radio" name="q3" value="5"></td></tr>
    </table>
    <textarea id="ctl00_MainContainer_txtTheoryComments">old comment</textarea>
    <span id="ctl00_MainContainer_lblMsg"></span>
    <input type="button" id="ctl00_MainContainer_btnTheorySubmit" value="Submit"
           onclick="document.getElementById('ctl00_MainContainer_lblMsg').innerText = 'Saved successfully';">
  </div>
</form>
</body>
</html>"#;

const THEORY_SUBMIT: &str = "ctl00_MainContainer_btnTheorySubmit";

fn env_config(vars: &[(&str, &str)]) -> Config {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let mut config = Config::default();
    config
        .apply_env(|name| map.get(name).cloned())
        .expect("解析环境变量失败");
    config
}

#[test]
fn test_config_from_env_overrides() {
    let config = env_config(&[
        ("USER_ID", " 011201234 "),
        ("PASSWORD", "secret"),
        ("HEADLESS", "false"),
        ("COURSE_LIMIT", "2"),
        ("TELEGRAM_BOT_TOKEN", "token"),
        ("TELEGRAM_CHAT_ID", "42"),
    ]);

    assert_eq!(config.user_id, "011201234");
    assert!(!config.headless);
    assert_eq!(config.course_limit, Some(2));
    assert_eq!(config.max_rounds, 4);
    assert_eq!(config.wait_timeout(), Duration::from_secs(15));
    assert!(config.telegram_enabled());
}

#[test]
fn test_config_rejects_bad_number() {
    let mut config = Config::default();
    let result = config.apply_env(|name| (name == "MAX_ROUNDS").then(|| "many".to_string()));
    assert!(result.is_err());
}

#[tokio::test]
async fn test_audit_file_reports_latest_attempt() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let writer = AuditWriter::new(dir.path().join("completed_courses.json"));

    let cse = CourseOption::new("101", "CSE 2215 - Data Structure");
    let eng = CourseOption::new("102", "ENG 1013 - English II");
    let records = vec![
        AuditRecord::start(&cse, 1).fail("evaluation_load_timeout"),
        AuditRecord::start(&eng, 1).succeed("ctl00_MainContainer_btnTheorySubmit"),
        AuditRecord::start(&cse, 2).succeed("ctl00_MainContainer_btnLabSubmit"),
    ];
    writer.write(&records).await.expect("写入审计文件失败");

    let loaded = writer.read().await.expect("读取审计文件失败");
    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded[0].status, SubmissionStatus::Failure);
    assert_eq!(loaded[2].attempt, 2);

    let summary = AuditSummary::from_records(&loaded);
    assert_eq!(summary.courses, 2);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.attempts, 3);
}

#[tokio::test]
#[ignore] // 默认忽略，需要本机 Chrome：cargo test -- --ignored
async fn test_launch_browser() {
    logging::init("debug");

    let config = env_config(&[("HEADLESS", "true")]);
    let (mut browser, page) = launch_browser(&config).await.expect("启动浏览器失败");

    let executor = JsExecutor::new(page);
    let url = executor.current_url().await.expect("读取 URL 失败");
    assert_eq!(url, "about:blank");

    browser.close().await.ok();
}

#[tokio::test]
#[ignore] // 需要真实账号：USER_ID / PASSWORD
async fn test_login_and_list_courses() {
    logging::init("debug");
    dotenvy::dotenv().ok();

    let config = Config::load().expect("加载配置失败");
    let (mut browser, page) = launch_browser(&config).await.expect("启动浏览器失败");
    let executor = JsExecutor::new(page);

    let retries = config.login_max_retries;
    let timeout = config.wait_timeout();
    LoginService::new(&config.login_url, retries, timeout)
        .login(&executor, &config.user_id, &config.password)
        .await
        .expect("登录失败");

    MenuNavigator::new(config.wait_timeout())
        .open_course_evaluation(&executor)
        .await
        .expect("导航失败");

    let courses = CourseSelector::new(config.wait_timeout())
        .options(&executor)
        .await
        .expect("读取课程列表失败");
    println!("找到 {} 门课程", courses.len());
    assert!(courses.iter().all(CourseOption::is_selectable));

    browser.close().await.ok();
}

/// 启动无头浏览器并载入评价页面
async fn evaluation_page() -> (Browser, JsExecutor) {
    let config = env_config(&[("HEADLESS", "true")]);
    let (browser, page) = launch_browser(&config).await.expect("启动浏览器失败");
    let loaded = page.set_content(EVALUATION_PAGE).await;
    loaded.expect("载入评价页面失败");
    (browser, JsExecutor::new(page))
}

#[tokio::test]
#[ignore] // 需要本机 Chrome
async fn test_fill_radios_answers_every_question() {
    let (mut browser, executor) = evaluation_page().await;
    let form = EvaluationForm::new(Duration::from_secs(5));

    let first = form.fill_strongly_agree(&executor).await.unwrap();
    assert_eq!(first.answered, 3);
    assert_eq!(first.clicked, 3);

    // 再次填写时已全部选中
    let second = form.fill_strongly_agree(&executor).await.unwrap();
    assert_eq!(second.answered, 3);
    assert_eq!(second.clicked, 0);

    let js = "document.querySelectorAll('input[type=radio]:checked').length";
    let checked: usize = executor.eval_as(js).await.unwrap();
    assert_eq!(checked, 3);

    browser.close().await.ok();
}

#[tokio::test]
#[ignore] // 需要本机 Chrome
async fn test_submit_clicks_theory_button_when_lab_missing() {
    let (mut browser, executor) = evaluation_page().await;
    let form = EvaluationForm::new(Duration::from_secs(5));

    let clicked = form.submit(&executor).await.unwrap();
    assert_eq!(clicked.as_deref(), Some(THEORY_SUBMIT));

    let grade_error = form.expected_grade_error(&executor).await.unwrap();
    assert!(grade_error.is_none());

    browser.close().await.ok();
}

#[tokio::test]
#[ignore] // 需要本机 Chrome
async fn test_expected_grade_located_inside_panel() {
    let (mut browser, executor) = evaluation_page().await;
    let form = EvaluationForm::new(Duration::from_secs(5));

    let set = form
        .set_expected_grade_in_panel(&executor, "A", 2, Duration::from_millis(100))
        .await;
    assert!(set);

    let grade = form.selected_expected_grade(&executor).await.unwrap();
    assert_eq!(grade.as_deref(), Some("A"));

    browser.close().await.ok();
}

#[tokio::test]
#[ignore] // 需要本机 Chrome
async fn test_evaluation_loaded_waits_for_faculty_name() {
    let (mut browser, executor) = evaluation_page().await;
    let form = EvaluationForm::new(Duration::from_secs(5));

    // 教师姓名仍是占位符
    let short = Duration::from_millis(500);
    assert!(!form.wait_for_evaluation_loaded(&executor, short).await);

    let label = "document.getElementById('ctl00_MainContainer_lblFacultyName')";
    let rename = format!(
        "setTimeout(() => {{ {}.innerText = 'Dr. Rahman'; }}, 300)",
        label
    );
    executor.eval(rename).await.unwrap();

    let timeout = Duration::from_secs(5);
    assert!(form.wait_for_evaluation_loaded(&executor, timeout).await);
    let faculty = form.faculty_name(&executor).await.unwrap();
    assert_eq!(faculty.as_deref(), Some("Dr. Rahman"));

    browser.close().await.ok();
}

#[tokio::test]
#[ignore] // 需要本机 Chrome
async fn test_course_flow_records_submission() {
    logging::init("debug");
    let (mut browser, executor) = evaluation_page().await;

    let course = CourseOption::new("1203_45", "CSE 2215 - Data Structure");
    let ctx = CourseCtx::new(course, 1, 1, 1);
    let flow = CourseFlow::new(Duration::from_secs(5));
    let record = flow.run(&executor, &ctx).await;

    assert_eq!(record.status, SubmissionStatus::Success);
    assert_eq!(record.clicked_submit_id.as_deref(), Some(THEORY_SUBMIT));
    assert_eq!(record.faculty_name.as_deref(), Some("Dr. Rahman"));
    assert_eq!(record.questions_filled, 3);
    assert!(record.expected_grade_set);
    assert_eq!(record.selected_expected_grade.as_deref(), Some("A"));
    assert!(!record.resubmitted_after_fix);

    let js = "document.getElementById('ctl00_MainContainer_txtTheoryComments').value";
    let comments: String = executor.eval_as(js).await.unwrap();
    assert!(comments.is_empty());

    browser.close().await.ok();
}
