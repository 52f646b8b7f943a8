//! UCAM 页面元素定位
//!
//! 页面是 ASP.NET WebForms 生成的，客户端 id 由控件树决定，
//! 回发时 name 使用 `$` 分隔（`ctl00$MainContainer$...`）。

// ========== 登录页 ==========

pub const LOGIN_USERNAME: &str = "logMain_UserName";
pub const LOGIN_PASSWORD: &str = "logMain_Password";
pub const LOGIN_BUTTON: &str = "logMain_Button1";

// ========== 菜单 ==========

/// 顶部菜单项
pub const MENU_TOP_XPATH: &str =
    "/html/body/form/div[3]/div[2]/div/div/div/div/div[2]/div[1]/ul/li[5]/a";
/// 二级菜单
pub const MENU_SECOND_XPATH: &str =
    "/html/body/form/div[3]/div[2]/div/div/div/div/div[2]/div[1]/ul/li[1]";
/// 课程评价子菜单
pub const MENU_EVALUATION_XPATH: &str =
    "/html/body/form/div[3]/div[2]/div/div/div/div/div[2]/div[1]/ul/li[1]/ul/li/a";

// ========== 课程评价页 ==========

pub const COURSE_SELECT: &str = "ctl00_MainContainer_ddlAcaCalSection";
pub const COURSE_SELECT_POSTBACK_TARGET: &str = "ctl00$MainContainer$ddlAcaCalSection";
pub const EXPECTED_GRADE_SELECT: &str = "ctl00_MainContainer_ddlExpectedGrade";
pub const FACULTY_LABEL: &str = "ctl00_MainContainer_lblFacultyName";
pub const STATUS_LABEL: &str = "ctl00_MainContainer_lblEvaluationStatus";
pub const MESSAGE_LABEL: &str = "ctl00_MainContainer_lblMsg";
pub const COMMENTS_TEXTAREA: &str = "ctl00_MainContainer_txtTheoryComments";
pub const PROGRESS_INDICATOR: &str = "divProgress";

pub const EVALUATION_TABLE_CSS: &str = "table.evaluationTable";

/// "Expected Grade" 标签之后的第一个下拉框（限定在评价面板内）
pub const PANEL_EXPECTED_GRADE_XPATH: &str = concat!(
    "//div[contains(@class,'panel') and contains(@class,'panel-default')",
    " and contains(@class,'pp')]",
    "//label[normalize-space()='Expected Grade']/following::select[1]"
);

/// 提交按钮，按优先级排列
pub const SUBMIT_BUTTONS: [&str; 3] = [
    "ctl00_MainContainer_btnLabSubmit",
    "ctl00_MainContainer_btnTheorySubmit",
    "ctl00_MainContainer_btnTheoryTop",
];

// ========== 固定答案 ==========

pub const EXPECTED_GRADE: &str = "A";
/// "Strongly Agree" 对应的单选框取值
pub const STRONGLY_AGREE_VALUE: &str = "5";
