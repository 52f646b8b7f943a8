use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// 默认配置文件名（存在时自动加载）
pub const DEFAULT_CONFIG_FILE: &str = "ucam.toml";

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- 账号 ---
    pub user_id: String,
    pub password: String,
    // --- 浏览器 ---
    /// 是否使用无头模式
    pub headless: bool,
    /// 窗口大小 (宽, 高)
    pub window_size: (u32, u32),
    /// 浏览器可执行文件路径，未设置时由 chromiumoxide 自动探测
    pub chrome_executable: Option<String>,
    /// 设置后连接到已启动浏览器的调试端口，而不是启动新浏览器
    pub browser_debug_port: Option<u16>,
    /// 有头模式下结束前保留浏览器窗口的秒数
    pub keep_open_secs: u64,
    // --- 目标站点 ---
    pub login_url: String,
    // --- 等待与重试 ---
    /// 默认等待超时（秒）
    pub wait_timeout_secs: u64,
    pub login_max_retries: usize,
    /// 主循环最大轮数
    pub max_rounds: usize,
    /// 未提交成功的课程额外重试次数
    pub extra_retry_attempts: usize,
    /// 只处理前 N 门课程（抽样模式）
    pub course_limit: Option<usize>,
    // --- 输出 ---
    pub audit_log_file: String,
    pub log_level: String,
    // --- Telegram 通知 ---
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_id: String::new(),
            password: String::new(),
            headless: true,
            window_size: (1920, 1080),
            chrome_executable: None,
            browser_debug_port: None,
            keep_open_secs: 5,
            login_url: "https://ucam.uiu.ac.bd/Security/Login.aspx".to_string(),
            wait_timeout_secs: 15,
            login_max_retries: 3,
            max_rounds: 4,
            extra_retry_attempts: 2,
            course_limit: None,
            audit_log_file: "completed_courses.json".to_string(),
            log_level: "info".to_string(),
            telegram_bot_token: None,
            telegram_chat_id: None,
        }
    }
}

/// 配置文件内容，所有字段可选，未出现的字段沿用默认值
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    user_id: Option<String>,
    password: Option<String>,
    headless: Option<bool>,
    window_size: Option<String>,
    chrome_executable: Option<String>,
    browser_debug_port: Option<u16>,
    keep_open_secs: Option<u64>,
    login_url: Option<String>,
    wait_timeout_secs: Option<u64>,
    login_max_retries: Option<usize>,
    max_rounds: Option<usize>,
    extra_retry_attempts: Option<usize>,
    course_limit: Option<usize>,
    audit_log_file: Option<String>,
    log_level: Option<String>,
    telegram_bot_token: Option<String>,
    telegram_chat_id: Option<String>,
}

impl Config {
    /// 加载配置：默认值 → 配置文件 → 环境变量（后者覆盖前者）
    ///
    /// 配置文件路径取 `UCAM_CONFIG`，未设置时若当前目录存在 `ucam.toml` 则加载。
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let file_path = std::env::var("UCAM_CONFIG").ok().or_else(|| {
            Path::new(DEFAULT_CONFIG_FILE)
                .exists()
                .then(|| DEFAULT_CONFIG_FILE.to_string())
        });
        if let Some(path) = file_path {
            let content =
                std::fs::read_to_string(&path).map_err(|source| ConfigError::FileReadFailed {
                    path: path.clone(),
                    source,
                })?;
            config.apply_toml(&content, &path)?;
        }

        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// 用 TOML 文本覆盖当前配置
    pub fn apply_toml(&mut self, content: &str, path: &str) -> Result<(), ConfigError> {
        let file: FileConfig =
            toml::from_str(content).map_err(|source| ConfigError::TomlParseFailed {
                path: path.to_string(),
                source,
            })?;

        if let Some(v) = file.user_id {
            self.user_id = v;
        }
        if let Some(v) = file.password {
            self.password = v;
        }
        if let Some(v) = file.headless {
            self.headless = v;
        }
        if let Some(v) = file.window_size {
            self.window_size = parse_window_size("window_size", &v)?;
        }
        self.chrome_executable = file.chrome_executable.or(self.chrome_executable.take());
        self.browser_debug_port = file.browser_debug_port.or(self.browser_debug_port);
        self.keep_open_secs = file.keep_open_secs.unwrap_or(self.keep_open_secs);
        if let Some(v) = file.login_url {
            self.login_url = v;
        }
        self.wait_timeout_secs = file.wait_timeout_secs.unwrap_or(self.wait_timeout_secs);
        self.login_max_retries = file.login_max_retries.unwrap_or(self.login_max_retries);
        self.max_rounds = file.max_rounds.unwrap_or(self.max_rounds);
        self.extra_retry_attempts = file
            .extra_retry_attempts
            .unwrap_or(self.extra_retry_attempts);
        self.course_limit = file.course_limit.or(self.course_limit);
        if let Some(v) = file.audit_log_file {
            self.audit_log_file = v;
        }
        if let Some(v) = file.log_level {
            self.log_level = v;
        }
        self.telegram_bot_token = file.telegram_bot_token.or(self.telegram_bot_token.take());
        self.telegram_chat_id = file.telegram_chat_id.or(self.telegram_chat_id.take());
        Ok(())
    }

    /// 用环境变量覆盖当前配置
    ///
    /// `lookup` 便于在测试中替换真实环境。
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("USER_ID") {
            self.user_id = v.trim().to_string();
        }
        if let Some(v) = lookup("PASSWORD") {
            self.password = v;
        }
        if let Some(v) = lookup("HEADLESS") {
            self.headless = parse_headless(&v);
        }
        if let Some(v) = lookup("WINDOW_SIZE") {
            self.window_size = parse_window_size("WINDOW_SIZE", &v)?;
        }
        if let Some(v) = lookup("CHROME_EXECUTABLE") {
            self.chrome_executable = Some(v);
        }
        if let Some(v) = lookup("BROWSER_DEBUG_PORT") {
            self.browser_debug_port = Some(parse_number("BROWSER_DEBUG_PORT", &v)?);
        }
        if let Some(v) = lookup("KEEP_OPEN_SECS") {
            self.keep_open_secs = parse_number("KEEP_OPEN_SECS", &v)?;
        }
        if let Some(v) = lookup("LOGIN_URL") {
            self.login_url = v;
        }
        if let Some(v) = lookup("WAIT_TIMEOUT_SECS") {
            self.wait_timeout_secs = parse_number("WAIT_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("LOGIN_MAX_RETRIES") {
            self.login_max_retries = parse_number("LOGIN_MAX_RETRIES", &v)?;
        }
        if let Some(v) = lookup("MAX_ROUNDS") {
            self.max_rounds = parse_number("MAX_ROUNDS", &v)?;
        }
        if let Some(v) = lookup("EXTRA_RETRY_ATTEMPTS") {
            self.extra_retry_attempts = parse_number("EXTRA_RETRY_ATTEMPTS", &v)?;
        }
        if let Some(v) = lookup("COURSE_LIMIT") {
            self.course_limit = Some(parse_number("COURSE_LIMIT", &v)?);
        }
        if let Some(v) = lookup("AUDIT_LOG_FILE") {
            self.audit_log_file = v;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            self.log_level = v;
        }
        if let Some(v) = lookup("TELEGRAM_BOT_TOKEN").filter(|v| !v.is_empty()) {
            self.telegram_bot_token = Some(v);
        }
        if let Some(v) = lookup("TELEGRAM_CHAT_ID").filter(|v| !v.is_empty()) {
            self.telegram_chat_id = Some(v);
        }
        Ok(())
    }

    /// 默认等待时长
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    /// 是否启用 Telegram 通知
    pub fn telegram_enabled(&self) -> bool {
        self.telegram_bot_token.is_some() && self.telegram_chat_id.is_some()
    }
}

/// `0` / `false` / `False` 表示有头模式，其余均为无头
fn parse_headless(value: &str) -> bool {
    !matches!(value.trim(), "0" | "false" | "False")
}

fn parse_number<T: std::str::FromStr>(var_name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: value.to_string(),
            expected_type: std::any::type_name::<T>().to_string(),
        })
}

fn parse_window_size(var_name: &str, value: &str) -> Result<(u32, u32), ConfigError> {
    let invalid = || ConfigError::EnvVarParseFailed {
        var_name: var_name.to_string(),
        value: value.to_string(),
        expected_type: "宽,高".to_string(),
    };
    let (w, h) = value.split_once(',').ok_or_else(invalid)?;
    let w = w.trim().parse().map_err(|_| invalid())?;
    let h = h.trim().parse().map_err(|_| invalid())?;
    Ok((w, h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_headless_flag() {
        assert!(parse_headless("1"));
        assert!(parse_headless("yes"));
        assert!(!parse_headless("0"));
        assert!(!parse_headless("false"));
        assert!(!parse_headless("False"));
        // 只识别这三种写法
        assert!(parse_headless("FALSE"));
    }

    #[test]
    fn test_env_overrides_defaults() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("USER_ID", " 011201234 "),
                ("PASSWORD", "secret"),
                ("HEADLESS", "0"),
                ("MAX_ROUNDS", "2"),
                ("COURSE_LIMIT", "3"),
                ("WINDOW_SIZE", "1280, 720"),
                ("TELEGRAM_BOT_TOKEN", ""),
            ]))
            .unwrap();

        assert_eq!(config.user_id, "011201234");
        assert_eq!(config.password, "secret");
        assert!(!config.headless);
        assert_eq!(config.max_rounds, 2);
        assert_eq!(config.course_limit, Some(3));
        assert_eq!(config.window_size, (1280, 720));
        assert_eq!(config.login_max_retries, 3);
        assert!(config.telegram_bot_token.is_none());
        assert!(!config.telegram_enabled());
    }

    #[test]
    fn test_invalid_number_names_variable() {
        let mut config = Config::default();
        let err = config
            .apply_env(env(&[("LOGIN_MAX_RETRIES", "three")]))
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("LOGIN_MAX_RETRIES"));
        assert!(msg.contains("three"));
    }

    #[test]
    fn test_toml_then_env() {
        let mut config = Config::default();
        config
            .apply_toml(
                r#"
                user_id = "from-file"
                headless = false
                audit_log_file = "out/audit.json"
                telegram_bot_token = "t"
                telegram_chat_id = "42"
                "#,
                "ucam.toml",
            )
            .unwrap();
        config.apply_env(env(&[("USER_ID", "from-env")])).unwrap();

        assert_eq!(config.user_id, "from-env");
        assert!(!config.headless);
        assert_eq!(config.audit_log_file, "out/audit.json");
        assert!(config.telegram_enabled());
        assert_eq!(config.wait_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_bad_toml_reports_path() {
        let mut config = Config::default();
        let bad = r#"max_rounds = "x""#;
        let err = config.apply_toml(bad, "bad.toml").unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }
}
