/// 应用程序错误类型
///
/// 只收录需要被上层区分处理的失败（例如决定进程退出码），
/// 其余错误通过 `anyhow` 携带上下文向上传播。
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 未提供账号或密码
    #[error("未提供 USER_ID 或 PASSWORD")]
    MissingCredentials,

    /// 登录重试耗尽
    #[error("登录失败 (已尝试 {attempts} 次): {reason}")]
    LoginFailed { attempts: usize, reason: String },

    /// 菜单导航失败（step 从 1 开始）
    #[error("导航失败: 第 {step} 个菜单项无法点击 ({xpath})")]
    NavigationFailed { step: usize, xpath: String },

    /// 等待条件超时
    #[error("等待超时 ({secs:.1}s): {what}")]
    Timeout { what: String, secs: f64 },

    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(String),

    /// 审计文件读写失败
    #[error("审计文件错误 ({path}): {source}")]
    Audit {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 通知发送失败
    #[error("通知发送失败: {0}")]
    Notify(String),
}

/// 配置错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 的值 '{value}' 无法解析为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },

    /// 配置文件读取失败
    #[error("无法读取配置文件 {path}: {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 配置文件解析失败
    #[error("配置文件 {path} 解析失败: {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(err.to_string())
    }
}

impl AppError {
    /// 进程退出码
    ///
    /// 登录相关为 2，菜单导航第 1/2/3 步分别为 3/4/5，其余为 1。
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::MissingCredentials | AppError::LoginFailed { .. } => 2,
            AppError::NavigationFailed { step, .. } => 2 + (*step as i32),
            _ => 1,
        }
    }

    /// 创建超时错误
    pub fn timeout(what: impl Into<String>, timeout: std::time::Duration) -> Self {
        AppError::Timeout {
            what: what.into(),
            secs: timeout.as_secs_f64(),
        }
    }

    /// 创建审计文件错误
    pub fn audit(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Audit {
            path: path.into(),
            source,
        }
    }
}

/// 从 anyhow 错误链中提取退出码
pub fn exit_code_of(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<AppError>())
        .map(AppError::exit_code)
        .unwrap_or(1)
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
