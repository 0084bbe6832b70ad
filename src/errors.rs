use std::fmt;

#[derive(Debug, Clone)]
pub enum GeogateError {
    Authentication(String),
    QuotaExceeded(String),
    ProviderUnavailable(String),
    LookupNotFound(String),
    MalformedInput(String),
    Registration(String),
    Config(String),
    Serialization(String),
}

impl GeogateError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            GeogateError::Authentication(_) => "E001",
            GeogateError::QuotaExceeded(_) => "E002",
            GeogateError::ProviderUnavailable(_) => "E003",
            GeogateError::LookupNotFound(_) => "E004",
            GeogateError::MalformedInput(_) => "E005",
            GeogateError::Registration(_) => "E006",
            GeogateError::Config(_) => "E007",
            GeogateError::Serialization(_) => "E008",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            GeogateError::Authentication(_) => "Authentication Error",
            GeogateError::QuotaExceeded(_) => "Quota Exceeded",
            GeogateError::ProviderUnavailable(_) => "Provider Unavailable",
            GeogateError::LookupNotFound(_) => "Lookup Not Found",
            GeogateError::MalformedInput(_) => "Malformed Input",
            GeogateError::Registration(_) => "Registration Error",
            GeogateError::Config(_) => "Configuration Error",
            GeogateError::Serialization(_) => "Serialization Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            GeogateError::Authentication(msg) => msg,
            GeogateError::QuotaExceeded(msg) => msg,
            GeogateError::ProviderUnavailable(msg) => msg,
            GeogateError::LookupNotFound(msg) => msg,
            GeogateError::MalformedInput(msg) => msg,
            GeogateError::Registration(msg) => msg,
            GeogateError::Config(msg) => msg,
            GeogateError::Serialization(msg) => msg,
        }
    }

    /// 格式化为彩色输出（用于 Server 模式）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for GeogateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 默认使用简洁格式
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for GeogateError {}

// 便捷的构造函数
impl GeogateError {
    pub fn authentication<T: Into<String>>(msg: T) -> Self {
        GeogateError::Authentication(msg.into())
    }

    /// 超限错误，携带 tier 名称，消息格式与对外响应一致
    pub fn quota_exceeded<T: fmt::Display>(tier: T) -> Self {
        GeogateError::QuotaExceeded(format!("Too many requests for {} tier", tier))
    }

    pub fn provider_unavailable<T: Into<String>>(msg: T) -> Self {
        GeogateError::ProviderUnavailable(msg.into())
    }

    pub fn lookup_not_found<T: Into<String>>(msg: T) -> Self {
        GeogateError::LookupNotFound(msg.into())
    }

    pub fn malformed_input<T: Into<String>>(msg: T) -> Self {
        GeogateError::MalformedInput(msg.into())
    }

    pub fn registration<T: Into<String>>(msg: T) -> Self {
        GeogateError::Registration(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        GeogateError::Config(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        GeogateError::Serialization(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<std::io::Error> for GeogateError {
    fn from(err: std::io::Error) -> Self {
        GeogateError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for GeogateError {
    fn from(err: serde_json::Error) -> Self {
        GeogateError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for GeogateError {
    fn from(err: csv::Error) -> Self {
        GeogateError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GeogateError>;
