use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 页面抓取错误
    #[error("抓取错误: {0}")]
    Transport(#[from] TransportError),
    /// 持久化错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 按 id 查找的记录不存在
    #[error("{kind} #{id} 不存在")]
    NotFound { kind: &'static str, id: u64 },
}

/// 页面抓取错误
///
/// 超时、非 2xx 响应、DNS/连接失败都归到这里，携带上游的原始信息
#[derive(Debug, Error)]
pub enum TransportError {
    /// 请求未能完成（超时、连接被重置、DNS 失败等）
    #[error("请求 {url} 失败: {message}")]
    RequestFailed { url: String, message: String },
    /// 服务器返回了非 2xx 状态码
    #[error("请求 {url} 返回状态码 {status}")]
    BadStatus { url: String, status: u16 },
    /// 响应体无法读取
    #[error("读取 {url} 响应体失败: {message}")]
    BodyFailed { url: String, message: String },
}

/// 持久化错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 更新的记录不存在
    #[error("{kind} #{id} 不存在，无法更新")]
    MissingRecord { kind: &'static str, id: u64 },
    /// 存储锁已中毒（之前有写入在持锁时 panic）
    #[error("存储锁已损坏")]
    Poisoned,
    /// 快照序列化/反序列化失败
    #[error("快照格式错误: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// HTTP 客户端构建失败
    #[error("HTTP 客户端构建失败: {0}")]
    HttpClient(String),
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建请求失败错误
    pub fn request_failed(url: impl Into<String>, message: impl ToString) -> Self {
        AppError::Transport(TransportError::RequestFailed {
            url: url.into(),
            message: message.to_string(),
        })
    }

    /// 创建状态码错误
    pub fn bad_status(url: impl Into<String>, status: u16) -> Self {
        AppError::Transport(TransportError::BadStatus {
            url: url.into(),
            status,
        })
    }

    /// 创建记录不存在错误
    pub fn not_found(kind: &'static str, id: u64) -> Self {
        AppError::NotFound { kind, id }
    }

    /// 是否为抓取错误（供编排层判断是否可以跳过当前试卷）
    pub fn is_transport(&self) -> bool {
        matches!(self, AppError::Transport(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

/// 存储层结果类型
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_carry_upstream_message() {
        let err = AppError::request_failed("https://example.test/a", "operation timed out");
        assert!(err.is_transport());
        assert!(err.to_string().contains("operation timed out"));
        assert!(err.to_string().contains("https://example.test/a"));
    }

    #[test]
    fn store_errors_convert_into_app_errors() {
        let err: AppError = StoreError::MissingRecord { kind: "course", id: 7 }.into();
        assert!(!err.is_transport());
        assert!(err.to_string().contains("course #7"));
    }
}
