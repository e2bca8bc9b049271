use thiserror::Error;

/// 构建流程错误类型
///
/// 只包含会中止整次运行的情况；单条记录的问题以诊断信息的形式返回
#[derive(Debug, Error)]
pub enum DigestError {
    /// 输入文件不存在，没有可构建的数据
    #[error("输入文件不存在: {path}")]
    InputNotFound { path: String },

    /// 读取输入文件失败
    #[error("读取输入文件失败 ({path}): {source}")]
    InputReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 输入文件不是合法 JSON
    #[error("JSON解析失败 ({path}): {source}")]
    InputParseFailed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// 输入文件顶层不是数组
    #[error("输入文件顶层必须是记录数组: {path}")]
    InputNotArray { path: String },

    /// 写入产物失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件存在但无法读取
    #[error("读取配置文件失败 ({path}): {source}")]
    FileReadFailed {
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

    /// 默认分类不在注册表中
    #[error("未知的默认分类: {slug}")]
    UnknownTrack { slug: String },

    /// 主题取值不合法
    #[error("未知的主题策略: {value} (可选: system / light / dark)")]
    UnknownTheme { value: String },
}

// ========== 便捷构造函数 ==========

impl DigestError {
    /// 创建输入读取错误
    pub fn input_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        DigestError::InputReadFailed {
            path: path.into(),
            source,
        }
    }

    /// 创建写入错误
    pub fn write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        DigestError::WriteFailed {
            path: path.into(),
            source,
        }
    }
}

/// 构建流程结果类型
pub type DigestResult<T> = Result<T, DigestError>;
