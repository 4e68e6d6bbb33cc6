//! 存储层错误类型
//!
//! 封装底层错误：
//! - SQL 执行与连接错误
//! - 写入前的样本校验失败

#[derive(Debug)]
pub struct StorageError {
    message: String,
    validation: bool,
}

impl StorageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            validation: false,
        }
    }

    /// 样本校验失败（空 key、非有限数值等）。
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            validation: true,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.validation
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for StorageError {}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        Self::new(err.to_string())
    }
}
