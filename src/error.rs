use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// 传输层（ssh2 或测试替身）返回的底层错误
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 上传失败：固定的描述信息，原因通过 `source()` 链接
#[derive(Error, Debug)]
#[error("Error uploading file to SFTP")]
pub struct UploadError {
    #[source]
    cause: FailureCause,
}

/// 具体的失败原因
#[derive(Error, Debug)]
pub enum FailureCause {
    #[error("Invalid transfer request: {field} - {message}")]
    InvalidRequest { field: &'static str, message: String },

    #[error("Failed to connect to {address}")]
    Connection {
        address: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed to open SFTP channel")]
    Channel {
        #[source]
        source: BoxError,
    },

    #[error("Failed to read local file {}", path.display())]
    LocalFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write remote file {remote_path}")]
    Transfer {
        remote_path: String,
        #[source]
        source: BoxError,
    },
}

/// 失败类别，便于调用方按类型判断
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidRequest,
    Connection,
    Channel,
    LocalFile,
    Transfer,
}

impl UploadError {
    pub fn kind(&self) -> ErrorKind {
        self.cause.kind()
    }

    pub fn cause(&self) -> &FailureCause {
        &self.cause
    }
}

impl From<FailureCause> for UploadError {
    fn from(cause: FailureCause) -> Self {
        Self { cause }
    }
}

impl FailureCause {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest { .. } => ErrorKind::InvalidRequest,
            Self::Connection { .. } => ErrorKind::Connection,
            Self::Channel { .. } => ErrorKind::Channel,
            Self::LocalFile { .. } => ErrorKind::LocalFile,
            Self::Transfer { .. } => ErrorKind::Transfer,
        }
    }

    pub fn invalid_request(field: &'static str, message: &str) -> Self {
        Self::InvalidRequest {
            field,
            message: message.to_string(),
        }
    }

    pub fn connection(address: &str, source: impl Into<BoxError>) -> Self {
        Self::Connection {
            address: address.to_string(),
            source: source.into(),
        }
    }

    pub fn channel(source: impl Into<BoxError>) -> Self {
        Self::Channel {
            source: source.into(),
        }
    }

    pub fn local_file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::LocalFile {
            path: path.into(),
            source,
        }
    }

    pub fn transfer(remote_path: &str, source: impl Into<BoxError>) -> Self {
        Self::Transfer {
            remote_path: remote_path.to_string(),
            source: source.into(),
        }
    }
}

/// 将错误及其完整原因链拼接为一行，供 CLI 输出
pub fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut current = error.source();
    while let Some(cause) = current {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        current = cause.source();
    }
    message
}
