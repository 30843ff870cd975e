//! 通过 SFTP 上传单个构建产物：连接、认证、传输、报告并确定性地断开连接。

pub mod config;
pub mod error;
pub mod logger;
pub mod request;
pub mod sftp_client;
pub mod ssh_client;
pub mod transport;
pub mod uploader;

pub use error::{BoxError, ErrorKind, FailureCause, UploadError};
pub use request::TransferRequest;
pub use transport::{ConnectOptions, Connector, RemoteSession, SftpChannel};
pub use uploader::{upload, Uploader};
