//! 上传流程依赖的传输抽象：会话与 SFTP 通道。
//!
//! 默认实现基于 `ssh2`（见 `ssh_client` 与 `sftp_client`），测试中可替换为内存实现。

use crate::error::{BoxError, FailureCause};
use crate::request::TransferRequest;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

/// 建立会话时的选项
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    /// 是否校验主机密钥；默认 `false`，即接受任意主机密钥（不安全，保持旧行为）
    pub verify_host_key: bool,
    /// known_hosts 文件路径，为 None 时使用 `~/.ssh/known_hosts`
    pub known_hosts: Option<PathBuf>,
    /// 连接与读写超时
    pub timeout: Option<Duration>,
}

/// 负责建立已认证的会话
pub trait Connector {
    type Session: RemoteSession;

    /// 连接并完成用户名/密码认证；认证失败时实现方需先断开会话再返回错误
    fn connect(
        &self,
        request: &TransferRequest,
        options: &ConnectOptions,
    ) -> Result<Self::Session, FailureCause>;
}

/// 已认证的传输会话
pub trait RemoteSession {
    type Channel: SftpChannel;

    fn open_sftp(&mut self) -> Result<Self::Channel, FailureCause>;

    fn is_connected(&self) -> bool;

    fn disconnect(&mut self) -> Result<(), BoxError>;
}

/// 会话上的 SFTP 子通道
pub trait SftpChannel {
    /// 以创建/截断方式打开远端文件用于写入
    fn create(&mut self, remote_path: &str) -> Result<Box<dyn Write + '_>, BoxError>;

    fn is_connected(&self) -> bool;

    fn disconnect(&mut self) -> Result<(), BoxError>;
}
