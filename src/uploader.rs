//! 单文件上传：连接 → 打开 SFTP 通道 → 写入远端文件 → 断开。
//!
//! 无论在哪一步失败，已经建立的通道和会话都会按相反顺序断开，
//! 断开时的错误只记录日志，不会覆盖原始结果。

use crate::error::{FailureCause, UploadError};
use crate::request::TransferRequest;
use crate::ssh_client::Ssh2Connector;
use crate::transport::{ConnectOptions, Connector, RemoteSession, SftpChannel};
use log::{debug, info};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

const COPY_BUFFER_SIZE: usize = 32 * 1024;

type ChannelOf<C> = <<C as Connector>::Session as RemoteSession>::Channel;

/// 上传器，只持有不可变的连接选项，每次调用各自建立会话
#[derive(Debug, Clone, Default)]
pub struct Uploader<C = Ssh2Connector> {
    connector: C,
    options: ConnectOptions,
}

impl Uploader<Ssh2Connector> {
    pub fn new(options: ConnectOptions) -> Self {
        Self::with_connector(Ssh2Connector, options)
    }
}

impl<C: Connector> Uploader<C> {
    pub fn with_connector(connector: C, options: ConnectOptions) -> Self {
        Self { connector, options }
    }

    /// 执行一次上传，失败时返回统一的 `UploadError`（原因可通过 `source()` 获取）
    pub fn upload(&self, request: TransferRequest) -> Result<(), UploadError> {
        // 本地前置条件不满足时不发起任何网络连接
        request.validate()?;

        let mut session = None;
        let mut channel = None;
        let result = self.run(&request, &mut session, &mut channel);
        teardown(channel, session);

        result.map_err(UploadError::from)
    }

    fn run(
        &self,
        request: &TransferRequest,
        session: &mut Option<C::Session>,
        channel: &mut Option<ChannelOf<C>>,
    ) -> Result<(), FailureCause> {
        debug!("Connecting to {}", request.address());
        let sess = session.insert(self.connector.connect(request, &self.options)?);

        debug!("Opening SFTP channel");
        let chan = channel.insert(sess.open_sftp()?);

        let mut local_file = File::open(&request.local_file)
            .map_err(|e| FailureCause::local_file(&request.local_file, e))?;
        let bytes = copy_to_remote(
            &mut local_file,
            &request.local_file,
            chan,
            &request.remote_path,
        )?;
        debug!("Wrote {} bytes to {}", bytes, request.remote_path);

        info!(
            "File uploaded successfully: {}",
            absolute_path(&request.local_file).display()
        );
        Ok(())
    }
}

/// 使用默认的 ssh2 连接器与默认选项（不校验主机密钥）上传
pub fn upload(request: TransferRequest) -> Result<(), UploadError> {
    Uploader::new(ConnectOptions::default()).upload(request)
}

/// 读错误归为本地文件错误，写错误归为传输错误
fn copy_to_remote<R: Read, T: SftpChannel>(
    local: &mut R,
    local_path: &Path,
    channel: &mut T,
    remote_path: &str,
) -> Result<u64, FailureCause> {
    let mut remote = channel
        .create(remote_path)
        .map_err(|e| FailureCause::transfer(remote_path, e))?;

    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let n = match local.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(FailureCause::local_file(local_path, e)),
        };
        remote
            .write_all(&buffer[..n])
            .map_err(|e| FailureCause::transfer(remote_path, e))?;
        total += n as u64;
    }
    remote
        .flush()
        .map_err(|e| FailureCause::transfer(remote_path, e))?;
    Ok(total)
}

/// 先断开通道，再断开会话；只处理仍处于连接状态的资源
fn teardown<S: RemoteSession>(channel: Option<S::Channel>, session: Option<S>) {
    if let Some(mut channel) = channel {
        if channel.is_connected() {
            if let Err(e) = channel.disconnect() {
                debug!("Ignoring SFTP channel disconnect failure: {}", e);
            }
        }
    }
    if let Some(mut session) = session {
        if session.is_connected() {
            if let Err(e) = session.disconnect() {
                debug!("Ignoring session disconnect failure: {}", e);
            }
        }
    }
}

fn absolute_path(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
