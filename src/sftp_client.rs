use crate::error::BoxError;
use crate::transport::SftpChannel;
use ssh2::{OpenFlags, OpenType, Sftp};
use std::io::Write;
use std::path::Path;

/// 远端文件权限
const REMOTE_FILE_MODE: i32 = 0o644;

/// 基于 libssh2 的 SFTP 通道
pub struct Ssh2Channel {
    sftp: Sftp,
    connected: bool,
}

impl Ssh2Channel {
    pub fn new(sftp: Sftp) -> Self {
        Self {
            sftp,
            connected: true,
        }
    }
}

impl SftpChannel for Ssh2Channel {
    /// 远端已有同名文件时直接截断覆盖，不创建中间目录
    fn create(&mut self, remote_path: &str) -> Result<Box<dyn Write + '_>, BoxError> {
        let flags = OpenFlags::CREATE | OpenFlags::WRITE | OpenFlags::TRUNCATE;
        let remote_file =
            self.sftp
                .open_mode(Path::new(remote_path), flags, REMOTE_FILE_MODE, OpenType::File)?;
        Ok(Box::new(remote_file))
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn disconnect(&mut self) -> Result<(), BoxError> {
        self.connected = false;
        self.sftp.shutdown()?;
        Ok(())
    }
}
