use crate::error::FailureCause;
use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

/// 一次上传所需的全部参数，每次调用新建，不提供任何默认值
#[derive(Clone)]
pub struct TransferRequest {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub local_file: PathBuf,
    pub remote_path: String,
}

impl TransferRequest {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
        local_file: impl Into<PathBuf>,
        remote_path: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
            local_file: local_file.into(),
            remote_path: remote_path.into(),
        }
    }

    /// `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 在任何网络操作之前检查参数与本地文件
    pub fn validate(&self) -> Result<(), FailureCause> {
        if self.host.trim().is_empty() {
            return Err(FailureCause::invalid_request("host", "must not be empty"));
        }
        if self.port == 0 {
            return Err(FailureCause::invalid_request("port", "must be between 1 and 65535"));
        }
        if self.username.is_empty() {
            return Err(FailureCause::invalid_request("username", "must not be empty"));
        }
        if self.remote_path.trim().is_empty() {
            return Err(FailureCause::invalid_request("remote_path", "must not be empty"));
        }
        check_local_file(&self.local_file)
    }
}

fn check_local_file(path: &Path) -> Result<(), FailureCause> {
    let metadata = fs::metadata(path).map_err(|e| FailureCause::local_file(path, e))?;
    if !metadata.is_file() {
        return Err(FailureCause::local_file(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
        ));
    }
    // 只读打开一次，确认当前用户可读；句柄立即释放
    File::open(path).map_err(|e| FailureCause::local_file(path, e))?;
    Ok(())
}

// 密码不出现在日志和调试输出中
impl fmt::Debug for TransferRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferRequest")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("local_file", &self.local_file)
            .field("remote_path", &self.remote_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Write;

    fn request_for(local_file: &Path) -> TransferRequest {
        TransferRequest::new("test-host", 22, "u", "p", local_file, "/incoming/a.jar")
    }

    #[test]
    fn test_valid_request_passes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"0123456789").unwrap();

        assert!(request_for(file.path()).validate().is_ok());
    }

    #[test]
    fn test_missing_local_file_is_local_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.jar");

        let err = request_for(&missing).validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LocalFile);
    }

    #[test]
    fn test_directory_is_rejected_as_local_file() {
        let dir = tempfile::tempdir().unwrap();

        let err = request_for(dir.path()).validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LocalFile);
    }

    #[test]
    fn test_empty_fields_are_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();

        let mut request = request_for(file.path());
        request.host = "  ".to_string();
        assert_eq!(request.validate().unwrap_err().kind(), ErrorKind::InvalidRequest);

        let mut request = request_for(file.path());
        request.username.clear();
        assert_eq!(request.validate().unwrap_err().kind(), ErrorKind::InvalidRequest);

        let mut request = request_for(file.path());
        request.port = 0;
        assert_eq!(request.validate().unwrap_err().kind(), ErrorKind::InvalidRequest);

        let mut request = request_for(file.path());
        request.remote_path.clear();
        assert_eq!(request.validate().unwrap_err().kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_debug_redacts_password() {
        let request = TransferRequest::new("h", 22, "u", "hunter2", "/tmp/a.jar", "/a.jar");
        let rendered = format!("{:?}", request);

        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("***"));
        assert_eq!(request.address(), "h:22");
    }
}
