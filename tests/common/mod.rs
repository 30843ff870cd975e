//! 内存中的 SFTP 服务端替身，用于在没有真实服务器的情况下验证上传流程。

#![allow(dead_code)]

use sftp_upload::{BoxError, ConnectOptions, Connector, FailureCause, RemoteSession, SftpChannel, TransferRequest};
use std::collections::{HashMap, HashSet};
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct ServerState {
    pub files: HashMap<String, Vec<u8>>,
    pub directories: HashSet<String>,
    pub events: Vec<String>,
    pub session_connected: bool,
    pub channel_connected: bool,
    pub open_handles: usize,
}

/// 可配置故障的服务端
#[derive(Clone)]
pub struct MockServer {
    state: Arc<Mutex<ServerState>>,
    username: String,
    password: String,
    pub refuse_connections: bool,
    pub fail_channel: bool,
    pub fail_disconnect: bool,
    /// 单个文件允许写入的最大字节数，超出时报磁盘已满
    pub max_file_size: Option<usize>,
}

impl MockServer {
    pub fn new(username: &str, password: &str) -> Self {
        let mut state = ServerState::default();
        state.directories.insert("/".to_string());
        state.directories.insert(".".to_string());
        Self {
            state: Arc::new(Mutex::new(state)),
            username: username.to_string(),
            password: password.to_string(),
            refuse_connections: false,
            fail_channel: false,
            fail_disconnect: false,
            max_file_size: None,
        }
    }

    pub fn with_directory(self, dir: &str) -> Self {
        self.state().directories.insert(dir.to_string());
        self
    }

    pub fn state(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap()
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.state().files.get(path).cloned()
    }

    pub fn events(&self) -> Vec<String> {
        self.state().events.clone()
    }

    pub fn connect_attempts(&self) -> usize {
        self.events().iter().filter(|e| *e == "connect").count()
    }
}

fn parent_of(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some(("", _)) => "/",
        Some((parent, _)) => parent,
        None => ".",
    }
}

impl Connector for MockServer {
    type Session = MockSession;

    fn connect(
        &self,
        request: &TransferRequest,
        _options: &ConnectOptions,
    ) -> Result<MockSession, FailureCause> {
        let mut state = self.state();
        state.events.push("connect".to_string());

        if self.refuse_connections {
            return Err(FailureCause::connection(
                &request.address(),
                io::Error::new(io::ErrorKind::ConnectionRefused, "Connection refused"),
            ));
        }

        // 握手成功后认证失败：会话先断开再返回错误
        state.session_connected = true;
        if request.username != self.username || request.password != self.password {
            state.session_connected = false;
            state.events.push("session:disconnect".to_string());
            return Err(FailureCause::connection(
                &request.address(),
                format!("authentication rejected for user {}", request.username),
            ));
        }

        Ok(MockSession {
            server: self.clone(),
            connected: true,
        })
    }
}

pub struct MockSession {
    server: MockServer,
    connected: bool,
}

impl RemoteSession for MockSession {
    type Channel = MockChannel;

    fn open_sftp(&mut self) -> Result<MockChannel, FailureCause> {
        let mut state = self.server.state();
        state.events.push("open_sftp".to_string());
        if self.server.fail_channel {
            return Err(FailureCause::channel("subsystem request failed"));
        }
        state.channel_connected = true;
        Ok(MockChannel {
            server: self.server.clone(),
            connected: true,
        })
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn disconnect(&mut self) -> Result<(), BoxError> {
        self.connected = false;
        let mut state = self.server.state();
        state.session_connected = false;
        state.events.push("session:disconnect".to_string());
        if self.server.fail_disconnect {
            return Err("socket already closed".into());
        }
        Ok(())
    }
}

pub struct MockChannel {
    server: MockServer,
    connected: bool,
}

impl SftpChannel for MockChannel {
    fn create(&mut self, remote_path: &str) -> Result<Box<dyn Write + '_>, BoxError> {
        let mut state = self.server.state();
        state.events.push(format!("create {}", remote_path));
        if !state.directories.contains(parent_of(remote_path)) {
            return Err("No such file".into());
        }
        state.files.insert(remote_path.to_string(), Vec::new());
        state.open_handles += 1;
        Ok(Box::new(RemoteFile {
            server: self.server.clone(),
            path: remote_path.to_string(),
        }))
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn disconnect(&mut self) -> Result<(), BoxError> {
        self.connected = false;
        let mut state = self.server.state();
        state.channel_connected = false;
        state.events.push("channel:disconnect".to_string());
        if self.server.fail_disconnect {
            return Err("channel already closed".into());
        }
        Ok(())
    }
}

struct RemoteFile {
    server: MockServer,
    path: String,
}

impl Write for RemoteFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let limit = self.server.max_file_size;
        let mut state = self.server.state();
        let file = state.files.entry(self.path.clone()).or_default();
        if let Some(limit) = limit {
            if file.len() + buf.len() > limit {
                return Err(io::Error::new(io::ErrorKind::Other, "No space left on device"));
            }
        }
        file.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for RemoteFile {
    fn drop(&mut self) {
        self.server.state().open_handles -= 1;
    }
}
