use crate::error::{BoxError, FailureCause};
use crate::request::TransferRequest;
use crate::sftp_client::Ssh2Channel;
use crate::transport::{ConnectOptions, Connector, RemoteSession};
use log::{debug, warn};
use ssh2::{CheckResult, DisconnectCode, KnownHostFileKind, Session};
use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;

/// 基于 libssh2 的连接器
#[derive(Debug, Clone, Copy, Default)]
pub struct Ssh2Connector;

/// 已认证的 SSH 会话，记录是否仍处于连接状态
pub struct Ssh2Session {
    session: Session,
    connected: bool,
}

impl Connector for Ssh2Connector {
    type Session = Ssh2Session;

    fn connect(
        &self,
        request: &TransferRequest,
        options: &ConnectOptions,
    ) -> Result<Ssh2Session, FailureCause> {
        connect_ssh(request, options)
    }
}

/// 建立 SSH 连接、按策略检查主机密钥并完成用户名/密码认证
pub fn connect_ssh(
    request: &TransferRequest,
    options: &ConnectOptions,
) -> Result<Ssh2Session, FailureCause> {
    let address = request.address();
    let stream = open_stream(&request.host, request.port, options.timeout)
        .map_err(|e| FailureCause::connection(&address, e))?;

    let mut session = Session::new().map_err(|e| FailureCause::connection(&address, e))?;
    if let Some(timeout) = options.timeout {
        session.set_timeout(timeout.as_millis().min(u32::MAX as u128) as u32);
    }
    session.set_tcp_stream(stream);
    session
        .handshake()
        .map_err(|e| FailureCause::connection(&address, e))?;
    debug!("SSH handshake completed with {}", address);

    // 握手之后的失败都要先断开会话，避免留下半开连接
    let mut sess = Ssh2Session {
        session,
        connected: true,
    };

    if options.verify_host_key {
        if let Err(e) = verify_host_key(&sess.session, request, options) {
            close_quietly(&mut sess);
            return Err(FailureCause::connection(&address, e));
        }
    } else {
        warn!("Host key verification is disabled for {}", address);
    }

    if let Err(e) = sess
        .session
        .userauth_password(&request.username, &request.password)
    {
        close_quietly(&mut sess);
        return Err(FailureCause::connection(&address, e));
    }
    if !sess.session.authenticated() {
        close_quietly(&mut sess);
        return Err(FailureCause::connection(
            &address,
            format!("authentication rejected for user {}", request.username),
        ));
    }

    debug!("Authenticated to {} as {}", address, request.username);
    Ok(sess)
}

fn open_stream(host: &str, port: u16, timeout: Option<Duration>) -> io::Result<TcpStream> {
    let Some(timeout) = timeout else {
        return TcpStream::connect((host, port));
    };

    let mut last_error = None;
    for addr in (host, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => {
                stream.set_read_timeout(Some(timeout))?;
                stream.set_write_timeout(Some(timeout))?;
                return Ok(stream);
            }
            Err(e) => last_error = Some(e),
        }
    }
    Err(last_error.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, format!("no address found for {}", host))
    }))
}

fn verify_host_key(
    session: &Session,
    request: &TransferRequest,
    options: &ConnectOptions,
) -> Result<(), BoxError> {
    let (key, _) = session
        .host_key()
        .ok_or("server did not present a host key")?;
    let path = known_hosts_path(options).ok_or("cannot locate known_hosts file")?;

    let mut known_hosts = session.known_hosts()?;
    known_hosts
        .read_file(&path, KnownHostFileKind::OpenSSH)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;

    host_key_verdict(
        known_hosts.check_port(&request.host, request.port, key),
        &request.host,
        request.port,
    )?;
    Ok(())
}

fn known_hosts_path(options: &ConnectOptions) -> Option<PathBuf> {
    options
        .known_hosts
        .clone()
        .or_else(|| dirs::home_dir().map(|home| home.join(".ssh").join("known_hosts")))
}

fn host_key_verdict(result: CheckResult, host: &str, port: u16) -> Result<(), String> {
    match result {
        CheckResult::Match => Ok(()),
        CheckResult::NotFound => Err(format!("host key for {}:{} is not in known_hosts", host, port)),
        CheckResult::Mismatch => Err(format!("host key for {}:{} does not match known_hosts", host, port)),
        CheckResult::Failure => Err(format!("failed to check host key for {}:{}", host, port)),
    }
}

/// 握手后出错时断开会话，断开失败只记录日志
fn close_quietly<S: RemoteSession>(sess: &mut S) {
    if let Err(e) = sess.disconnect() {
        debug!("Ignoring SSH disconnect failure: {}", e);
    }
}

impl RemoteSession for Ssh2Session {
    type Channel = Ssh2Channel;

    fn open_sftp(&mut self) -> Result<Ssh2Channel, FailureCause> {
        let sftp = self.session.sftp().map_err(FailureCause::channel)?;
        Ok(Ssh2Channel::new(sftp))
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn disconnect(&mut self) -> Result<(), BoxError> {
        self.connected = false;
        self.session
            .disconnect(Some(DisconnectCode::ByApplication), "upload finished", None)?;
        Ok(())
    }
}
