use crate::request::TransferRequest;
use crate::transport::ConnectOptions;
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// 默认配置文件名
pub const CONFIG_FILE_NAME: &str = "upload.toml";

/// 配置文件未指定端口时使用的 SSH 端口
pub const DEFAULT_PORT: u16 = 22;

/// 配置结构：SSH 连接参数与传输路径，所有字段都可由命令行覆盖
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub ssh: SshConfig,
    #[serde(default)]
    pub transfer: TransferConfig,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct SshConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// 超时秒数（可选）
    pub timeout_secs: Option<u64>,
    /// 是否校验主机密钥，缺省为 false
    pub verify_host_key: Option<bool>,
    /// known_hosts 路径，支持 `~/` 开头
    pub known_hosts: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct TransferConfig {
    /// 本地待上传文件
    pub local_file: Option<PathBuf>,
    /// 远端目标路径
    pub remote_path: Option<String>,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}

impl Config {
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 用另一份配置中已设置的字段覆盖当前值
    pub fn merge(&mut self, other: Config) {
        let Config { ssh, transfer } = other;
        override_with(&mut self.ssh.host, ssh.host);
        override_with(&mut self.ssh.port, ssh.port);
        override_with(&mut self.ssh.username, ssh.username);
        override_with(&mut self.ssh.password, ssh.password);
        override_with(&mut self.ssh.timeout_secs, ssh.timeout_secs);
        override_with(&mut self.ssh.verify_host_key, ssh.verify_host_key);
        override_with(&mut self.ssh.known_hosts, ssh.known_hosts);
        override_with(&mut self.transfer.local_file, transfer.local_file);
        override_with(&mut self.transfer.remote_path, transfer.remote_path);
    }

    /// 组装上传请求；端口缺省为 22，其余字段缺一不可
    pub fn to_request(&self) -> Result<TransferRequest, ConfigError> {
        Ok(TransferRequest {
            host: required(&self.ssh.host, "ssh.host")?,
            port: self.ssh.port.unwrap_or(DEFAULT_PORT),
            username: required(&self.ssh.username, "ssh.username")?,
            password: required(&self.ssh.password, "ssh.password")?,
            local_file: self
                .transfer
                .local_file
                .clone()
                .ok_or(ConfigError::Missing("transfer.local_file"))?,
            remote_path: required(&self.transfer.remote_path, "transfer.remote_path")?,
        })
    }

    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            verify_host_key: self.ssh.verify_host_key.unwrap_or(false),
            known_hosts: self.ssh.known_hosts.as_deref().map(expand_home),
            timeout: self.ssh.timeout_secs.map(Duration::from_secs),
        }
    }
}

fn override_with<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

fn required(value: &Option<String>, name: &'static str) -> Result<String, ConfigError> {
    value.clone().ok_or(ConfigError::Missing(name))
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// 加载配置：优先使用显式指定的路径，其次当前工作目录，再次可执行文件所在目录。
/// 都不存在时返回空配置，由命令行参数补全。
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    let Some(path) = path else {
        debug!("No {} found, using command line settings only", CONFIG_FILE_NAME);
        return Ok(Config::default());
    };

    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    debug!("Loaded config from {}", path.display());
    Config::from_toml(&content, &path)
}

fn find_config() -> Option<PathBuf> {
    let cwd_path = Path::new(CONFIG_FILE_NAME);
    if cwd_path.exists() {
        return Some(cwd_path.to_path_buf());
    }

    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.join(CONFIG_FILE_NAME)))
        .filter(|p| p.exists())
}
