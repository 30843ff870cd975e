use clap::{Args, Parser, Subcommand};
use log::info;
use sftp_upload::config::{self, Config, SshConfig, TransferConfig};
use sftp_upload::error::error_chain;
use sftp_upload::{logger, Uploader};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sftp-upload", version, about = "Upload a single file over SFTP (defaults to 'upload')")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    settings: Settings,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload the configured file
    Upload,
    /// Load and validate the settings without connecting
    Check,
}

/// 命令行参数，优先于配置文件
#[derive(Args)]
struct Settings {
    /// Path to upload.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    host: Option<String>,
    #[arg(long, global = true)]
    port: Option<u16>,
    #[arg(short, long, global = true)]
    username: Option<String>,
    #[arg(long, env = "SFTP_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,
    #[arg(long, global = true)]
    local_file: Option<PathBuf>,
    #[arg(long, global = true)]
    remote_path: Option<String>,
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    /// Check the server key against known_hosts (disabled by default)
    #[arg(long, global = true)]
    verify_host_key: bool,
    #[arg(long, global = true)]
    known_hosts: Option<String>,
}

impl Settings {
    fn to_config(&self) -> Config {
        Config {
            ssh: SshConfig {
                host: self.host.clone(),
                port: self.port,
                username: self.username.clone(),
                password: self.password.clone(),
                timeout_secs: self.timeout_secs,
                verify_host_key: self.verify_host_key.then_some(true),
                known_hosts: self.known_hosts.clone(),
            },
            transfer: TransferConfig {
                local_file: self.local_file.clone(),
                remote_path: self.remote_path.clone(),
            },
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // 初始化日志
    logger::init_logger(cli.verbose);

    // 加载配置并合并命令行参数
    let mut cfg = config::load_config(cli.settings.config.as_deref()).unwrap_or_else(|e| {
        eprintln!("加载配置失败: {}", e);
        std::process::exit(1);
    });
    cfg.merge(cli.settings.to_config());

    let request = cfg.to_request().unwrap_or_else(|e| {
        eprintln!("配置不完整: {}", e);
        std::process::exit(1);
    });

    match cli.command.unwrap_or(Commands::Upload) {
        Commands::Upload => {
            let uploader = Uploader::new(cfg.connect_options());
            if let Err(e) = uploader.upload(request) {
                eprintln!("{}", error_chain(&e));
                std::process::exit(1);
            }
        }
        Commands::Check => {
            if let Err(e) = request.validate() {
                eprintln!("{}", error_chain(&e));
                std::process::exit(1);
            }
            info!(
                "配置检查通过: {} -> {}:{}",
                request.local_file.display(),
                request.address(),
                request.remote_path
            );
        }
    }
}
