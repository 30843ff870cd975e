use chrono::Local;
use log::LevelFilter;
use std::io::Write;

/// 初始化日志：时间 + 级别；`RUST_LOG` 优先于 verbose 开关
pub fn init_logger(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let _ = env_logger::Builder::new()
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%d %H:%M:%S");
            writeln!(buf, "{} {} - {}", ts, record.level(), record.args())
        })
        .filter_level(level)
        .parse_default_env()
        .try_init();
}
