//! 日志初始化
//!
//! 日志追加到配置的单个文件中（不轮转），格式为本地时间 + 级别 + 消息。
//! 文件无法打开时退回到 stderr。`RUST_LOG` 优先于配置中的 `log_level`。

use std::path::Path;

use anyhow::{Result, anyhow};
use shed_core::MonitorConfig;
use tracing::warn;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// 默认过滤规则：本项目三个 crate 使用同一级别
fn default_directives(level: &str) -> String {
    format!("shedmonitor={level},shed_core={level},shed_bus={level}")
}

fn open_log_file(path: &Path) -> Result<RollingFileAppender> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("invalid log file name: {}", path.display()))?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(directory)
        .map_err(|e| anyhow!("cannot open log file {}: {}", path.display(), e))
}

/// 安装全局 subscriber（每个进程一次）
pub fn init(config: &MonitorConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.monitor.log_level)));

    let log_path = config.log_file();
    let (writer, fallback) = match open_log_file(&log_path) {
        Ok(appender) => (BoxMakeWriter::new(appender), None),
        Err(e) => (BoxMakeWriter::new(std::io::stderr), Some(e)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
        .with_ansi(false)
        .with_writer(writer)
        .try_init()
        .map_err(|e| anyhow!("failed to install logger: {e}"))?;

    if let Some(e) = fallback {
        warn!("{e}; logging to stderr instead");
    }
    Ok(())
}
