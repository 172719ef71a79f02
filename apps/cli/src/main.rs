//! # Shed Monitor
//!
//! 定时采集环境传感器读数并追加到每日 CSV 文件。
//!
//! 每次调用完成一次采集后退出，通常由 cron 驱动：
//!
//! ```bash
//! # 每 15 分钟采集一次
//! */15 * * * * cd /opt/shedmonitor && ./shedmonitor
//!
//! # 在没有传感器的机器上演练
//! shedmonitor --backend mock --sleep 0 run --print
//!
//! # 查看生效的配置
//! shedmonitor --retries 3 config show
//! ```
//!
//! 传感器或存储失败只记录到日志，进程仍以 0 退出；
//! 只有配置或启动错误才返回非零退出码。

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

mod commands;
mod logging;
mod overrides;

use commands::{ConfigCommand, RunCommand};
use overrides::ConfigArgs;

/// Shed Monitor - 环境传感器采集工具
#[derive(Parser, Debug)]
#[command(name = "shedmonitor")]
#[command(about = "Collect one round of sensor readings into a daily CSV file", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 执行一次采集（默认）
    Run {
        #[command(flatten)]
        args: RunCommand,
    },

    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config.load()?;

    match cli.command {
        Some(Commands::Config(cmd)) => cmd.execute(&config),

        Some(Commands::Run { args }) => run(args, &config),

        None => run(RunCommand::default(), &config),
    }
}

fn run(args: RunCommand, config: &shed_core::MonitorConfig) -> Result<()> {
    logging::init(config)?;
    info!("Starting shedmonitor");
    args.execute(config)
}
