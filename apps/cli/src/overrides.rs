//! 配置加载与命令行覆盖
//!
//! 优先级：命令行 > 配置文件 > 默认值。

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use shed_bus::BackendType;
use shed_core::MonitorConfig;

/// 全局配置参数（可放在子命令前后）
#[derive(Args, Debug, Default, Clone)]
pub struct ConfigArgs {
    /// 配置文件路径（默认 ./shedmonitor.toml，不存在时使用默认值）
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// 数据目录（相对路径以当前目录为基准）
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// 读取次数，只保留最后一次
    #[arg(long, global = true, value_name = "N")]
    pub retries: Option<u32>,

    /// 每次读取后的暂停（秒）
    #[arg(long, global = true, value_name = "SECONDS", allow_negative_numbers = true)]
    pub sleep: Option<f64>,

    /// 传感器后端：auto | enviro | mock
    #[arg(long, global = true)]
    pub backend: Option<BackendType>,

    /// 启用显示器
    #[arg(long, global = true, overrides_with = "no_display")]
    pub display: bool,

    /// 禁用显示器
    #[arg(long, global = true, overrides_with = "display")]
    pub no_display: bool,
}

impl ConfigArgs {
    /// 加载配置文件，应用覆盖项并校验
    pub fn load(&self) -> Result<MonitorConfig> {
        let mut config = MonitorConfig::load(self.config.as_deref())
            .context("failed to load configuration")?;
        self.apply(&mut config)?;
        config.validate().context("invalid configuration")?;
        Ok(config)
    }

    fn apply(&self, config: &mut MonitorConfig) -> Result<()> {
        if let Some(ref dir) = self.data_dir {
            config.monitor.data_directory = std::path::absolute(dir)
                .with_context(|| format!("cannot resolve data directory {}", dir.display()))?;
        }
        if let Some(retries) = self.retries {
            config.sensors.read_retries = retries;
        }
        if let Some(sleep) = self.sleep {
            config.sensors.sensor_sleep_seconds = sleep;
        }
        if let Some(backend) = self.backend {
            config.sensors.backend = backend;
        }
        if self.display {
            config.display.enabled = true;
        }
        if self.no_display {
            config.display.enabled = false;
        }
        Ok(())
    }
}
