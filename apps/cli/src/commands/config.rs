//! 配置管理命令
//!
//! 查看和校验生效的配置（默认值 + 配置文件 + 命令行覆盖）。

use anyhow::Result;
use clap::Subcommand;
use shed_bus::SensorBusBuilder;
use shed_core::MonitorConfig;

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 以 TOML 打印生效的配置
    Show,

    /// 校验配置并打印解析后的路径
    Check,
}

impl ConfigCommand {
    pub fn execute(&self, config: &MonitorConfig) -> Result<()> {
        match self {
            ConfigCommand::Show => Self::show_(config),
            ConfigCommand::Check => Self::check_(config),
        }
    }

    fn show_(config: &MonitorConfig) -> Result<()> {
        print!("{}", config.to_toml()?);
        Ok(())
    }

    fn check_(config: &MonitorConfig) -> Result<()> {
        // 配置在加载时已校验，这里只做展示
        let resolved = SensorBusBuilder::new().backend(config.sensors.backend).resolved_backend();

        println!("Configuration OK");
        println!("  data directory: {}", config.data_directory().display());
        println!("  log file:       {}", config.log_file().display());
        println!("  read retries:   {}", config.read_retries()?);
        println!("  sensor sleep:   {:?}", config.sensor_delay()?);
        println!("  backend:        {} (resolves to {})", config.sensors.backend, resolved);
        if config.display.enabled {
            println!("  display:        {}", config.display_device().display());
        } else {
            println!("  display:        disabled");
        }
        Ok(())
    }
}
