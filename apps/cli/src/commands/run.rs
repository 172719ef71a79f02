//! run 命令
//!
//! 打开传感器，执行一次 读取 → 写入 → 显示。

use std::fs::OpenOptions;

use anyhow::Result;
use clap::Args;
use shed_bus::{BusError, SensorBusBuilder};
use shed_core::{
    DailyStore, DisplaySink, MonitorConfig, RunOrchestrator, RunOutcome, SensorReader,
    SystemClock, TextPanel,
};
use tracing::{error, info, warn};

/// 采集命令参数
#[derive(Args, Debug, Default)]
pub struct RunCommand {
    /// 把写入的记录行打印到标准输出
    #[arg(long)]
    pub print: bool,
}

impl RunCommand {
    /// 执行一次采集
    ///
    /// 传感器与存储失败只记录日志，返回 `Ok`。
    pub fn execute(&self, config: &MonitorConfig) -> Result<()> {
        let retries = config.read_retries()?;
        let delay = config.sensor_delay()?;

        let bus = match SensorBusBuilder::new()
            .backend(config.sensors.backend)
            .i2c_device(&config.sensors.i2c_device)
            .build()
        {
            Ok(bus) => bus,
            Err(e) => {
                error!("{}", bus_failure_message(&e));
                return Ok(());
            },
        };
        info!("Sensor backend: {}", bus.backend());

        let (weather, light) = bus.into_parts();
        let reader = SensorReader::new(weather, light).retries(retries).delay(delay);
        let store = DailyStore::new(config.data_directory());

        let mut orchestrator = RunOrchestrator::new(reader, store, SystemClock);
        if let Some(display) = open_display(config) {
            orchestrator = orchestrator.with_display(display);
        }

        match orchestrator.run() {
            RunOutcome::Done { path, sample } => {
                info!("Run complete: {}", path.display());
                if self.print {
                    println!("{}", sample.to_csv_row());
                }
            },
            RunOutcome::Aborted(reason) => {
                info!("Run aborted: {}", reason);
            },
        }
        Ok(())
    }
}

/// 打开传感器失败时的日志内容
///
/// 区分缺少硬件（下一次运行也会失败）和总线瞬时错误。
fn bus_failure_message(err: &BusError) -> String {
    if err.is_fatal() {
        format!("No sensor hardware available, no data written: {}", err)
    } else {
        format!("Sensor bus error, no data written (will retry next run): {}", err)
    }
}

/// 按配置打开显示设备；不可用时只告警
fn open_display(config: &MonitorConfig) -> Option<Box<dyn DisplaySink>> {
    if !config.display.enabled {
        return None;
    }

    let device = config.display_device();
    match OpenOptions::new().write(true).open(&device) {
        Ok(file) => {
            info!("Display attached on {}", device.display());
            Some(Box::new(TextPanel::new(file).clear_screen(true)))
        },
        Err(e) => {
            warn!("Display {} unavailable: {}", device.display(), e);
            None
        },
    }
}
