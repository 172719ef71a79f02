//! Builder 模式实现
//!
//! 提供链式构造 [`SensorBus`] 的便捷方式，在启动时根据配置或平台选择后端。

use std::path::PathBuf;

use tracing::{info, warn};

use crate::mock::{MockLight, MockWeather};
use crate::{BackendType, BusError, SensorBus};

/// 默认 I2C 设备
pub const DEFAULT_I2C_DEVICE: &str = "/dev/i2c-1";

/// SensorBus Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use shed_bus::{BackendType, SensorBusBuilder};
///
/// // 自动选择（Linux 上使用 I2C 硬件）
/// let bus = SensorBusBuilder::new().build().unwrap();
///
/// // 指定 I2C 设备
/// let bus = SensorBusBuilder::new()
///     .backend(BackendType::Enviro)
///     .i2c_device("/dev/i2c-0")
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct SensorBusBuilder {
    backend: BackendType,
    i2c_device: PathBuf,
}

impl SensorBusBuilder {
    pub fn new() -> Self {
        Self {
            backend: BackendType::Auto,
            i2c_device: PathBuf::from(DEFAULT_I2C_DEVICE),
        }
    }

    /// 显式指定后端（可选，默认 Auto）
    pub fn backend(mut self, backend: BackendType) -> Self {
        self.backend = backend;
        self
    }

    /// 设置 I2C 字符设备路径（仅 enviro 后端使用）
    pub fn i2c_device(mut self, device: impl Into<PathBuf>) -> Self {
        self.i2c_device = device.into();
        self
    }

    /// `Auto` 在当前平台上解析出的具体后端
    pub fn resolved_backend(&self) -> BackendType {
        match self.backend {
            BackendType::Auto => {
                if cfg!(target_os = "linux") {
                    BackendType::Enviro
                } else {
                    BackendType::Mock
                }
            },
            other => other,
        }
    }

    /// 打开传感器
    ///
    /// # 错误
    /// - `BusError::Unsupported`: 非 Linux 平台上显式请求 enviro
    /// - `BusError::Device`: I2C 设备不存在、无权限或芯片不匹配
    pub fn build(self) -> Result<SensorBus, BusError> {
        let backend = self.resolved_backend();
        if self.backend == BackendType::Auto && backend == BackendType::Mock {
            warn!("No sensor hardware support on this platform, falling back to mock sensors");
        }

        match backend {
            BackendType::Enviro => self.build_enviro(),
            _ => {
                info!("Using mock sensors");
                Ok(SensorBus::new(
                    Box::new(MockWeather::default()),
                    Box::new(MockLight::default()),
                    BackendType::Mock,
                ))
            },
        }
    }

    #[cfg(target_os = "linux")]
    fn build_enviro(self) -> Result<SensorBus, BusError> {
        use crate::enviro::{Bme280Weather, Ltr559Light};

        info!("Using Enviro sensors on {}", self.i2c_device.display());
        let weather = Bme280Weather::new(&self.i2c_device)?;
        let light = Ltr559Light::new(&self.i2c_device)?;
        Ok(SensorBus::new(
            Box::new(weather),
            Box::new(light),
            BackendType::Enviro,
        ))
    }

    #[cfg(not(target_os = "linux"))]
    fn build_enviro(self) -> Result<SensorBus, BusError> {
        Err(BusError::Unsupported(BackendType::Enviro))
    }
}

impl Default for SensorBusBuilder {
    fn default() -> Self {
        Self::new()
    }
}
