//! # Shed Bus Sensor Layer
//!
//! 传感器总线抽象层，为上层提供统一的环境传感器接口。
//!
//! Enviro 扩展板上有两个独立的传感器：
//! - **WeatherSensor**: 温度 / 气压 / 湿度（BME280）
//! - **LightSensor**: 环境光 / 接近（LTR559）
//!
//! 上层只依赖这两个 trait，具体实现由 [`SensorBusBuilder`] 在启动时选择：
//! - Linux: `enviro` 后端（I2C 字符设备）
//! - 其他平台 / 测试: `mock` 后端

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod builder;
pub mod mock;

#[cfg(target_os = "linux")]
pub mod enviro;

pub use builder::{DEFAULT_I2C_DEVICE, SensorBusBuilder};
pub use mock::{MockLight, MockWeather, ReadLog};

#[cfg(target_os = "linux")]
pub use enviro::{Bme280Weather, Ltr559Light};

/// 传感器总线统一错误类型
#[derive(Error, Debug)]
pub enum BusError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Device Error: {0}")]
    Device(#[from] BusDeviceError),
    #[error("Sensor not initialized")]
    NotInitialized,
    #[error("Backend unavailable on this platform: {0}")]
    Unsupported(BackendType),
}

/// 设备/后端错误的结构化分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusDeviceErrorKind {
    Unknown,
    NotFound,
    AccessDenied,
    /// 芯片 ID 与预期不符
    WrongChip,
    /// I2C 传输失败（NACK、仲裁丢失等）
    Transfer,
    /// 测量结果无效
    InvalidData,
}

/// 结构化设备错误
#[derive(Error, Debug, Clone)]
#[error("{kind:?}: {message}")]
pub struct BusDeviceError {
    pub kind: BusDeviceErrorKind,
    pub message: String,
}

impl BusDeviceError {
    pub fn new(kind: BusDeviceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// 硬件不存在或无权限，重试没有意义
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind,
            BusDeviceErrorKind::NotFound
                | BusDeviceErrorKind::AccessDenied
                | BusDeviceErrorKind::WrongChip
        )
    }
}

impl BusError {
    /// 重试也无法恢复的错误：硬件缺失、无权限、芯片不符或平台不支持
    ///
    /// 传输失败等瞬时错误返回 `false`，下一次定时运行可能成功。
    pub fn is_fatal(&self) -> bool {
        match self {
            BusError::Device(e) => e.is_fatal(),
            BusError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied
            ),
            BusError::Unsupported(_) => true,
            BusError::NotInitialized => false,
        }
    }
}

/// 温度 / 气压 / 湿度传感器
pub trait WeatherSensor {
    /// 温度（°C）
    fn temperature(&mut self) -> Result<f64, BusError>;
    /// 气压（hPa）
    fn pressure(&mut self) -> Result<f64, BusError>;
    /// 相对湿度（%RH）
    fn humidity(&mut self) -> Result<f64, BusError>;
}

/// 环境光 / 接近传感器
pub trait LightSensor {
    /// 环境光照度（lux）
    fn lux(&mut self) -> Result<f64, BusError>;
    /// 接近原始计数（无单位）
    fn proximity(&mut self) -> Result<f64, BusError>;
}

impl<T: WeatherSensor + ?Sized> WeatherSensor for Box<T> {
    fn temperature(&mut self) -> Result<f64, BusError> {
        (**self).temperature()
    }
    fn pressure(&mut self) -> Result<f64, BusError> {
        (**self).pressure()
    }
    fn humidity(&mut self) -> Result<f64, BusError> {
        (**self).humidity()
    }
}

impl<T: LightSensor + ?Sized> LightSensor for Box<T> {
    fn lux(&mut self) -> Result<f64, BusError> {
        (**self).lux()
    }
    fn proximity(&mut self) -> Result<f64, BusError> {
        (**self).proximity()
    }
}

/// 一组已打开的传感器句柄
///
/// 由 [`SensorBusBuilder::build`] 返回，拥有两个传感器的独占访问权。
pub struct SensorBus {
    pub weather: Box<dyn WeatherSensor>,
    pub light: Box<dyn LightSensor>,
    backend: BackendType,
}

impl SensorBus {
    pub fn new(
        weather: Box<dyn WeatherSensor>,
        light: Box<dyn LightSensor>,
        backend: BackendType,
    ) -> Self {
        Self {
            weather,
            light,
            backend,
        }
    }

    /// 实际使用的后端（`Auto` 已被解析）
    pub fn backend(&self) -> BackendType {
        self.backend
    }

    /// 拆分为两个独立句柄
    pub fn into_parts(self) -> (Box<dyn WeatherSensor>, Box<dyn LightSensor>) {
        (self.weather, self.light)
    }
}

impl fmt::Debug for SensorBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensorBus").field("backend", &self.backend).finish_non_exhaustive()
    }
}

/// 后端类型选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// 自动探测（默认）
    /// - Linux: enviro
    /// - 其他平台: mock
    #[default]
    Auto,
    /// 强制使用 I2C 硬件（仅 Linux）
    Enviro,
    /// 脚本化的模拟传感器
    Mock,
}

impl BackendType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendType::Auto => "auto",
            BackendType::Enviro => "enviro",
            BackendType::Mock => "mock",
        }
    }
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(BackendType::Auto),
            "enviro" => Ok(BackendType::Enviro),
            "mock" => Ok(BackendType::Mock),
            other => Err(format!("unknown sensor backend '{other}' (expected auto, enviro or mock)")),
        }
    }
}
