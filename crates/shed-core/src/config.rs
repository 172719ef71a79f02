//! 运行配置
//!
//! 启动时加载一次，之后以只读引用传递。文件格式为 TOML，所有键都可省略：
//!
//! ```toml
//! [monitor]
//! data_directory = "data"
//! log_file = "shedmonitor.log"
//! log_level = "debug"
//!
//! [sensors]
//! sensor_sleep_seconds = 1.0
//! read_retries = 2
//! backend = "auto"          # auto | enviro | mock
//! i2c_device = "/dev/i2c-1"
//!
//! [display]
//! enabled = false
//! device = "/dev/tty1"
//! ```
//!
//! 相对路径以配置文件所在目录（安装根目录）为基准解析。

use std::fs;
use std::io;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shed_bus::{BackendType, DEFAULT_I2C_DEVICE};
use tracing::level_filters::LevelFilter;

use crate::error::ConfigError;

/// 默认配置文件（当前目录）
pub const DEFAULT_CONFIG_FILE: &str = "shedmonitor.toml";

/// `[monitor]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorSection {
    /// 每日 CSV 所在目录
    pub data_directory: PathBuf,
    /// 日志文件
    pub log_file: PathBuf,
    /// 日志级别（`RUST_LOG` 优先）
    pub log_level: String,
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            data_directory: PathBuf::from("data"),
            log_file: PathBuf::from("shedmonitor.log"),
            log_level: "debug".to_string(),
        }
    }
}

/// `[sensors]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SensorsSection {
    /// 每次读取后的暂停（秒）
    pub sensor_sleep_seconds: f64,
    /// 读取次数，只保留最后一次
    pub read_retries: u32,
    pub backend: BackendType,
    pub i2c_device: PathBuf,
}

impl Default for SensorsSection {
    fn default() -> Self {
        Self {
            sensor_sleep_seconds: 1.0,
            read_retries: 2,
            backend: BackendType::Auto,
            i2c_device: PathBuf::from(DEFAULT_I2C_DEVICE),
        }
    }
}

/// `[display]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplaySection {
    pub enabled: bool,
    pub device: PathBuf,
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            enabled: false,
            device: PathBuf::from("/dev/tty1"),
        }
    }
}

/// 完整配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    pub monitor: MonitorSection,
    pub sensors: SensorsSection,
    pub display: DisplaySection,

    /// 安装根目录（空路径表示当前目录）
    #[serde(skip)]
    root: PathBuf,
}

impl MonitorConfig {
    /// 加载配置文件
    ///
    /// - `None`: 读取当前目录下的 `shedmonitor.toml`，不存在时使用全部默认值
    /// - `Some(path)`: 文件必须存在
    ///
    /// 加载后立即校验。
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let explicit = path.is_some();
        let path = path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), Path::to_path_buf);

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if explicit {
                    return Err(ConfigError::NotFound(path));
                }
                return Ok(Self::default());
            },
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        let config = Self::from_toml_str(&content)
            .map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?
            .with_root(path.parent().unwrap_or_else(|| Path::new("")));
        config.validate()?;
        Ok(config)
    }

    /// 解析 TOML 文本（不校验，根目录为当前目录）
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 设置安装根目录
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 校验取值
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.read_retries()?;
        self.sensor_delay()?;
        LevelFilter::from_str(&self.monitor.log_level).map_err(|_| {
            ConfigError::Invalid(format!(
                "log_level must be one of off, error, warn, info, debug, trace (got {:?})",
                self.monitor.log_level
            ))
        })?;
        Ok(())
    }

    /// 读取次数（至少 1）
    pub fn read_retries(&self) -> Result<NonZeroU32, ConfigError> {
        NonZeroU32::new(self.sensors.read_retries)
            .ok_or_else(|| ConfigError::Invalid("read_retries must be at least 1".to_string()))
    }

    /// 每次读取后的暂停
    ///
    /// 负数、NaN、无穷大都会被拒绝，不做截断。
    pub fn sensor_delay(&self) -> Result<Duration, ConfigError> {
        let seconds = self.sensors.sensor_sleep_seconds;
        Duration::try_from_secs_f64(seconds).map_err(|_| {
            ConfigError::Invalid(format!(
                "sensor_sleep_seconds must be a finite, non-negative number (got {seconds})"
            ))
        })
    }

    /// 解析后的数据目录
    pub fn data_directory(&self) -> PathBuf {
        self.resolve(&self.monitor.data_directory)
    }

    /// 解析后的日志文件路径
    pub fn log_file(&self) -> PathBuf {
        self.resolve(&self.monitor.log_file)
    }

    pub fn display_device(&self) -> PathBuf {
        self.resolve(&self.display.device)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// 序列化为 TOML（`config show` 使用）
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
