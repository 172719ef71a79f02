//! Enviro 扩展板 I2C 后端
//!
//! Raspberry Pi 上的 Enviro / Enviro+ 扩展板通过 I2C 总线挂载两个传感器：
//!
//! | 传感器 | 地址 | 指标 |
//! |--------|------|------|
//! | BME280 | 0x76 | 温度 / 气压 / 湿度 |
//! | LTR559 | 0x23 | 环境光 / 接近 |
//!
//! ## 依赖
//!
//! - `linux-embedded-hal` (I2C 字符设备，如 `/dev/i2c-1`)
//! - `bme280` crate
//! - LTR559 寄存器驱动在本模块内实现（基于 `embedded-hal` 1.0 `I2c` trait）
//!
//! ## 限制
//!
//! - **仅限 Linux 平台**
//! - **权限要求**：需要 `i2c` 组权限或 `sudo`
//! - 两个传感器各自打开一次 I2C 设备，互不共享句柄

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use linux_embedded_hal::I2cdev;
use tracing::debug;

use crate::{BusDeviceError, BusDeviceErrorKind, BusError};

mod light;
mod weather;

pub use light::Ltr559Light;
pub use weather::Bme280Weather;

/// 打开 I2C 字符设备
///
/// 设备节点不存在时返回 `NotFound`，便于和权限问题区分。
pub(crate) fn open_i2c(device: &Path) -> Result<I2cdev, BusError> {
    match fs::metadata(device) {
        Ok(_) => {},
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(BusError::Device(BusDeviceError::new(
                BusDeviceErrorKind::NotFound,
                format!(
                    "I2C device {} not found (is the I2C interface enabled?)",
                    device.display()
                ),
            )));
        },
        Err(e) => return Err(e.into()),
    }

    debug!("Opening I2C device {}", device.display());
    I2cdev::new(device).map_err(|e| {
        BusError::Device(BusDeviceError::new(
            BusDeviceErrorKind::AccessDenied,
            format!("failed to open {}: {}", device.display(), e),
        ))
    })
}

/// 将 I2C 传输错误映射为统一的设备错误
pub(crate) fn transfer_error(context: &str, err: impl fmt::Debug) -> BusError {
    BusError::Device(BusDeviceError::new(
        BusDeviceErrorKind::Transfer,
        format!("{context}: {err:?}"),
    ))
}

/// `f32` 读数扩展为 `f64`
///
/// 经由最短十进制表示转换，`21.7f32` 得到 `21.7` 而不是 `21.700000762939453`，
/// 与历史 CSV 中的取值一致。
pub(crate) fn widen(value: f32) -> f64 {
    value.to_string().parse::<f64>().unwrap_or(f64::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widen_keeps_short_decimal() {
        assert_eq!(widen(21.7), 21.7);
        assert_eq!(widen(1013.1), 1013.1);
        assert_eq!(widen(0.0), 0.0);
        assert!(widen(f32::NAN).is_nan());
    }

    #[test]
    fn test_open_missing_device() {
        let err = open_i2c(Path::new("/dev/i2c-does-not-exist"))
            .err()
            .expect("opening a missing device should fail");
        match err {
            BusError::Device(e) => {
                assert_eq!(e.kind, BusDeviceErrorKind::NotFound);
                assert!(e.is_fatal());
            },
            other => panic!("Expected Device error, got {other:?}"),
        }
    }
}
