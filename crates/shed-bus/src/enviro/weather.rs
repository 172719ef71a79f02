//! BME280 温湿压传感器适配器

use std::path::Path;

use bme280::i2c::BME280;
use linux_embedded_hal::{Delay, I2cdev};
use tracing::{debug, info};

use super::{open_i2c, transfer_error, widen};
use crate::{BusError, WeatherSensor};

/// BME280 适配器
///
/// 每次读取单个指标都会触发一次完整的强制测量，和厂商驱动的行为一致：
/// 读取循环中的三次调用得到的是三次独立测量。
pub struct Bme280Weather {
    sensor: BME280<I2cdev>,
    delay: Delay,
}

impl Bme280Weather {
    /// 打开 I2C 设备并初始化 BME280（主地址 0x76）
    pub fn new(device: &Path) -> Result<Self, BusError> {
        let i2c = open_i2c(device)?;
        let mut sensor = BME280::new_primary(i2c);
        let mut delay = Delay;

        sensor.init(&mut delay).map_err(|e| transfer_error("BME280 init failed", e))?;
        info!("BME280 initialized on {}", device.display());

        Ok(Self { sensor, delay })
    }

    fn measure(&mut self) -> Result<(f32, f32, f32), BusError> {
        let m = self
            .sensor
            .measure(&mut self.delay)
            .map_err(|e| transfer_error("BME280 measurement failed", e))?;
        debug!(
            "BME280 raw: {} °C, {} Pa, {} %RH",
            m.temperature, m.pressure, m.humidity
        );
        Ok((m.temperature, m.pressure, m.humidity))
    }
}

impl WeatherSensor for Bme280Weather {
    fn temperature(&mut self) -> Result<f64, BusError> {
        let (temperature, _, _) = self.measure()?;
        Ok(widen(temperature))
    }

    fn pressure(&mut self) -> Result<f64, BusError> {
        let (_, pascal, _) = self.measure()?;
        // Pa -> hPa
        Ok(widen(pascal / 100.0))
    }

    fn humidity(&mut self) -> Result<f64, BusError> {
        let (_, _, humidity) = self.measure()?;
        Ok(widen(humidity))
    }
}
