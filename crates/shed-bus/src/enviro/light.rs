//! LTR559 环境光 / 接近传感器驱动
//!
//! 寄存器级实现，基于 `embedded-hal` 1.0 的 `I2c` trait，
//! 初始化参数与 Enviro 扩展板的厂商驱动保持一致：
//!
//! - ALS: 增益 4x，积分时间 50 ms，重复周期 50 ms
//! - PS: 激活，LED 50 mA / 占空比 100% / 30 kHz，单脉冲，测量周期 50 ms

use embedded_hal::i2c::I2c;
use linux_embedded_hal::I2cdev;
use std::path::Path;
use tracing::{debug, info};

use super::{open_i2c, transfer_error};
use crate::{BusDeviceError, BusDeviceErrorKind, BusError, LightSensor};

pub const I2C_ADDR: u8 = 0x23;
/// PART_ID 寄存器的期望值（part number 0x9, revision 0x2）
pub const PART_ID: u8 = 0x92;

mod reg {
    pub const ALS_CONTROL: u8 = 0x80;
    pub const PS_CONTROL: u8 = 0x81;
    pub const PS_LED: u8 = 0x82;
    pub const PS_N_PULSES: u8 = 0x83;
    pub const PS_MEAS_RATE: u8 = 0x84;
    pub const ALS_MEAS_RATE: u8 = 0x85;
    pub const PART_ID: u8 = 0x86;
    /// CH1 低、CH1 高、CH0 低、CH0 高，连续 4 字节
    pub const ALS_DATA: u8 = 0x88;
    /// PS 低字节、高字节（低 3 位有效）
    pub const PS_DATA: u8 = 0x8D;
}

/// ALS 增益倍数
const ALS_GAIN: f64 = 4.0;
/// ALS 积分时间（ms）
const ALS_INTEGRATION_MS: f64 = 50.0;

/// ALS_CONTROL: gain=4 (0b010 << 2) | active
const ALS_CONTROL_ACTIVE_GAIN4: u8 = 0b010 << 2 | 0b1;
/// PS_CONTROL: active (0b11)
const PS_CONTROL_ACTIVE: u8 = 0b11;
/// PS_LED: 30 kHz (0b000 << 5) | duty 1.0 (0b11 << 3) | 50 mA (0b011)
const PS_LED_DEFAULT: u8 = 0b11 << 3 | 0b011;
/// ALS_MEAS_RATE: integration 50 ms (0b001 << 3) | repeat 50 ms (0b000)
const ALS_MEAS_RATE_DEFAULT: u8 = 0b001 << 3;
/// PS_MEAS_RATE: 50 ms
const PS_MEAS_RATE_DEFAULT: u8 = 0b0000;

/// 厂商给出的分段系数，按 CH1 占比选择
const CH0_COEFF: [f64; 4] = [17743.0, 42785.0, 5926.0, 0.0];
const CH1_COEFF: [f64; 4] = [-11059.0, 19548.0, -1185.0, 0.0];

/// LTR559 适配器
pub struct Ltr559Light<I2C = I2cdev> {
    i2c: I2C,
}

impl Ltr559Light<I2cdev> {
    /// 打开 I2C 设备并初始化 LTR559
    pub fn new(device: &Path) -> Result<Self, BusError> {
        let i2c = open_i2c(device)?;
        let sensor = Self::with_i2c(i2c)?;
        info!("LTR559 initialized on {}", device.display());
        Ok(sensor)
    }
}

impl<I2C: I2c> Ltr559Light<I2C> {
    /// 在已打开的总线上初始化传感器
    ///
    /// # 错误
    /// - `WrongChip`: PART_ID 不是 0x92
    /// - `Transfer`: I2C 传输失败
    pub fn with_i2c(i2c: I2C) -> Result<Self, BusError> {
        let mut sensor = Self { i2c };

        let part_id = sensor.read_register(reg::PART_ID)?;
        if part_id != PART_ID {
            return Err(BusError::Device(BusDeviceError::new(
                BusDeviceErrorKind::WrongChip,
                format!("LTR559 part id mismatch: expected 0x{PART_ID:02X}, got 0x{part_id:02X}"),
            )));
        }

        sensor.write_register(reg::PS_LED, PS_LED_DEFAULT)?;
        sensor.write_register(reg::PS_N_PULSES, 1)?;
        sensor.write_register(reg::PS_MEAS_RATE, PS_MEAS_RATE_DEFAULT)?;
        sensor.write_register(reg::ALS_MEAS_RATE, ALS_MEAS_RATE_DEFAULT)?;
        sensor.write_register(reg::ALS_CONTROL, ALS_CONTROL_ACTIVE_GAIN4)?;
        sensor.write_register(reg::PS_CONTROL, PS_CONTROL_ACTIVE)?;

        Ok(sensor)
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    fn read_register(&mut self, register: u8) -> Result<u8, BusError> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(I2C_ADDR, &[register], &mut buf)
            .map_err(|e| transfer_error("LTR559 register read failed", e))?;
        Ok(buf[0])
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), BusError> {
        self.i2c
            .write(I2C_ADDR, &[register, value])
            .map_err(|e| transfer_error("LTR559 register write failed", e))
    }

    /// 读取 ALS 两个通道的原始计数 `(ch0, ch1)`
    fn read_als_channels(&mut self) -> Result<(u16, u16), BusError> {
        let mut buf = [0u8; 4];
        self.i2c
            .write_read(I2C_ADDR, &[reg::ALS_DATA], &mut buf)
            .map_err(|e| transfer_error("LTR559 ALS read failed", e))?;
        let ch1 = u16::from_le_bytes([buf[0], buf[1]]);
        let ch0 = u16::from_le_bytes([buf[2], buf[3]]);
        Ok((ch0, ch1))
    }
}

/// 根据两个通道的计数计算照度（lux）
///
/// CH1（红外）占比决定使用哪一组系数；两个通道都为 0 时得到 0。
pub fn compute_lux(ch0: u16, ch1: u16, integration_ms: f64, gain: f64) -> f64 {
    let ch0 = f64::from(ch0);
    let ch1 = f64::from(ch1);

    let ratio = if ch0 + ch1 > 0.0 {
        ch1 * 100.0 / (ch1 + ch0)
    } else {
        101.0
    };

    let index = if ratio < 45.0 {
        0
    } else if ratio < 64.0 {
        1
    } else if ratio < 85.0 {
        2
    } else {
        3
    };

    let lux = ch0 * CH0_COEFF[index] - ch1 * CH1_COEFF[index];
    lux / (integration_ms / 100.0) / gain / 10000.0
}

impl<I2C: I2c> LightSensor for Ltr559Light<I2C> {
    fn lux(&mut self) -> Result<f64, BusError> {
        let (ch0, ch1) = self.read_als_channels()?;
        debug!("LTR559 ALS raw: ch0={}, ch1={}", ch0, ch1);
        Ok(compute_lux(ch0, ch1, ALS_INTEGRATION_MS, ALS_GAIN))
    }

    fn proximity(&mut self) -> Result<f64, BusError> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(I2C_ADDR, &[reg::PS_DATA], &mut buf)
            .map_err(|e| transfer_error("LTR559 PS read failed", e))?;
        let count = u16::from(buf[1] & 0x07) << 8 | u16::from(buf[0]);
        debug!("LTR559 PS raw: {}", count);
        Ok(f64::from(count))
    }
}
