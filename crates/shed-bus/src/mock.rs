//! Mock 传感器后端
//!
//! 无硬件依赖的脚本化传感器，用于测试和 `--backend mock` 演练。
//!
//! - 每个指标一条读数脚本，按调用顺序返回，脚本耗尽后重复最后一个值
//! - 可在指定指标的第 N 次读取时注入故障
//! - 可共享一个 [`ReadLog`]，记录所有读取的先后顺序
//!
//! 指标名统一使用 CSV 列名：`temperature`、`pressure`、`humidity`、`light`、`proximity`
//! （`LightSensor::lux` 对应 `light`）。

use std::sync::{Arc, Mutex};

use crate::{BusDeviceError, BusDeviceErrorKind, BusError, LightSensor, WeatherSensor};

/// 演练时的默认读数
pub const DEFAULT_TEMPERATURE: f64 = 20.0;
pub const DEFAULT_PRESSURE: f64 = 1013.25;
pub const DEFAULT_HUMIDITY: f64 = 50.0;
pub const DEFAULT_LUX: f64 = 100.0;
pub const DEFAULT_PROXIMITY: f64 = 0.0;

/// 共享的读取日志
///
/// 克隆后指向同一份记录，可以在 mock 被移交给读取器之后继续检查。
#[derive(Debug, Clone, Default)]
pub struct ReadLog {
    calls: Arc<Mutex<Vec<&'static str>>>,
}

impl ReadLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, metric: &'static str) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(metric);
        }
    }

    /// 按时间顺序返回所有读取过的指标名
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// 读取总次数
    pub fn len(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 指定指标的读取次数
    pub fn count(&self, metric: &str) -> usize {
        self.calls
            .lock()
            .map(|c| c.iter().filter(|m| **m == metric).count())
            .unwrap_or(0)
    }
}

/// 单个指标的读数脚本
#[derive(Debug, Clone)]
struct Script {
    metric: &'static str,
    values: Vec<f64>,
    calls: usize,
    fail_at: Option<usize>,
}

impl Script {
    fn new(metric: &'static str, values: Vec<f64>) -> Self {
        Self {
            metric,
            values,
            calls: 0,
            fail_at: None,
        }
    }

    fn next(&mut self, log: &ReadLog) -> Result<f64, BusError> {
        self.calls += 1;
        log.record(self.metric);

        if self.fail_at == Some(self.calls) {
            return Err(BusError::Device(BusDeviceError::new(
                BusDeviceErrorKind::Transfer,
                format!("injected failure on {} read #{}", self.metric, self.calls),
            )));
        }

        let index = self.calls.min(self.values.len());
        match index.checked_sub(1).and_then(|i| self.values.get(i)) {
            Some(value) => Ok(*value),
            None => Err(BusError::NotInitialized),
        }
    }
}

/// 模拟 BME280
#[derive(Debug, Clone)]
pub struct MockWeather {
    temperature: Script,
    pressure: Script,
    humidity: Script,
    log: ReadLog,
}

impl MockWeather {
    /// 每次都返回相同读数
    pub fn fixed(temperature: f64, pressure: f64, humidity: f64) -> Self {
        Self::scripted(&[(temperature, pressure, humidity)])
    }

    /// 第 i 次读取返回 `samples[i]`，之后重复最后一组
    pub fn scripted(samples: &[(f64, f64, f64)]) -> Self {
        Self {
            temperature: Script::new("temperature", samples.iter().map(|s| s.0).collect()),
            pressure: Script::new("pressure", samples.iter().map(|s| s.1).collect()),
            humidity: Script::new("humidity", samples.iter().map(|s| s.2).collect()),
            log: ReadLog::new(),
        }
    }

    /// 在 `metric` 的第 `call` 次读取（从 1 开始）时返回错误
    ///
    /// 未知的指标名会被忽略。
    pub fn fail_on(mut self, metric: &str, call: usize) -> Self {
        match metric {
            "temperature" => self.temperature.fail_at = Some(call),
            "pressure" => self.pressure.fail_at = Some(call),
            "humidity" => self.humidity.fail_at = Some(call),
            _ => {},
        }
        self
    }

    pub fn with_log(mut self, log: ReadLog) -> Self {
        self.log = log;
        self
    }
}

impl Default for MockWeather {
    fn default() -> Self {
        Self::fixed(DEFAULT_TEMPERATURE, DEFAULT_PRESSURE, DEFAULT_HUMIDITY)
    }
}

impl WeatherSensor for MockWeather {
    fn temperature(&mut self) -> Result<f64, BusError> {
        self.temperature.next(&self.log)
    }

    fn pressure(&mut self) -> Result<f64, BusError> {
        self.pressure.next(&self.log)
    }

    fn humidity(&mut self) -> Result<f64, BusError> {
        self.humidity.next(&self.log)
    }
}

/// 模拟 LTR559
#[derive(Debug, Clone)]
pub struct MockLight {
    lux: Script,
    proximity: Script,
    log: ReadLog,
}

impl MockLight {
    pub fn fixed(lux: f64, proximity: f64) -> Self {
        Self::scripted(&[(lux, proximity)])
    }

    pub fn scripted(samples: &[(f64, f64)]) -> Self {
        Self {
            lux: Script::new("light", samples.iter().map(|s| s.0).collect()),
            proximity: Script::new("proximity", samples.iter().map(|s| s.1).collect()),
            log: ReadLog::new(),
        }
    }

    pub fn fail_on(mut self, metric: &str, call: usize) -> Self {
        match metric {
            "light" => self.lux.fail_at = Some(call),
            "proximity" => self.proximity.fail_at = Some(call),
            _ => {},
        }
        self
    }

    pub fn with_log(mut self, log: ReadLog) -> Self {
        self.log = log;
        self
    }
}

impl Default for MockLight {
    fn default() -> Self {
        Self::fixed(DEFAULT_LUX, DEFAULT_PROXIMITY)
    }
}

impl LightSensor for MockLight {
    fn lux(&mut self) -> Result<f64, BusError> {
        self.lux.next(&self.log)
    }

    fn proximity(&mut self) -> Result<f64, BusError> {
        self.proximity.next(&self.log)
    }
}
