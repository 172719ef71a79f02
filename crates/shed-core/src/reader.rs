//! 传感器读取协议
//!
//! 硬件上电或空闲后的第一次读数存在系统性偏差（偏低）。补偿策略是：
//!
//! 1. 连续执行 `retries` 次完整读取，每次都整体覆盖上一次的五个指标
//! 2. 每次读取之后（包括最后一次）暂停 `delay`
//! 3. 只返回最后一次的结果
//!
//! 这不是平均：前 N-1 次的读数被直接丢弃，历史归档依赖这一语义。
//! 任意一次读取失败立即终止（不再继续后续迭代），不会返回部分结果。

use std::num::NonZeroU32;
use std::thread;
use std::time::Duration;

use shed_bus::{BusError, LightSensor, WeatherSensor};
use tracing::debug;

use crate::error::SensorError;
use crate::sample::Metrics;

/// 默认读取次数
pub const DEFAULT_RETRIES: NonZeroU32 = match NonZeroU32::new(2) {
    Some(n) => n,
    None => unreachable!(),
};

/// 默认读取间隔
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// 读取间隔的暂停方式
///
/// 生产环境使用 [`ThreadPause`]；测试中可替换为记录调用的闭包。
pub trait Pause {
    fn pause(&mut self, duration: Duration);
}

/// 阻塞当前线程
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadPause;

impl Pause for ThreadPause {
    fn pause(&mut self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

impl<F: FnMut(Duration)> Pause for F {
    fn pause(&mut self, duration: Duration) {
        self(duration)
    }
}

/// 偏差补偿读取器
///
/// # 示例
///
/// ```
/// use std::num::NonZeroU32;
/// use std::time::Duration;
/// use shed_bus::{MockLight, MockWeather};
/// use shed_core::SensorReader;
///
/// let weather = MockWeather::scripted(&[(21.5, 1013.2, 45.0), (21.7, 1013.1, 44.8)]);
/// let light = MockLight::scripted(&[(120.0, 0.0), (118.0, 0.0)]);
/// let mut reader = SensorReader::new(weather, light)
///     .retries(NonZeroU32::new(2).unwrap())
///     .delay(Duration::ZERO);
///
/// let metrics = reader.read_sensors().unwrap();
/// assert_eq!(metrics.temperature, 21.7);
/// assert_eq!(metrics.light, 118.0);
/// ```
pub struct SensorReader<W, L, P = ThreadPause> {
    weather: W,
    light: L,
    pause: P,
    retries: NonZeroU32,
    delay: Duration,
}

impl<W: WeatherSensor, L: LightSensor> SensorReader<W, L, ThreadPause> {
    /// 使用默认参数（2 次读取，间隔 1 秒）
    pub fn new(weather: W, light: L) -> Self {
        Self {
            weather,
            light,
            pause: ThreadPause,
            retries: DEFAULT_RETRIES,
            delay: DEFAULT_DELAY,
        }
    }
}

impl<W: WeatherSensor, L: LightSensor, P: Pause> SensorReader<W, L, P> {
    /// 设置读取次数
    pub fn retries(mut self, retries: NonZeroU32) -> Self {
        self.retries = retries;
        self
    }

    /// 设置每次读取后的暂停时长
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// 替换暂停实现
    pub fn with_pause<Q: Pause>(self, pause: Q) -> SensorReader<W, L, Q> {
        SensorReader {
            weather: self.weather,
            light: self.light,
            pause,
            retries: self.retries,
            delay: self.delay,
        }
    }

    pub fn retry_count(&self) -> NonZeroU32 {
        self.retries
    }

    pub fn read_delay(&self) -> Duration {
        self.delay
    }

    /// 执行完整的 N 次读取，返回最后一次的结果
    ///
    /// # 错误
    /// 任意指标在任意迭代中失败时返回 [`SensorError`]，
    /// 失败的那次迭代不会暂停，也不会进入下一次迭代。
    pub fn read_sensors(&mut self) -> Result<Metrics, SensorError> {
        let total = self.retries.get();

        let mut latest = self.read_iteration(1, total)?;
        for iteration in 2..=total {
            latest = self.read_iteration(iteration, total)?;
        }

        Ok(latest)
    }

    /// 单次迭代：按固定顺序读取五个指标，然后暂停
    fn read_iteration(&mut self, iteration: u32, total: u32) -> Result<Metrics, SensorError> {
        let fail = |metric: &'static str| move |e: BusError| SensorError::new(metric, iteration, e);

        let temperature = self.weather.temperature().map_err(fail("temperature"))?;
        let pressure = self.weather.pressure().map_err(fail("pressure"))?;
        let humidity = self.weather.humidity().map_err(fail("humidity"))?;
        let light = self.light.lux().map_err(fail("light"))?;
        let proximity = self.light.proximity().map_err(fail("proximity"))?;

        let metrics = Metrics {
            temperature,
            pressure,
            humidity,
            light,
            proximity,
        };
        debug!("Sensor iteration {}/{}: {:?}", iteration, total, metrics);

        self.pause.pause(self.delay);
        Ok(metrics)
    }
}
