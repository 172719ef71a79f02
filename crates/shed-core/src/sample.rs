//! 采样数据实体

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};

use crate::format::format_float;

/// 每日文件的表头（不含换行）
pub const CSV_HEADER: &str = "datetime,temperature,pressure,humidity,light,proximity";

/// 指标列名，顺序与 CSV 一致
pub const METRIC_NAMES: [&str; 5] = ["temperature", "pressure", "humidity", "light", "proximity"];

/// 行时间戳格式
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 文件名日期格式
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 一次完整读取的五个指标
///
/// 只有五个指标全部读取成功才会构造，不存在部分填充的状态。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    /// 温度（°C）
    pub temperature: f64,
    /// 气压（hPa）
    pub pressure: f64,
    /// 相对湿度（%RH）
    pub humidity: f64,
    /// 环境光（lux）
    pub light: f64,
    /// 接近（原始计数）
    pub proximity: f64,
}

impl Metrics {
    /// 按 CSV 列顺序返回
    pub fn values(&self) -> [f64; 5] {
        [
            self.temperature,
            self.pressure,
            self.humidity,
            self.light,
            self.proximity,
        ]
    }

    /// 指标名 → 值，供显示器使用
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        METRIC_NAMES.into_iter().zip(self.values()).collect()
    }
}

/// 带时间戳的一条采样
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: NaiveDateTime,
    pub metrics: Metrics,
}

impl Sample {
    pub fn new(timestamp: NaiveDateTime, metrics: Metrics) -> Self {
        Self { timestamp, metrics }
    }

    /// 所属的日期（决定写入哪个每日文件）
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// `YYYY-MM-DD HH:MM:SS`
    pub fn timestamp_string(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }

    /// 序列化为一行 CSV（不含换行）
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use shed_core::{Metrics, Sample};
    ///
    /// let ts = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(8, 30, 0).unwrap();
    /// let metrics = Metrics {
    ///     temperature: 21.7,
    ///     pressure: 1013.1,
    ///     humidity: 44.8,
    ///     light: 118.0,
    ///     proximity: 0.0,
    /// };
    /// assert_eq!(
    ///     Sample::new(ts, metrics).to_csv_row(),
    ///     "2024-01-01 08:30:00,21.7,1013.1,44.8,118.0,0.0"
    /// );
    /// ```
    pub fn to_csv_row(&self) -> String {
        let mut row = self.timestamp_string();
        for value in self.metrics.values() {
            row.push(',');
            row.push_str(&format_float(value));
        }
        row
    }
}
