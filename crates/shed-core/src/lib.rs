//! # Shed Core
//!
//! 单次运行的环境采集核心：
//!
//! ```text
//! SensorReader ──► RunOrchestrator ──► DailyStore ──► (可选) DisplaySink
//!  (N 次读取取最后一次)   (失败收敛)     (按日追加 CSV)
//! ```
//!
//! - [`reader`]: 偏差补偿读取协议（读 N 次，只保留最后一次）
//! - [`store`]: 每日 CSV 文件，目录/表头惰性创建，只追加不改写
//! - [`orchestrator`]: 读取 → 持久化 → 显示 的顺序编排，传感器/存储失败都不向上抛出
//! - [`config`]: 启动时一次性加载的只读配置（TOML）

pub mod clock;
pub mod config;
pub mod display;
mod error;
pub mod format;
pub mod orchestrator;
pub mod reader;
pub mod sample;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::MonitorConfig;
pub use display::{DisplaySink, TextPanel};
pub use error::{ConfigError, DisplayError, SensorError, StoreError};
pub use orchestrator::{AbortReason, RunOrchestrator, RunOutcome, RunState};
pub use reader::{Pause, SensorReader, ThreadPause};
pub use sample::{CSV_HEADER, Metrics, Sample};
pub use store::{DailyStore, RecordStore};
