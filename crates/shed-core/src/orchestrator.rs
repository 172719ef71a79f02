//! 单次运行编排
//!
//! ```text
//! Reading ──► Persisting ──► (Displaying) ──► Done
//!    │             │
//!    └─────────────┴──────────────────────► Aborted
//! ```
//!
//! 传感器和存储失败都在这里收敛：记录日志后以 [`RunOutcome::Aborted`] 返回，
//! 不会 panic，也不会把错误抛给调用方。显示器只在追加成功之后调用，失败只告警。

use std::path::PathBuf;

use shed_bus::{LightSensor, WeatherSensor};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::display::DisplaySink;
use crate::error::{SensorError, StoreError};
use crate::reader::{Pause, SensorReader, ThreadPause};
use crate::sample::Sample;
use crate::store::{DailyStore, RecordStore};

/// 运行阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// 尚未运行
    Idle,
    Reading,
    Persisting,
    Displaying,
    Done,
    Aborted,
}

/// 放弃本次运行的原因
#[derive(Error, Debug)]
pub enum AbortReason {
    #[error("sensor read failed: {0}")]
    Sensor(#[from] SensorError),

    #[error("storage failed: {0}")]
    Store(#[from] StoreError),
}

/// 运行结果
#[derive(Debug)]
pub enum RunOutcome {
    /// 已追加到 `path`
    Done { path: PathBuf, sample: Sample },
    Aborted(AbortReason),
}

impl RunOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, RunOutcome::Done { .. })
    }
}

/// 读取 → 持久化 → 显示
pub struct RunOrchestrator<W, L, P = ThreadPause, S = DailyStore, C = SystemClock> {
    reader: SensorReader<W, L, P>,
    store: S,
    clock: C,
    display: Option<Box<dyn DisplaySink>>,
    state: RunState,
}

impl<W, L, P, S, C> RunOrchestrator<W, L, P, S, C>
where
    W: WeatherSensor,
    L: LightSensor,
    P: Pause,
    S: RecordStore,
    C: Clock,
{
    pub fn new(reader: SensorReader<W, L, P>, store: S, clock: C) -> Self {
        Self {
            reader,
            store,
            clock,
            display: None,
            state: RunState::Idle,
        }
    }

    /// 挂接显示器
    pub fn with_display(mut self, display: Box<dyn DisplaySink>) -> Self {
        self.display = Some(display);
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 执行一次完整运行
    pub fn run(&mut self) -> RunOutcome {
        self.state = RunState::Reading;
        info!("Attempting to read sensors");
        let metrics = match self.reader.read_sensors() {
            Ok(metrics) => metrics,
            Err(e) => {
                error!("Sensor read failed, no data written: {}", e);
                return self.abort(e.into());
            },
        };

        self.state = RunState::Persisting;
        // 日期与时间戳取自同一次时钟读数
        let sample = Sample::new(self.clock.now(), metrics);
        let path = match self.persist(&sample) {
            Ok(path) => path,
            Err(e) => {
                error!("Failed to store data in {}: {}", e.path().display(), e);
                return self.abort(e.into());
            },
        };

        if let Some(display) = self.display.as_mut() {
            self.state = RunState::Displaying;
            let timestamp = sample.timestamp_string();
            if let Err(e) = display.show(&timestamp, &sample.metrics.to_map()) {
                warn!("Display update failed: {}", e);
            }
        }

        self.state = RunState::Done;
        RunOutcome::Done { path, sample }
    }

    fn persist(&self, sample: &Sample) -> Result<PathBuf, StoreError> {
        info!("Checking for directory");
        self.store.ensure_directory()?;

        let path = self.store.path_for(sample.date());
        self.store.ensure_daily_file(&path)?;

        info!("Writing data");
        let row = sample.to_csv_row();
        self.store.append_record(&path, &row)?;
        debug!("Wrote {} to {}", row, path.display());
        Ok(path)
    }

    fn abort(&mut self, reason: AbortReason) -> RunOutcome {
        self.state = RunState::Aborted;
        RunOutcome::Aborted(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::DisplayError;
    use chrono::{NaiveDate, NaiveDateTime};
    use shed_bus::{MockLight, MockWeather};
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::Path;
    use std::rc::Rc;
    use std::time::Duration;
    use tempfile::TempDir;

    type Events = Rc<RefCell<Vec<String>>>;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    /// 记录调用顺序的存储
    struct TracingStore {
        inner: DailyStore,
        events: Events,
    }

    impl RecordStore for TracingStore {
        fn path_for(&self, date: NaiveDate) -> PathBuf {
            self.inner.path_for(date)
        }

        fn ensure_directory(&self) -> Result<bool, StoreError> {
            self.events.borrow_mut().push("ensure_directory".to_string());
            self.inner.ensure_directory()
        }

        fn ensure_daily_file(&self, path: &Path) -> Result<bool, StoreError> {
            self.events.borrow_mut().push("ensure_daily_file".to_string());
            self.inner.ensure_daily_file(path)
        }

        fn append_record(&self, path: &Path, row: &str) -> Result<(), StoreError> {
            self.events.borrow_mut().push(format!("append {row}"));
            self.inner.append_record(path, row)
        }
    }

    struct RecordingPanel {
        events: Events,
        fail: bool,
    }

    impl DisplaySink for RecordingPanel {
        fn show(
            &mut self,
            timestamp: &str,
            metrics: &BTreeMap<&'static str, f64>,
        ) -> Result<(), DisplayError> {
            self.events
                .borrow_mut()
                .push(format!("show {timestamp} light={}", metrics["light"]));
            if self.fail {
                Err(DisplayError::Unavailable("panel off".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn reader(weather: MockWeather) -> SensorReader<MockWeather, MockLight, fn(Duration)> {
        let light = MockLight::scripted(&[(120.0, 0.0), (118.0, 0.0)]);
        SensorReader::new(weather, light).with_pause((|_: Duration| {}) as fn(Duration))
    }

    fn good_weather() -> MockWeather {
        MockWeather::scripted(&[(21.5, 1013.2, 45.0), (21.7, 1013.1, 44.8)])
    }

    #[test]
    fn test_done_runs_store_then_display() {
        let tmp = TempDir::new().unwrap();
        let events = Events::default();
        let store = TracingStore {
            inner: DailyStore::new(tmp.path().join("data")),
            events: Rc::clone(&events),
        };
        let panel = RecordingPanel {
            events: Rc::clone(&events),
            fail: false,
        };

        let mut orchestrator =
            RunOrchestrator::new(reader(good_weather()), store, FixedClock(at(8, 0, 2)))
                .with_display(Box::new(panel));
        assert_eq!(orchestrator.state(), RunState::Idle);

        let outcome = orchestrator.run();
        assert_eq!(orchestrator.state(), RunState::Done);
        match outcome {
            RunOutcome::Done { path, sample } => {
                assert_eq!(path, tmp.path().join("data").join("2024-01-01.csv"));
                assert_eq!(sample.metrics.temperature, 21.7);
            },
            other => panic!("Expected Done, got {other:?}"),
        }

        assert_eq!(
            *events.borrow(),
            vec![
                "ensure_directory".to_string(),
                "ensure_daily_file".to_string(),
                "append 2024-01-01 08:00:02,21.7,1013.1,44.8,118.0,0.0".to_string(),
                "show 2024-01-01 08:00:02 light=118".to_string(),
            ]
        );
    }

    #[test]
    fn test_display_failure_keeps_done() {
        let tmp = TempDir::new().unwrap();
        let events = Events::default();
        let panel = RecordingPanel {
            events: Rc::clone(&events),
            fail: true,
        };

        let mut orchestrator = RunOrchestrator::new(
            reader(good_weather()),
            DailyStore::new(tmp.path()),
            FixedClock(at(8, 0, 2)),
        )
        .with_display(Box::new(panel));

        assert!(orchestrator.run().is_done());
        assert_eq!(orchestrator.state(), RunState::Done);
        assert_eq!(events.borrow().len(), 1);
        let content = fs::read_to_string(tmp.path().join("2024-01-01.csv")).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_sensor_failure_touches_nothing() {
        let tmp = TempDir::new().unwrap();
        let events = Events::default();
        let store = TracingStore {
            inner: DailyStore::new(tmp.path().join("data")),
            events: Rc::clone(&events),
        };
        let panel = RecordingPanel {
            events: Rc::clone(&events),
            fail: false,
        };

        let mut orchestrator = RunOrchestrator::new(
            reader(good_weather().fail_on("humidity", 1)),
            store,
            FixedClock(at(8, 0, 2)),
        )
        .with_display(Box::new(panel));

        match orchestrator.run() {
            RunOutcome::Aborted(AbortReason::Sensor(e)) => {
                assert_eq!(e.metric, "humidity");
                assert_eq!(e.iteration, 1);
            },
            other => panic!("Expected sensor abort, got {other:?}"),
        }
        assert_eq!(orchestrator.state(), RunState::Aborted);
        assert!(events.borrow().is_empty());
        assert!(!tmp.path().join("data").exists());
    }

    #[test]
    fn test_store_failure_skips_display() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("data");
        fs::write(&blocker, "occupied").unwrap();

        let events = Events::default();
        let panel = RecordingPanel {
            events: Rc::clone(&events),
            fail: false,
        };
        let mut orchestrator = RunOrchestrator::new(
            reader(good_weather()),
            DailyStore::new(&blocker),
            FixedClock(at(8, 0, 2)),
        )
        .with_display(Box::new(panel));

        match orchestrator.run() {
            RunOutcome::Aborted(AbortReason::Store(StoreError::CreateDirectory { path, .. })) => {
                assert_eq!(path, blocker)
            },
            other => panic!("Expected store abort, got {other:?}"),
        }
        assert_eq!(orchestrator.state(), RunState::Aborted);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_midnight_uses_single_clock_reading() {
        let tmp = TempDir::new().unwrap();
        let late = NaiveDate::from_ymd_opt(2023, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        let mut orchestrator = RunOrchestrator::new(
            reader(good_weather()),
            DailyStore::new(tmp.path()),
            FixedClock(late),
        );

        assert!(orchestrator.run().is_done());
        let content = fs::read_to_string(tmp.path().join("2023-12-31.csv")).unwrap();
        assert!(content.ends_with("2023-12-31 23:59:59,21.7,1013.1,44.8,118.0,0.0\n"));
        assert_eq!(orchestrator.store().directory(), tmp.path());
    }
}
