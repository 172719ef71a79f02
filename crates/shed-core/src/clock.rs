//! 时钟抽象
//!
//! 每次运行只读取一次时钟，日期（文件名）和时间戳（行内容）都从这一次读取中派生，
//! 跨午夜运行时两者不会错开。

use chrono::{Local, NaiveDateTime};

pub trait Clock {
    /// 当前本地时间（秒级精度即可）
    fn now(&self) -> NaiveDateTime;
}

/// 系统本地时间
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// 固定时间（测试、回放）
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}
