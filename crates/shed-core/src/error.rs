//! 核心层错误类型定义

use std::io;
use std::path::PathBuf;

use shed_bus::BusError;
use thiserror::Error;

/// 传感器读取失败
///
/// 任意一次迭代中任意一个指标读取失败都会整体放弃本次读取。
#[derive(Error, Debug)]
#[error("failed to read {metric} on iteration {iteration}: {source}")]
pub struct SensorError {
    /// 失败的指标名（CSV 列名）
    pub metric: &'static str,
    /// 失败发生在第几次迭代（从 1 开始）
    pub iteration: u32,
    #[source]
    pub source: BusError,
}

impl SensorError {
    pub fn new(metric: &'static str, iteration: u32, source: BusError) -> Self {
        Self {
            metric,
            iteration,
            source,
        }
    }
}

/// 存储层错误
#[derive(Error, Debug)]
pub enum StoreError {
    /// 创建数据目录失败
    #[error("failed to create data directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 创建每日文件（或写入表头）失败
    #[error("failed to create daily file {path}: {source}")]
    CreateFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 追加记录失败
    #[error("failed to append record to {path}: {source}")]
    Append {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    /// 出错的路径
    pub fn path(&self) -> &PathBuf {
        match self {
            StoreError::CreateDirectory { path, .. }
            | StoreError::CreateFile { path, .. }
            | StoreError::Append { path, .. } => path,
        }
    }
}

/// 配置错误（启动阶段）
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 显式指定的配置文件不存在
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// 取值非法（如 `read_retries = 0`）
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// 显示器错误
///
/// 只记录日志，不影响运行结果。
#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("display IO error: {0}")]
    Io(#[from] io::Error),

    #[error("display unavailable: {0}")]
    Unavailable(String),
}
