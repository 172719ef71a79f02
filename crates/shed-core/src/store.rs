//! 每日 CSV 存储
//!
//! 每个自然日一个文件 `<data_directory>/YYYY-MM-DD.csv`：
//!
//! ```text
//! datetime,temperature,pressure,humidity,light,proximity
//! 2024-01-01 08:00:02,21.7,1013.1,44.8,118.0,0.0
//! 2024-01-01 08:15:02,21.9,1013.0,44.1,131.0,0.0
//! ```
//!
//! - 目录和表头在当天第一次写入时惰性创建
//! - 已存在的文件既不读取也不校验，更不会被改写或截断
//! - 每次运行只以追加模式写入一行
//! - 不加文件锁：按部署约定，同一时刻只有一个写入者

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::sample::{CSV_HEADER, DATE_FORMAT};

/// 确保目录存在（含缺失的父目录）
///
/// 返回 `true` 表示本次调用创建了目录；已存在时什么也不做。
pub fn ensure_directory(path: &Path) -> Result<bool, StoreError> {
    if path.is_dir() {
        debug!("Data directory {} already exists", path.display());
        return Ok(false);
    }

    fs::create_dir_all(path).map_err(|source| StoreError::CreateDirectory {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Created data directory {}", path.display());
    Ok(true)
}

/// 确保每日文件存在
///
/// 文件不存在时以独占方式创建并写入表头；已存在时立即返回 `false`，
/// 不读取、不校验其内容（即使内容已损坏也保持原样）。
pub fn ensure_daily_file(path: &Path) -> Result<bool, StoreError> {
    let create_error = |source: io::Error| StoreError::CreateFile {
        path: path.to_path_buf(),
        source,
    };

    let file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            debug!("Daily file {} already exists", path.display());
            return Ok(false);
        },
        Err(e) => return Err(create_error(e)),
    };

    write_header(path, file, |file: &mut File| file.sync_all())?;
    info!("Created daily file {}", path.display());
    Ok(true)
}

/// 向刚创建的文件写入表头并落盘
///
/// 任一步失败都会删除该文件：存在的每日文件第一行必须是表头，
/// 而后续运行不会再检查已有文件的内容。
fn write_header<W: Write>(
    path: &Path,
    mut file: W,
    sync: impl FnOnce(&mut W) -> io::Result<()>,
) -> Result<(), StoreError> {
    let written = file
        .write_all(format!("{CSV_HEADER}\n").as_bytes())
        .and_then(|()| sync(&mut file));
    drop(file);

    if let Err(source) = written {
        if let Err(e) = fs::remove_file(path) {
            warn!("Failed to remove incomplete daily file {}: {}", path.display(), e);
        }
        return Err(StoreError::CreateFile {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

/// 以追加模式写入一行（自动补换行）
///
/// 文件必须已存在（由 [`ensure_daily_file`] 创建）；整行在一次写入中提交。
/// 失败时返回错误，不重试。
pub fn append_record(path: &Path, row: &str) -> Result<(), StoreError> {
    let append_error = |source: io::Error| StoreError::Append {
        path: path.to_path_buf(),
        source,
    };

    let mut file = OpenOptions::new().append(true).open(path).map_err(append_error)?;

    let mut line = String::with_capacity(row.len() + 1);
    line.push_str(row);
    line.push('\n');

    file.write_all(line.as_bytes()).map_err(append_error)?;
    file.sync_data().map_err(append_error)?;
    debug!("Appended {} bytes to {}", line.len(), path.display());
    Ok(())
}

/// 记录存储接口
///
/// 编排器按 `ensure_directory` → `ensure_daily_file` → `append_record` 的顺序调用。
pub trait RecordStore {
    /// 日期对应的文件路径
    fn path_for(&self, date: NaiveDate) -> PathBuf;

    fn ensure_directory(&self) -> Result<bool, StoreError>;

    fn ensure_daily_file(&self, path: &Path) -> Result<bool, StoreError>;

    fn append_record(&self, path: &Path, row: &str) -> Result<(), StoreError>;
}

/// 基于本地文件系统的每日 CSV 存储
#[derive(Debug, Clone)]
pub struct DailyStore {
    directory: PathBuf,
}

impl DailyStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// 文件名：`YYYY-MM-DD.csv`
    pub fn file_name(date: NaiveDate) -> String {
        format!("{}.csv", date.format(DATE_FORMAT))
    }
}

impl RecordStore for DailyStore {
    fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.directory.join(Self::file_name(date))
    }

    fn ensure_directory(&self) -> Result<bool, StoreError> {
        ensure_directory(&self.directory)
    }

    fn ensure_daily_file(&self, path: &Path) -> Result<bool, StoreError> {
        ensure_daily_file(path)
    }

    fn append_record(&self, path: &Path, row: &str) -> Result<(), StoreError> {
        append_record(path, row)
    }
}

impl<S: RecordStore + ?Sized> RecordStore for &S {
    fn path_for(&self, date: NaiveDate) -> PathBuf {
        (**self).path_for(date)
    }

    fn ensure_directory(&self) -> Result<bool, StoreError> {
        (**self).ensure_directory()
    }

    fn ensure_daily_file(&self, path: &Path) -> Result<bool, StoreError> {
        (**self).ensure_daily_file(path)
    }

    fn append_record(&self, path: &Path, row: &str) -> Result<(), StoreError> {
        (**self).append_record(path, row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HEADER_LINE: &str = "datetime,temperature,pressure,humidity,light,proximity\n";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_path_for_date() {
        let store = DailyStore::new("/srv/shed/data");
        assert_eq!(
            store.path_for(date(2024, 1, 1)),
            PathBuf::from("/srv/shed/data/2024-01-01.csv")
        );
        assert_eq!(DailyStore::file_name(date(2023, 12, 31)), "2023-12-31.csv");
    }

    #[test]
    fn test_ensure_directory_creates_parents_once() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("a").join("b").join("data");

        assert!(ensure_directory(&nested).unwrap());
        assert!(nested.is_dir());
        assert!(!ensure_directory(&nested).unwrap());
    }

    #[test]
    fn test_ensure_directory_over_file_fails() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("data");
        fs::write(&blocker, "not a directory").unwrap();

        match ensure_directory(&blocker) {
            Err(StoreError::CreateDirectory { path, .. }) => assert_eq!(path, blocker),
            other => panic!("Expected CreateDirectory error, got {other:?}"),
        }
    }

    #[test]
    fn test_ensure_daily_file_writes_header_once() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("2024-01-01.csv");

        assert!(ensure_daily_file(&path).unwrap());
        let once = fs::read(&path).unwrap();
        assert_eq!(once, HEADER_LINE.as_bytes());

        assert!(!ensure_daily_file(&path).unwrap());
        assert_eq!(fs::read(&path).unwrap(), once);
    }

    #[test]
    fn test_ensure_daily_file_leaves_corrupt_file_untouched() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("2024-01-01.csv");
        let garbage = b"\x00\xffnot,a,header\nrandom";
        fs::write(&path, garbage).unwrap();

        assert!(!ensure_daily_file(&path).unwrap());
        assert_eq!(fs::read(&path).unwrap(), garbage);
    }

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("no space left on device"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_header_write_removes_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("2024-01-01.csv");
        fs::write(&path, "").unwrap();

        match write_header(&path, FullDisk, |_: &mut FullDisk| Ok(())) {
            Err(StoreError::CreateFile { path: failed, .. }) => assert_eq!(failed, path),
            other => panic!("Expected CreateFile error, got {other:?}"),
        }
        assert!(!path.exists());

        // 下一次运行重新创建，表头仍在第一行
        assert!(ensure_daily_file(&path).unwrap());
        append_record(&path, "row").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), format!("{HEADER_LINE}row\n"));
    }

    #[test]
    fn test_failed_header_sync_removes_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("2024-01-01.csv");
        fs::write(&path, "").unwrap();

        let result = write_header(&path, Vec::new(), |_: &mut Vec<u8>| {
            Err(io::Error::other("I/O error"))
        });
        assert!(matches!(result, Err(StoreError::CreateFile { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn test_header_written_through_writer() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("2024-01-01.csv");
        let mut synced = false;
        let mut buffer = Vec::new();

        write_header(&path, &mut buffer, |_: &mut &mut Vec<u8>| {
            synced = true;
            Ok(())
        })
        .unwrap();
        assert!(synced);
        assert_eq!(buffer, HEADER_LINE.as_bytes());
    }

    #[test]
    fn test_ensure_daily_file_missing_directory() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("missing").join("2024-01-01.csv");
        assert!(matches!(
            ensure_daily_file(&path),
            Err(StoreError::CreateFile { .. })
        ));
    }

    #[test]
    fn test_append_is_strictly_additive() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("2024-01-01.csv");
        ensure_daily_file(&path).unwrap();

        let mut previous = fs::read(&path).unwrap();
        for i in 0..5 {
            let row = format!("2024-01-01 00:0{i}:00,{i}.5,1000.0,50.0,10.0,0.0");
            append_record(&path, &row).unwrap();

            let current = fs::read(&path).unwrap();
            assert!(current.starts_with(&previous), "earlier bytes changed");
            assert_eq!(&current[previous.len()..], format!("{row}\n").as_bytes());
            previous = current;
        }

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 1 + 5);
        assert_eq!(lines[0], CSV_HEADER);
    }

    #[test]
    fn test_append_requires_existing_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("vanished.csv");

        match append_record(&path, "row") {
            Err(StoreError::Append { source, .. }) => {
                assert_eq!(source.kind(), io::ErrorKind::NotFound)
            },
            other => panic!("Expected Append error, got {other:?}"),
        }
        // 追加失败不会顺带创建文件
        assert!(!path.exists());
    }

    #[test]
    fn test_daily_store_trait_methods() {
        let tmp = TempDir::new().unwrap();
        let store = DailyStore::new(tmp.path().join("data"));
        let path = store.path_for(date(2024, 2, 29));

        assert!(store.ensure_directory().unwrap());
        assert!(store.ensure_daily_file(&path).unwrap());
        store.append_record(&path, "x").unwrap();

        let by_ref: &dyn RecordStore = &store;
        assert!(!by_ref.ensure_directory().unwrap());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            format!("{HEADER_LINE}x\n")
        );
    }
}
