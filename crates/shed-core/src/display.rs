//! 显示器接口
//!
//! 持久化完成之后，编排器把最新读数交给可选的显示器。
//! 显示失败只记录警告，不影响已经落盘的数据。

use std::collections::BTreeMap;
use std::io::Write;

use crate::error::DisplayError;
use crate::format::format_float;
use crate::sample::METRIC_NAMES;

/// 显示器协作者
pub trait DisplaySink {
    /// 展示一条读数
    ///
    /// # 参数
    /// - `timestamp`: `YYYY-MM-DD HH:MM:SS`
    /// - `metrics`: 指标名（CSV 列名）→ 值
    fn show(
        &mut self,
        timestamp: &str,
        metrics: &BTreeMap<&'static str, f64>,
    ) -> Result<(), DisplayError>;
}

/// 指标单位
fn unit(metric: &str) -> &'static str {
    match metric {
        "temperature" => "°C",
        "pressure" => "hPa",
        "humidity" => "%RH",
        "light" => "lux",
        _ => "",
    }
}

/// 文本面板
///
/// 把读数渲染成紧凑的多行文本，写入任意 `Write`（例如小屏幕所在的 `/dev/tty1`）：
///
/// ```text
/// 2024-01-01 08:00:02
/// temperature: 21.7 °C
/// pressure: 1013.1 hPa
/// humidity: 44.8 %RH
/// light: 118.0 lux
/// proximity: 0.0
/// ```
pub struct TextPanel<W: Write> {
    writer: W,
    clear_screen: bool,
}

impl<W: Write> TextPanel<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            clear_screen: false,
        }
    }

    /// 每次渲染前清屏并把光标移到左上角（终端设备使用）
    pub fn clear_screen(mut self, clear: bool) -> Self {
        self.clear_screen = clear;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// 渲染为文本（不含清屏序列）
    pub fn render(timestamp: &str, metrics: &BTreeMap<&'static str, f64>) -> String {
        let mut out = String::new();
        out.push_str(timestamp);
        out.push('\n');

        // 已知指标按 CSV 列顺序，其余按字母顺序附在后面
        let known = METRIC_NAMES.iter().copied().filter(|name| metrics.contains_key(name));
        let extra = metrics.keys().copied().filter(|name| !METRIC_NAMES.contains(name));

        for name in known.chain(extra) {
            let value = format_float(metrics[name]);
            let line = format!("{}: {} {}", name, value, unit(name));
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }
}

impl<W: Write> DisplaySink for TextPanel<W> {
    fn show(
        &mut self,
        timestamp: &str,
        metrics: &BTreeMap<&'static str, f64>,
    ) -> Result<(), DisplayError> {
        if self.clear_screen {
            self.writer.write_all(b"\x1b[2J\x1b[H")?;
        }
        self.writer.write_all(Self::render(timestamp, metrics).as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn metrics() -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("temperature", 21.7),
            ("pressure", 1013.1),
            ("humidity", 44.8),
            ("light", 118.0),
            ("proximity", 0.0),
        ])
    }

    #[test]
    fn test_render_layout() {
        let text = TextPanel::<Vec<u8>>::render("2024-01-01 08:00:02", &metrics());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "2024-01-01 08:00:02",
                "temperature: 21.7 °C",
                "pressure: 1013.1 hPa",
                "humidity: 44.8 %RH",
                "light: 118.0 lux",
                "proximity: 0.0",
            ]
        );
    }

    #[test]
    fn test_render_unknown_metric_after_known() {
        let mut map = metrics();
        map.insert("co2", 415.0);
        let text = TextPanel::<Vec<u8>>::render("t", &map);
        assert_eq!(text.lines().last(), Some("co2: 415.0"));
    }

    #[test]
    fn test_show_writes_and_clears() {
        let mut panel = TextPanel::new(Vec::new()).clear_screen(true);
        panel.show("2024-01-01 08:00:02", &metrics()).unwrap();
        let out = String::from_utf8(panel.into_inner()).unwrap();
        assert!(out.starts_with("\x1b[2J\x1b[H2024-01-01 08:00:02\n"));
        assert!(out.contains("humidity"));
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "panel unplugged"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_show_reports_io_error() {
        let mut panel = TextPanel::new(BrokenWriter);
        assert!(matches!(
            panel.show("t", &metrics()),
            Err(DisplayError::Io(_))
        ));
    }

    #[test]
    fn test_panel_as_boxed_sink() {
        let mut sink: Box<dyn DisplaySink> = Box::new(TextPanel::new(Vec::new()));
        sink.show("2024-01-01 08:00:02", &metrics()).unwrap();
    }
}
