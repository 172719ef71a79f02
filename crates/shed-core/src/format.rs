//! 浮点数序列化
//!
//! 历史 CSV 归档中的数值使用"最短可往返"十进制表示：
//!
//! | 值 | 输出 |
//! |----|------|
//! | `118.0` | `118.0`（整数值保留 `.0`） |
//! | `21.7` | `21.7` |
//! | `1e16` | `1e+16` |
//! | `0.00001` | `1e-05` |
//! | NaN / ±∞ | `nan` / `inf` / `-inf` |
//!
//! 绝对值落在 `[1e-4, 1e16)` 之外（且非 0）时使用科学计数法，指数至少两位并带符号。
//! 新写入的行因此与已有归档逐字节兼容。

/// 科学计数法下界
const SCIENTIFIC_BELOW: f64 = 1e-4;
/// 科学计数法上界（含）
const SCIENTIFIC_FROM: f64 = 1e16;

/// 将一个读数格式化为 CSV 字段
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        let text = if value > 0.0 { "inf" } else { "-inf" };
        return text.to_string();
    }

    let abs = value.abs();
    if abs != 0.0 && !(SCIENTIFIC_BELOW..SCIENTIFIC_FROM).contains(&abs) {
        return format_scientific(value);
    }

    let decimal = value.to_string();
    if decimal.contains('.') {
        decimal
    } else {
        decimal + ".0"
    }
}

/// `1.5e-5` → `1.5e-05`，`1e16` → `1e+16`
fn format_scientific(value: f64) -> String {
    let raw = format!("{value:e}");
    match raw.split_once('e') {
        Some((mantissa, exponent)) => match exponent.parse::<i32>() {
            Ok(exp) => {
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{mantissa}e{sign}{:02}", exp.unsigned_abs())
            },
            Err(_) => raw,
        },
        None => raw,
    }
}
