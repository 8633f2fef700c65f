use crate::config::TimePrecision;
use crate::error::SheetError;

/// 將秒數格式化為 `HH:MM:SS` 或 `HH:MM:SS.mmm`
///
/// 小時至少兩位數，超過 99 小時不截斷；毫秒部分直接截斷不四捨五入。
pub fn format_timestamp(seconds: f64, precision: TimePrecision) -> Result<String, SheetError> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(SheetError::InvalidDuration(seconds));
    }

    let whole = seconds.trunc() as u64;
    let hours = whole / 3600;
    let minutes = (whole % 3600) / 60;
    let secs = whole % 60;

    let mut text = format!("{hours:02}:{minutes:02}:{secs:02}");

    if precision == TimePrecision::Millis {
        text.push('.');
        text.push_str(&millis_digits(seconds));
    }

    Ok(text)
}

/// 從十進位表示法取小數點後三位，避免 `59.999 * 1000` 之類的浮點誤差
fn millis_digits(seconds: f64) -> String {
    let repr = seconds.to_string();
    let fraction = repr.split_once('.').map_or("", |(_, f)| f);
    let mut digits: String = fraction.chars().take(3).collect();
    while digits.len() < 3 {
        digits.push('0');
    }
    digits
}
