//! Number format classification and Excel date serial conversion.
//!
//! Only what is needed to tell dates apart from plain numbers when reading,
//! and to write a date back as a serial when the target cell is date-styled.

use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Built-in number format codes that denote dates or times.
/// See: ECMA-376 Part 1, Section 18.8.30
pub const fn get_builtin_date_format(id: u32) -> Option<&'static str> {
    match id {
        14 => Some("mm-dd-yy"),
        15 => Some("d-mmm-yy"),
        16 => Some("d-mmm"),
        17 => Some("mmm-yy"),
        18 => Some("h:mm AM/PM"),
        19 => Some("h:mm:ss AM/PM"),
        20 => Some("h:mm"),
        21 => Some("h:mm:ss"),
        22 => Some("m/d/yy h:mm"),
        45 => Some("mm:ss"),
        46 => Some("[h]:mm:ss"),
        47 => Some("mmss.0"),
        _ => None,
    }
}

/// Check if a format code is a date/time format
pub fn is_date_format(format_code: &str) -> bool {
    let lower = format_code.to_lowercase();

    // Skip text in quotes and brackets ([Red], [$-409], ...)
    let mut in_quotes = false;
    let mut in_brackets = false;
    let mut escaped = false;
    let mut cleaned = String::new();

    for c in lower.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if !in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            '[' => in_brackets = true,
            ']' => in_brackets = false,
            _ if !in_quotes && !in_brackets => cleaned.push(c),
            _ => {}
        }
    }

    if cleaned == "general" {
        return false;
    }

    cleaned.contains('y') ||
    cleaned.contains('m') && !cleaned.contains('#') ||  // m is month if no # (number format)
    cleaned.contains('d') ||
    cleaned.contains('h') ||
    cleaned.contains('s') && cleaned.contains(':') // s is seconds if with colon
}

/// Whether a number format id (built-in or custom) formats dates.
///
/// `custom` holds the code from `<numFmts>` when the id is not built in.
pub fn is_date_format_id(id: u32, custom: Option<&str>) -> bool {
    if get_builtin_date_format(id).is_some() {
        return true;
    }
    custom.is_some_and(is_date_format)
}

fn epoch(date1904: bool) -> NaiveDateTime {
    let (y, m, d) = if date1904 { (1904, 1, 1) } else { (1899, 12, 30) };
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Convert an Excel serial to a date-time.
///
/// In the 1900 system serials below 61 sit before Excel's phantom
/// 1900-02-29 and are shifted by one day.
#[allow(clippy::cast_possible_truncation)]
pub fn serial_to_datetime(serial: f64, date1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 || serial > 2_958_466.0 {
        return None;
    }
    let mut days = serial.floor() as i64;
    let seconds = ((serial - serial.floor()) * 86_400.0).round() as i64;
    if !date1904 && days < 61 {
        days += 1;
    }
    epoch(date1904).checked_add_signed(Duration::days(days) + Duration::seconds(seconds))
}

/// Convert a date-time back to an Excel serial.
#[allow(clippy::cast_precision_loss)]
pub fn datetime_to_serial(dt: NaiveDateTime, date1904: bool) -> f64 {
    let delta = dt - epoch(date1904);
    let mut days = delta.num_days();
    if !date1904 && days < 61 {
        days -= 1;
    }
    let seconds = (delta - Duration::days(delta.num_days())).num_seconds();
    days as f64 + seconds as f64 / 86_400.0
}
