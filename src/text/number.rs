//! Locale-free numeric scanners over a byte range of a text buffer.
//!
//! The scanners skip leading whitespace and read the longest numeric prefix.
//! They never fail: the result carries the parsed value (zero when nothing
//! numeric was found) and whether the whole range was a valid literal.

/// Outcome of scanning a numeric literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scanned<T> {
    pub value: T,
    /// True when the range held exactly one literal, optionally surrounded by
    /// whitespace.
    pub complete: bool,
}

fn is_blank(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

fn skip_blank(bytes: &[u8], mut pos: usize, end: usize) -> usize {
    while pos < end && is_blank(bytes[pos]) {
        pos += 1;
    }
    pos
}

fn skip_digits(bytes: &[u8], mut pos: usize, end: usize) -> usize {
    while pos < end && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    pos
}

/// Parse an integer from `data[start..end]`, skipping leading whitespace.
pub fn parse_int(data: &str, start: usize, end: usize) -> Scanned<i32> {
    let bytes = data.as_bytes();
    let end = end.min(bytes.len());
    let mut pos = skip_blank(bytes, start.min(end), end);

    let negative = match bytes.get(pos) {
        Some(b'-') if pos < end => {
            pos += 1;
            true
        }
        Some(b'+') if pos < end => {
            pos += 1;
            false
        }
        _ => false,
    };

    let digits_start = pos;
    let mut value: i64 = 0;
    let mut overflow = false;
    while pos < end && bytes[pos].is_ascii_digit() {
        value = value * 10 + i64::from(bytes[pos] - b'0');
        if value > i64::from(i32::MAX) + 1 {
            overflow = true;
            value = i64::from(i32::MAX) + 1;
        }
        pos += 1;
    }
    let has_digits = pos > digits_start;

    let value = if negative { -value } else { value };
    let clamped = value.clamp(i64::from(i32::MIN), i64::from(i32::MAX));
    let overflow = overflow || clamped != value;

    Scanned {
        value: clamped as i32,
        complete: has_digits && !overflow && skip_blank(bytes, pos, end) == end,
    }
}

/// Parse a float from `data[start..end]`, skipping leading whitespace.
///
/// Accepts an optional sign, `.` as the decimal separator, an exponent, and a
/// trailing CIF standard uncertainty such as `50.123(4)`.
pub fn parse_float(data: &str, start: usize, end: usize) -> Scanned<f64> {
    let bytes = data.as_bytes();
    let end = end.min(bytes.len());
    let number_start = skip_blank(bytes, start.min(end), end);
    let mut pos = number_start;

    if pos < end && matches!(bytes[pos], b'-' | b'+') {
        pos += 1;
    }
    let int_start = pos;
    pos = skip_digits(bytes, pos, end);
    let mut digit_count = pos - int_start;
    if pos < end && bytes[pos] == b'.' {
        let frac_start = pos + 1;
        pos = skip_digits(bytes, frac_start, end);
        digit_count += pos - frac_start;
    }

    if digit_count == 0 {
        return Scanned {
            value: 0.0,
            complete: false,
        };
    }

    if pos < end && matches!(bytes[pos], b'e' | b'E') {
        let mut exp = pos + 1;
        if exp < end && matches!(bytes[exp], b'-' | b'+') {
            exp += 1;
        }
        let exp_digits_end = skip_digits(bytes, exp, end);
        if exp_digits_end > exp {
            pos = exp_digits_end;
        }
    }
    let number_end = pos;

    if pos < end && bytes[pos] == b'(' {
        let close = skip_digits(bytes, pos + 1, end);
        if close < end && close > pos + 1 && bytes[close] == b')' {
            pos = close + 1;
        }
    }

    let value = data
        .get(number_start..number_end)
        .and_then(|s| s.parse::<f64>().ok());

    Scanned {
        value: value.unwrap_or(0.0),
        complete: value.is_some() && skip_blank(bytes, pos, end) == end,
    }
}
