//! Display formatting for prices, volumes and relative changes.

use log::debug;

/// Fractional digits used when the caller has no preference.
pub const DEFAULT_DECIMAL_PLACES: usize = 4;

/// Abbreviation thresholds, checked top-down; the first match wins.
const UNITS: [(f64, &str); 4] = [
    (1_000_000_000_000.0, "T"),
    (1_000_000_000.0, "B"),
    (1_000_000.0, "M"),
    (1_000.0, "k"),
];

/// Format a number for display, abbreviating large magnitudes with k/M/B/T.
///
/// Thresholds compare against the signed value, so negative numbers are never
/// abbreviated and fall through to the grouped form (`-1,500,000.00`).
/// Values below 1,000 are rendered with a `,` thousands separator and exactly
/// `decimal_places` fractional digits.
///
/// Never fails: `NaN` renders as `"NaN"`.
#[must_use]
pub fn format_number(value: f64, decimal_places: usize) -> String {
    for (scale, suffix) in UNITS {
        if value >= scale {
            return format!("{}{suffix}", to_fixed(value / scale, decimal_places));
        }
    }
    to_grouped(value, decimal_places)
}

/// Like [`format_number`], for values that arrive as text (API fields, inputs).
/// Text that does not parse as a number formats as `"NaN"`.
#[must_use]
pub fn format_number_str(value: &str, decimal_places: usize) -> String {
    let parsed = value.trim().parse::<f64>().unwrap_or_else(|_| {
        debug!("format_number_str: '{value}' is not a number");
        f64::NAN
    });
    format_number(parsed, decimal_places)
}

/// Relative change from `old_value` to `new_value`, e.g. `"50.00%"`.
///
/// Returns `"N/A"` when `old_value` is zero.
#[must_use]
pub fn percentage_change(old_value: f64, new_value: f64) -> String {
    if old_value == 0.0 {
        return "N/A".to_string();
    }
    let change = ((new_value - old_value) / old_value) * 100.0;
    format!("{}%", to_fixed(change, 2))
}

/// Enough fractional digits to print any finite `f64` exactly.
const EXACT_FRACTION_DIGITS: usize = 1074;

/// Fixed-point rendering with JavaScript-compatible spellings for the
/// non-finite values and no sign on zero.
///
/// Rounds half away from zero on the exact binary value, so `1.125` becomes
/// `"1.13"` while `1.005` (stored as `1.00499..`) stays `"1.00"`.
fn to_fixed(value: f64, decimal_places: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let exact = format!(
        "{:.*}",
        EXACT_FRACTION_DIGITS.max(decimal_places),
        value.abs()
    );
    let (int_part, frac_part) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    let mut digits: Vec<u8> = int_part
        .bytes()
        .chain(frac_part.bytes().take(decimal_places))
        .collect();

    let round_up = frac_part
        .as_bytes()
        .get(decimal_places)
        .is_some_and(|d| *d >= b'5');
    if round_up {
        let mut carry = true;
        for d in digits.iter_mut().rev() {
            if *d == b'9' {
                *d = b'0';
            } else {
                *d += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, b'1');
        }
    }

    let int_len = digits.len() - decimal_places;
    let mut out = String::with_capacity(digits.len() + 2);
    // -0.0 is not < 0, so it prints unsigned
    if value < 0.0 {
        out.push('-');
    }
    out.extend(digits[..int_len].iter().map(|d| char::from(*d)));
    if decimal_places > 0 {
        out.push('.');
        out.extend(digits[int_len..].iter().map(|d| char::from(*d)));
    }
    out
}

/// Fixed-point rendering with `,` grouping on the integer part.
fn to_grouped(value: f64, decimal_places: usize) -> String {
    let fixed = to_fixed(value, decimal_places);
    if !value.is_finite() {
        return fixed;
    }

    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}
