//! Number formatting for card text

/// Formats a metric value for display.
///
/// Integers get thousands separators, fractional values keep one decimal and
/// magnitudes of a million or more use a compact `M` suffix.
///
/// # Examples
///
/// ```
/// use progress_card::layout::format_value;
///
/// assert_eq!(format_value(1234.0), "1,234");
/// assert_eq!(format_value(12.345), "12.3");
/// assert_eq!(format_value(1_240_000.0), "1.2M");
/// ```
pub fn format_value(value: f64) -> String {
  // Compare after rounding to the displayed precision.
  if ((value * 10.0).round() / 10.0).abs() >= 1_000_000.0 {
    let compact = format!("{:.1}", value / 1_000_000.0);
    let compact = compact.strip_suffix(".0").unwrap_or(&compact);
    return format!("{compact}M");
  }

  let rounded = format!("{:.1}", value);
  let (int_part, frac_part) = rounded.split_once('.').unwrap_or((&rounded, "0"));
  let (sign, digits) = match int_part.strip_prefix('-') {
    Some(digits) => ("-", digits),
    None => ("", int_part),
  };

  let mut out = String::with_capacity(rounded.len() + digits.len() / 3);
  if digits.bytes().any(|b| b != b'0') || frac_part != "0" {
    out.push_str(sign);
  }
  out.push_str(&group_thousands(digits));
  if frac_part != "0" {
    out.push('.');
    out.push_str(frac_part);
  }
  out
}

/// `current / target unit`, or `current unit` without a target
pub fn format_value_text(current: f64, target: Option<f64>, unit: &str) -> String {
  let mut text = format_value(current);
  if let Some(target) = target {
    text.push_str(" / ");
    text.push_str(&format_value(target));
  }
  let unit = unit.trim();
  if !unit.is_empty() {
    text.push(' ');
    text.push_str(unit);
  }
  text
}

/// Whole-number percentage of a fraction in `[0, 1]`
pub fn format_percent(fraction: f64) -> String {
  format!("{}%", (fraction.clamp(0.0, 1.0) * 100.0).round() as u32)
}

fn group_thousands(digits: &str) -> String {
  let len = digits.len();
  let mut out = String::with_capacity(len + len / 3);
  for (i, ch) in digits.chars().enumerate() {
    if i > 0 && (len - i) % 3 == 0 {
      out.push(',');
    }
    out.push(ch);
  }
  out
}
