//! Human-readable formatting of prediction values

/// Format a cost with thousands separators and two decimals, e.g. `Rs. 12,345.68`.
pub fn format_currency(prefix: &str, value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    if prefix.is_empty() {
        format!("{sign}{grouped}.{fraction}")
    } else {
        format!("{prefix} {sign}{grouped}.{fraction}")
    }
}

/// Format a confidence percentage, keeping at least one decimal: `82.0%`, `73.21%`.
pub fn format_percent(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}%")
    } else {
        format!("{value}%")
    }
}

/// Greedy word wrap to at most `width` characters per line.
///
/// Words longer than `width` are placed on their own line unbroken.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
