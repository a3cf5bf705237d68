//! Sterling to euro normalisation for project values.

pub const DEFAULT_GBP_TO_EUR: f64 = 1.17;

/// `convert_to_euros_with_rate` at the default rate.
pub fn convert_to_euros(value: &str) -> String {
    convert_to_euros_with_rate(value, DEFAULT_GBP_TO_EUR)
}

/// Converts a sterling amount such as `"£1,000"` into a whole-euro string
/// (`"€1,170"`). Values already in euros are only reformatted. Bare numbers
/// are taken as sterling. Anything that does not parse is returned unchanged.
pub fn convert_to_euros_with_rate(value: &str, rate: f64) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return value.to_string();
    }

    let upper = trimmed.to_ascii_uppercase();
    let already_euro = trimmed.contains('€') || upper.contains("EUR");

    let Some(amount) = parse_amount(trimmed) else {
        return value.to_string();
    };

    let euros = if already_euro { amount } else { amount * rate };
    format_euros(euros)
}

/// Extracts the numeric amount, honouring `k`/`m`/`bn` suffixes.
fn parse_amount(raw: &str) -> Option<f64> {
    let lowered = raw.to_ascii_lowercase();
    let body = lowered
        .trim()
        .trim_start_matches("eur")
        .trim_start_matches("gbp");
    let mut digits = String::with_capacity(body.len());
    let mut suffix = String::new();

    for ch in body.chars() {
        match ch {
            '0'..='9' | '.' | '-' => {
                if !suffix.is_empty() {
                    return None;
                }
                digits.push(ch);
            }
            ',' | ' ' | '£' | '€' => {}
            c if c.is_ascii_alphabetic() => suffix.push(c),
            _ => return None,
        }
    }

    let multiplier = match suffix.trim_start_matches("gbp").trim_start_matches("eur") {
        "" => 1.0,
        "k" => 1_000.0,
        "m" | "mn" => 1_000_000.0,
        "bn" | "b" => 1_000_000_000.0,
        _ => return None,
    };

    let amount: f64 = digits.parse().ok()?;
    amount.is_finite().then_some(amount * multiplier)
}

/// Whole euros with comma thousands separators, en-IE style.
pub fn format_euros(amount: f64) -> String {
    let rounded = amount.round() as i64;
    let sign = if rounded < 0 { "-" } else { "" };
    let digits = rounded.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}€{}", sign, grouped)
}
