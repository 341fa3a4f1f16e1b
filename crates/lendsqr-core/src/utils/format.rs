use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parse a `date_joined` value. Accepts RFC 3339, a naive
/// `YYYY-MM-DDTHH:MM:SS` timestamp, or a bare `YYYY-MM-DD` date.
pub fn parse_joined(date: &str) -> Option<NaiveDateTime> {
    let date = date.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Long form shown in the user table, e.g. `May 15, 2020 10:00 AM`.
/// Unparseable input is returned unchanged.
pub fn format_joined_long(date: &str) -> String {
    match parse_joined(date) {
        Some(dt) => dt.format("%b %-d, %Y %-I:%M %p").to_string(),
        None => date.to_string(),
    }
}

/// Short numeric form, e.g. `5/15/2020`.
pub fn format_joined_short(date: &str) -> String {
    match parse_joined(date) {
        Some(dt) => dt.format("%-m/%-d/%Y").to_string(),
        None => date.to_string(),
    }
}

/// Insert thousands separators into a run of digits.
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Format a count with thousands separators, e.g. `2,453`.
pub fn format_count(n: usize) -> String {
    group_thousands(&n.to_string())
}

/// Format an account balance string as naira with two decimals.
///
/// The stored value may already carry a `₦` sign and separators
/// (`"₦200,000"`); anything that still isn't a number is returned as-is.
pub fn format_balance(balance: &str) -> String {
    let cleaned: String = balance
        .chars()
        .filter(|c| *c != '₦' && *c != ',' && !c.is_whitespace())
        .collect();
    let Ok(amount) = cleaned.parse::<f64>() else {
        return balance.to_string();
    };
    let fixed = format!("{:.2}", amount.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}₦{}.{}", sign, group_thousands(whole), frac)
}

/// Compact display of the time left until `expiry`, e.g. `42m`, `2h`, `expired`.
pub fn format_remaining(expiry: DateTime<Utc>) -> String {
    let minutes = (expiry - Utc::now()).num_minutes();
    if minutes < 0 {
        "expired".to_string()
    } else if minutes < 1 {
        "<1m".to_string()
    } else if minutes < 60 {
        format!("{}m", minutes)
    } else {
        let hours = minutes / 60;
        let remaining_mins = minutes % 60;
        if remaining_mins >= 30 {
            // Round up: 1h 30m+ becomes 2h
            format!("{}h", hours + 1)
        } else {
            format!("{}h", hours)
        }
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_joined_forms() {
        assert_eq!(format_joined_long("2020-05-15T10:00:00Z"), "May 15, 2020 10:00 AM");
        assert_eq!(format_joined_short("2020-05-15T10:00:00Z"), "5/15/2020");
        assert_eq!(format_joined_long("2021-12-01T15:30:00"), "Dec 1, 2021 3:30 PM");
        assert_eq!(format_joined_short("2021-12-01"), "12/1/2021");
    }

    #[test]
    fn test_format_joined_unparseable_passthrough() {
        assert_eq!(format_joined_long("yesterday"), "yesterday");
        assert_eq!(format_joined_short(""), "");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(2453), "2,453");
        assert_eq!(format_count(1_000_000), "1,000,000");
    }

    #[test]
    fn test_format_balance() {
        assert_eq!(format_balance("₦200,000"), "₦200,000.00");
        assert_eq!(format_balance("1234.5"), "₦1,234.50");
        assert_eq!(format_balance("-50"), "-₦50.00");
        assert_eq!(format_balance("n/a"), "n/a");
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(Utc::now() - Duration::minutes(5)), "expired");
        assert_eq!(format_remaining(Utc::now() + Duration::seconds(90)), "1m");
        assert_eq!(format_remaining(Utc::now() + Duration::minutes(95)), "2h");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
    }
}
