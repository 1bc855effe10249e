// Utility functions
use chrono::NaiveDate;

/// Parses an ISO `YYYY-MM-DD` week-start date.
pub fn parse_week_date(date_str: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").ok()
}

/// Turns a snake_case identifier into a Title Case heading.
pub fn to_title_case(text: &str) -> String {
    text.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Horizontal text bar: one block per `unit` of `value`.
pub fn text_bar(value: f64, unit: f64) -> String {
    if !value.is_finite() || unit <= 0.0 {
        return String::new();
    }
    "█".repeat((value.abs() / unit) as usize)
}

pub fn banner(title: &str) -> String {
    let rule = "=".repeat(80);
    format!("{rule}\n{title}\n{rule}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_weeks_only() {
        assert_eq!(
            parse_week_date(" 2025-03-09 "),
            NaiveDate::from_ymd_opt(2025, 3, 9)
        );
        assert_eq!(parse_week_date("09/03/2025"), None);
        assert_eq!(parse_week_date("2025-13-01"), None);
    }

    #[test]
    fn title_case_from_snake_case() {
        assert_eq!(to_title_case("market_concentration"), "Market Concentration");
        assert_eq!(to_title_case("ai"), "Ai");
    }

    #[test]
    fn bars_scale_by_unit() {
        assert_eq!(text_bar(11.0, 5.0).chars().count(), 2);
        assert_eq!(text_bar(-10.0, 5.0).chars().count(), 2);
        assert!(text_bar(f64::NAN, 5.0).is_empty());
    }
}
