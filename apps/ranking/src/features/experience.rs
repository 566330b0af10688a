//! Experience Calculator: total work experience in years from resume lines.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;
use tracing::debug;

use crate::models::resume::WorkExperience;

static YEARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*year").expect("years pattern is valid"));
static MONTHS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*month").expect("months pattern is valid"));

/// Full month name first, then the abbreviation ("March 2020", "Mar 2020").
/// A day is prefixed before parsing since the inputs carry none.
const MONTH_YEAR_FORMATS: [&str; 2] = ["%d %B %Y", "%d %b %Y"];

/// Total experience in years, rounded to two decimals, measured against today.
pub fn total_experience(entries: &[WorkExperience]) -> f64 {
    total_experience_at(entries, Utc::now().date_naive())
}

/// Total experience in years with an explicit "now" for open-ended ranges.
///
/// Malformed entries contribute nothing; this never fails.
pub fn total_experience_at(entries: &[WorkExperience], today: NaiveDate) -> f64 {
    let total_months: i64 = entries
        .iter()
        .filter_map(|entry| entry_months(entry, today))
        .fold(0, i64::saturating_add);

    (total_months as f64 / 12.0 * 100.0).round() / 100.0
}

fn entry_months(entry: &WorkExperience, today: NaiveDate) -> Option<i64> {
    if let Some(duration) = entry.duration.as_deref().filter(|d| !d.is_empty()) {
        return Some(duration_months(duration));
    }

    let dates = entry.dates.as_deref().filter(|d| !d.is_empty())?;
    let months = date_range_months(dates, today);
    if months.is_none() {
        debug!(dates, "skipping unparseable date range");
    }
    months
}

/// "2 years 3 months" → 27. Missing parts count as zero; oversized counts
/// saturate instead of overflowing.
fn duration_months(duration: &str) -> i64 {
    let lower = duration.to_lowercase();
    let capture = |re: &Regex| {
        re.captures(&lower)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<i64>().ok())
            .unwrap_or(0)
    };
    capture(&YEARS_RE)
        .saturating_mul(12)
        .saturating_add(capture(&MONTHS_RE))
}

/// "Jan 2020 - Present" → whole months between the two, floored at zero.
fn date_range_months(dates: &str, today: NaiveDate) -> Option<i64> {
    let normalized = dates.replace(['–', '—', '−'], "-");
    let parts: Vec<&str> = normalized.split('-').map(str::trim).collect();
    let [start, end] = parts.as_slice() else {
        return None;
    };

    let end_date = if end.to_lowercase().contains("present") {
        today
    } else {
        parse_month_year(end)?
    };
    let start_date = parse_month_year(start)?;

    let months = i64::from(end_date.year() - start_date.year()) * 12
        + (end_date.month() as i64 - start_date.month() as i64);
    Some(months.max(0))
}

fn parse_month_year(text: &str) -> Option<NaiveDate> {
    let with_day = format!("1 {text}");
    MONTH_YEAR_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&with_day, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn march_2024() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn dates(text: &str) -> WorkExperience {
        WorkExperience {
            dates: Some(text.to_string()),
            ..Default::default()
        }
    }

    fn duration(text: &str) -> WorkExperience {
        WorkExperience {
            duration: Some(text.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_present_uses_today() {
        let total = total_experience_at(&[dates("Jan 2020 - Present")], march_2024());
        assert_eq!(total, 4.17);
    }

    #[test]
    fn test_duration_years_and_months() {
        assert_eq!(total_experience_at(&[duration("2 years 3 months")], march_2024()), 2.25);
    }

    #[test]
    fn test_duration_only_months() {
        assert_eq!(total_experience_at(&[duration("18 Months")], march_2024()), 1.5);
    }

    #[test]
    fn test_duration_wins_over_dates() {
        let entry = WorkExperience {
            duration: Some("1 year".to_string()),
            dates: Some("Jan 2010 - Jan 2020".to_string()),
            ..Default::default()
        };
        assert_eq!(total_experience_at(&[entry], march_2024()), 1.0);
    }

    #[test]
    fn test_empty_duration_falls_through_to_dates() {
        let entry = WorkExperience {
            duration: Some(String::new()),
            dates: Some("March 2020 - March 2021".to_string()),
            ..Default::default()
        };
        assert_eq!(total_experience_at(&[entry], march_2024()), 1.0);
    }

    #[test]
    fn test_full_and_abbreviated_month_names() {
        let total = total_experience_at(&[dates("March 2020 - Sep 2021")], march_2024());
        assert_eq!(total, 1.5);
    }

    #[test]
    fn test_en_dash_and_em_dash_are_normalised() {
        let total = total_experience_at(
            &[dates("Jan 2022 – Jan 2023"), dates("Feb 2023 — Aug 2023")],
            march_2024(),
        );
        assert_eq!(total, 1.5);
    }

    #[test]
    fn test_malformed_ranges_contribute_nothing() {
        let entries = [
            dates("invalid"),
            dates("Jan 2020 - Feb 2020 - Mar 2020"),
            dates("Someday - Present"),
            dates("Jan 2020 - whenever"),
            WorkExperience::default(),
        ];
        assert_eq!(total_experience_at(&entries, march_2024()), 0.0);
    }

    #[test]
    fn test_negative_span_is_floored_at_zero() {
        let total = total_experience_at(
            &[dates("Jan 2023 - Jan 2022"), duration("6 months")],
            march_2024(),
        );
        assert_eq!(total, 0.5);
    }

    #[test]
    fn test_entries_accumulate() {
        let entries = [
            duration("1 year"),
            dates("Jan 2022 - Jul 2022"),
            dates("Jan 2024 - Present"),
        ];
        // 12 + 6 + 2 = 20 months
        assert_eq!(total_experience_at(&entries, march_2024()), 1.67);
    }

    #[test]
    fn test_oversized_duration_saturates() {
        let entries = [
            duration("900000000000000000 years"),
            duration("9223372036854775807 years 9223372036854775807 months"),
            dates("Jan 2020 - Present"),
        ];
        let total = total_experience_at(&entries, march_2024());
        assert!(total.is_finite());
        assert!(total > 1.0e17, "total {total}");
    }

    #[test]
    fn test_unparseable_year_count_contributes_nothing() {
        // more digits than i64 holds: the capture fails to parse and counts as zero
        let total = total_experience_at(
            &[duration("99999999999999999999 years 6 months")],
            march_2024(),
        );
        assert_eq!(total, 0.5);
    }
}
