//! Relative-date phrase rewriting.
//!
//! Queries like "executive orders from last month" are rewritten before they
//! reach the model: the relative phrase is replaced with an explicit ISO date
//! range so the model fills tool arguments with real dates instead of
//! guessing. The substitution is textual, not semantic — only the query
//! string changes.

use chrono::{Datelike, Local, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref THIS_YEAR: Regex = Regex::new(r"(?i)this year").unwrap();
    static ref LAST_MONTH: Regex = Regex::new(r"(?i)last month").unwrap();
}

/// Rewrite relative date phrases in `query` against today's local date.
pub fn resolve_relative_dates(query: &str) -> String {
    resolve_relative_dates_at(query, Local::now().date_naive())
}

/// Rewrite relative date phrases in `query` as seen from `today`.
///
/// - "this year" → `from YYYY-01-01 to YYYY-12-31`
/// - "last month" → first through last calendar day of the previous month,
///   with leap-February and January-to-December rollover handled.
///
/// Matching is case-insensitive; text without either phrase passes through
/// unchanged.
pub fn resolve_relative_dates_at(query: &str, today: NaiveDate) -> String {
    let mut rewritten = query.to_string();

    if let (Some(start), Some(end)) = (
        NaiveDate::from_ymd_opt(today.year(), 1, 1),
        NaiveDate::from_ymd_opt(today.year(), 12, 31),
    ) {
        let range = format!("from {} to {}", start, end);
        rewritten = THIS_YEAR.replace_all(&rewritten, range.as_str()).into_owned();
    }

    if let Some((start, end)) = previous_month_bounds(today) {
        let range = format!("from {} to {}", start, end);
        rewritten = LAST_MONTH.replace_all(&rewritten, range.as_str()).into_owned();
    }

    rewritten
}

/// First and last day of the calendar month before `today`'s.
fn previous_month_bounds(today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let (year, month) = if today.month() == 1 {
        (today.year() - 1, 12)
    } else {
        (today.year(), today.month() - 1)
    };
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    // The day before the first of the current month is the last of the previous one.
    let end = NaiveDate::from_ymd_opt(today.year(), today.month(), 1)?.pred_opt()?;
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(text: &str) -> NaiveDate {
        NaiveDate::parse_from_str(text, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_this_year_expands_to_full_year() {
        let rewritten =
            resolve_relative_dates_at("show me rules from this year", day("2024-03-15"));
        assert_eq!(rewritten, "show me rules from from 2024-01-01 to 2024-12-31");
    }

    #[test]
    fn test_last_month_handles_leap_february() {
        let rewritten = resolve_relative_dates_at("orders from last month", day("2024-03-15"));
        assert_eq!(rewritten, "orders from from 2024-02-01 to 2024-02-29");
    }

    #[test]
    fn test_last_month_rolls_over_the_year() {
        let rewritten = resolve_relative_dates_at("notices from last month", day("2023-01-10"));
        assert_eq!(rewritten, "notices from from 2022-12-01 to 2022-12-31");
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let rewritten = resolve_relative_dates_at("Last Month please", day("2023-05-02"));
        assert_eq!(rewritten, "from 2023-04-01 to 2023-04-30 please");
    }

    #[test]
    fn test_queries_without_phrases_pass_through() {
        let query = "rules about emissions in 2022";
        assert_eq!(resolve_relative_dates_at(query, day("2024-06-01")), query);
    }

    #[test]
    fn test_thirty_day_months() {
        let rewritten = resolve_relative_dates_at("last month", day("2023-05-20"));
        assert_eq!(rewritten, "from 2023-04-01 to 2023-04-30");
    }
}
