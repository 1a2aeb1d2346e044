pub mod auth;
pub mod forms;
pub mod habits;
pub mod insights;
pub mod pages;
pub mod records;

use crate::errors::AppError;
use chrono::{Datelike, Local, NaiveDate};

/// Accepted range for years supplied by clients.
const YEARS: std::ops::RangeInclusive<i32> = 1900..=9999;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// `?date=` override, or today. Dates outside the accepted years are
/// rejected before any calendar arithmetic runs.
fn reference_day(date: Option<NaiveDate>) -> Result<NaiveDate, AppError> {
    match date {
        Some(day) if !YEARS.contains(&day.year()) => Err(AppError::bad_request(format!(
            "date must fall between the years {} and {}",
            YEARS.start(),
            YEARS.end()
        ))),
        Some(day) => Ok(day),
        None => Ok(today()),
    }
}

fn check_year(year: i32) -> Result<i32, AppError> {
    if YEARS.contains(&year) {
        Ok(year)
    } else {
        Err(AppError::bad_request(format!(
            "year must be between {} and {}",
            YEARS.start(),
            YEARS.end()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_day_rejects_far_dates() {
        let far: NaiveDate = "-262143-01-01".parse().unwrap();
        assert!(matches!(reference_day(Some(far)), Err(AppError::Validation(_))));
        assert!(matches!(reference_day(Some(NaiveDate::MAX)), Err(AppError::Validation(_))));

        let day = NaiveDate::from_ymd_opt(2024, 3, 3).unwrap();
        assert_eq!(reference_day(Some(day)).unwrap(), day);
        assert_eq!(reference_day(None).unwrap(), today());
    }

    #[test]
    fn check_year_bounds() {
        assert_eq!(check_year(2026).unwrap(), 2026);
        assert!(check_year(-262143).is_err());
        assert!(check_year(10_000).is_err());
    }
}
