use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::DomainError;

/// Parses a schedule time of day in `HH:mm` form.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, DomainError> {
    let invalid = || DomainError::InvalidTimeFormat(value.to_string());
    let (hours, minutes) = value.split_once(':').ok_or_else(invalid)?;
    let hours: u32 = hours.parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
    NaiveTime::from_hms_opt(hours, minutes, 0).ok_or_else(invalid)
}

/// The moment a train leaves on `travel_date` at `start_time`.
pub fn departure_at(travel_date: NaiveDate, start_time: &str) -> Result<NaiveDateTime, DomainError> {
    Ok(travel_date.and_time(parse_time_of_day(start_time)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_times() {
        assert_eq!(parse_time_of_day("08:05").unwrap(), NaiveTime::from_hms_opt(8, 5, 0).unwrap());
        assert_eq!(parse_time_of_day("7:30").unwrap(), NaiveTime::from_hms_opt(7, 30, 0).unwrap());
        assert_eq!(parse_time_of_day("23:59").unwrap(), NaiveTime::from_hms_opt(23, 59, 0).unwrap());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for value in ["", "0800", "08:00:00", "ab:cd", "08:", "24:00", "12:60", "-1:00"] {
            assert_eq!(
                parse_time_of_day(value),
                Err(DomainError::InvalidTimeFormat(value.to_string())),
                "{value:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_departure_at() {
        let date = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        let departure = departure_at(date, "18:45").unwrap();
        assert_eq!(departure, date.and_hms_opt(18, 45, 0).unwrap());
    }
}
