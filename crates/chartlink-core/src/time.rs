use crate::error::{CoreError, Result};
use time::macros::format_description;
use time::{Date, OffsetDateTime};

pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Parses a FHIR `date` value in full calendar form (`YYYY-MM-DD`).
pub fn parse_fhir_date(s: &str) -> Result<Date> {
    Date::parse(s, format_description!("[year]-[month]-[day]"))
        .map_err(|e| CoreError::invalid_date(format!("Failed to parse FHIR date '{s}': {e}")))
}

/// Whole years between `birth` and `today`.
///
/// One year is subtracted while this year's birthday is still ahead.
/// Birth dates in the future yield 0.
pub fn age_on(birth: Date, today: Date) -> u32 {
    let mut years = today.year() - birth.year();
    if (today.month() as u8, today.day()) < (birth.month() as u8, birth.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

/// Age today for a FHIR birth date, or `None` when the value does not parse.
pub fn age_from_birth_date(birth_date: &str) -> Option<u32> {
    parse_fhir_date(birth_date)
        .ok()
        .map(|birth| age_on(birth, now_utc().date()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn test_parse_fhir_date() {
        assert_eq!(parse_fhir_date("1980-07-15").unwrap(), date!(1980 - 07 - 15));
        assert!(parse_fhir_date("1980-07").is_err());
        assert!(parse_fhir_date("15/07/1980").is_err());
        assert!(parse_fhir_date("").is_err());
    }

    #[test]
    fn test_age_birthday_already_passed() {
        assert_eq!(age_on(date!(1980 - 03 - 01), date!(2024 - 06 - 15)), 44);
    }

    #[test]
    fn test_age_birthday_not_yet_reached() {
        assert_eq!(age_on(date!(1980 - 12 - 01), date!(2024 - 06 - 15)), 43);
    }

    #[test]
    fn test_age_on_birthday() {
        assert_eq!(age_on(date!(1980 - 06 - 15), date!(2024 - 06 - 15)), 44);
        assert_eq!(age_on(date!(1980 - 06 - 16), date!(2024 - 06 - 15)), 43);
    }

    #[test]
    fn test_age_future_birth_date() {
        assert_eq!(age_on(date!(2030 - 01 - 01), date!(2024 - 06 - 15)), 0);
    }

    #[test]
    fn test_age_from_birth_date() {
        assert!(age_from_birth_date("1950-01-01").unwrap() >= 70);
        assert_eq!(age_from_birth_date("not-a-date"), None);
    }
}
