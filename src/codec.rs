use std::str::FromStr;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::America::New_York;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{Result, SyncError};

/// Convert comma-separated dollars with decimal cents ("1,234.56") into cents.
///
/// Callers substitute "0" for absent values; anything else that does not parse
/// is fatal, since guessing at money would corrupt balances.
pub fn cents_from(text: &str) -> Result<i64> {
    let cleaned = text.replace(',', "");
    let cleaned = cleaned.trim();
    let amount_err = || SyncError::Amount {
        value: text.to_string(),
    };
    let dollars = Decimal::from_str(cleaned)
        .or_else(|_| Decimal::from_scientific(cleaned))
        .map_err(|_| amount_err())?;
    dollars
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|c| c.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven))
        .and_then(|c| c.to_i64())
        .ok_or_else(amount_err)
}

/// Two-digit years below this belong to the 2000s, the rest to the 1900s.
const CENTURY_PIVOT: i32 = 69;

/// Parse a `DD-Mon-YY` date as the last second of that day in US Eastern time
/// and return the matching UTC instant.
pub fn datetime_from(text: &str) -> Result<DateTime<Utc>> {
    let date_err = || SyncError::Date {
        value: text.to_string(),
    };
    let (day_month, yy) = text.rsplit_once('-').ok_or_else(date_err)?;
    if yy.len() != 2 || !yy.bytes().all(|b| b.is_ascii_digit()) {
        return Err(date_err());
    }
    let yy: i32 = yy.parse().map_err(|_| date_err())?;
    let year = if yy < CENTURY_PIVOT { 2000 + yy } else { 1900 + yy };
    let end_of_day = NaiveDate::parse_from_str(&format!("{day_month}-{year}"), "%d-%b-%Y")
        .map_err(|_| date_err())?
        .and_hms_opt(23, 59, 59)
        .ok_or_else(date_err)?;
    // DST transitions happen in the small hours, so 23:59:59 is never ambiguous.
    New_York
        .from_local_datetime(&end_of_day)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(date_err)
}
