use chrono::NaiveDate;
use serde::Serializer;

/// Day-first calendar date as it appears in query strings and JSON bodies.
pub const WIRE_FORMAT: &str = "%d/%m/%Y";

/// `None` for anything that is not a real `dd/mm/yyyy` date.
pub fn parse(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), WIRE_FORMAT).ok()
}

pub fn format(date: NaiveDate) -> String {
    date.format(WIRE_FORMAT).to_string()
}

/// For `#[serde(serialize_with = "...")]` on response fields.
pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(*date))
}
