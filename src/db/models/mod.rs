mod availability_rule;
mod booking;
mod service;
mod verification;

pub use availability_rule::*;
pub use booking::*;
pub use service::*;
pub use verification::*;

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::Time;

/// Wire format for clock times, e.g. `"09:00"`.
pub const HHMM: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]");

/// Wire format for calendar dates, e.g. `"2026-08-06"`.
pub const YMD: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn format_hhmm(time: Time) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

pub mod hhmm {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
    use time::Time;

    pub fn serialize<S: Serializer>(time: &Time, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_hhmm(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Time, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Time::parse(&raw, super::HHMM).map_err(D::Error::custom)
    }
}

pub mod ymd {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!(
            "{:04}-{:02}-{:02}",
            date.year(),
            u8::from(date.month()),
            date.day()
        ))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Date::parse(&raw, super::YMD).map_err(D::Error::custom)
    }
}
