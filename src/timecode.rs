use chrono::{DateTime, NaiveDate, Utc};

/// Format used for session start/stop metadata values.
pub const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Calendar UTC time as reported by a device clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UtcFields {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub nanos: u32,
}

impl UtcFields {
    /// Convert to a timestamp, or `None` if the fields do not form a valid date and time,
    /// e.g., the all zero fields reported before a clock is set.
    #[must_use]
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        let date = NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )?;
        let dt = date.and_hms_nano_opt(
            u32::from(self.hour),
            u32::from(self.minute),
            u32::from(self.second),
            self.nanos,
        )?;
        Some(dt.and_utc())
    }
}

/// Format `dt` as `yyyyMMdd_hhmmss`.
#[must_use]
pub fn stamp(dt: &DateTime<Utc>) -> String {
    dt.format(STAMP_FORMAT).to_string()
}
