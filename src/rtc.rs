//! Real-time clock record.
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::fmt::debug;
use crate::Invalid;

/// Year stored as offset 0 in the RTC registers.
pub const RTC_EPOCH_YEAR: u16 = 2000;

/// Date and time as kept by the on-board RTC.  Seconds resolution, no timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RtcTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl RtcTime {
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    pub(crate) fn from_registers(raw: [u8; 6]) -> Self {
        Self {
            year: RTC_EPOCH_YEAR + u16::from(raw[0]),
            month: raw[1],
            day: raw[2],
            hour: raw[3],
            minute: raw[4],
            second: raw[5],
        }
    }

    /// Register layout `[year - 2000, month, day, hour, minute, second]`.
    ///
    /// Fails unless the year fits the 8-bit offset and the fields form a real date and time.
    pub(crate) fn to_registers(&self) -> Result<[u8; 6], Invalid> {
        let offset = self
            .year
            .checked_sub(RTC_EPOCH_YEAR)
            .and_then(|o| u8::try_from(o).ok())
            .ok_or_else(|| {
                debug!("rtc year {} not representable", self.year);
                Invalid::Value { field: "rtc year" }
            })?;
        if self.to_datetime().is_none() {
            debug!("rtc date/time is not a real calendar value");
            return Err(Invalid::Date);
        }
        Ok([
            offset,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
        ])
    }

    /// The same instant as a `chrono` value, or `None` if the fields do not form one.
    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )?
        .and_hms_opt(
            u32::from(self.hour),
            u32::from(self.minute),
            u32::from(self.second),
        )
    }
}

impl TryFrom<&NaiveDateTime> for RtcTime {
    type Error = Invalid;

    fn try_from(dt: &NaiveDateTime) -> Result<Self, Invalid> {
        let year = u16::try_from(dt.year()).map_err(|_| Invalid::Value { field: "rtc year" })?;
        // chrono counts a leap second as second 59 with extra nanoseconds
        Ok(Self::new(
            year,
            dt.month() as u8,
            dt.day() as u8,
            dt.hour() as u8,
            dt.minute() as u8,
            dt.second() as u8,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::RtcTime;
    use crate::Invalid;

    #[test]
    fn register_layout() {
        let t = RtcTime::new(2024, 3, 15, 10, 30, 0);
        assert_eq!(t.to_registers(), Ok([24, 3, 15, 10, 30, 0]));
        assert_eq!(RtcTime::from_registers([24, 3, 15, 10, 30, 0]), t);
    }

    #[test]
    fn calendar_is_validated() {
        assert_eq!(
            RtcTime::new(2024, 13, 1, 0, 0, 0).to_registers(),
            Err(Invalid::Date)
        );
        assert_eq!(
            RtcTime::new(2023, 2, 29, 0, 0, 0).to_registers(),
            Err(Invalid::Date)
        );
        assert!(RtcTime::new(2024, 2, 29, 23, 59, 59).to_registers().is_ok());
        assert_eq!(
            RtcTime::new(2024, 1, 1, 24, 0, 0).to_registers(),
            Err(Invalid::Date)
        );
    }

    #[test]
    fn year_must_fit_offset() {
        let field = "rtc year";
        assert_eq!(
            RtcTime::new(1999, 1, 1, 0, 0, 0).to_registers(),
            Err(Invalid::Value { field })
        );
        assert_eq!(
            RtcTime::new(2256, 1, 1, 0, 0, 0).to_registers(),
            Err(Invalid::Value { field })
        );
        assert_eq!(
            RtcTime::new(2255, 12, 31, 0, 0, 0).to_registers(),
            Ok([255, 12, 31, 0, 0, 0])
        );
    }

    #[test]
    fn chrono_conversion() {
        let dt = chrono::NaiveDate::from_ymd_opt(2031, 7, 4)
            .unwrap()
            .and_hms_opt(8, 5, 9)
            .unwrap();
        let t = RtcTime::try_from(&dt).unwrap();
        assert_eq!(t, RtcTime::new(2031, 7, 4, 8, 5, 9));
        assert_eq!(t.to_datetime(), Some(dt));
    }
}
