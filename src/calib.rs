//! Calibration payload framing for the analog channels of the multi-I/O card.
//!
//! Calibration is two-point: write the real (measured) value at two points sufficiently far
//! apart and the firmware derives gain and offset itself.  Nothing is computed or stored here.
use crate::common::check_channel;
use crate::map::MultiIoConfig;
use crate::Invalid;

/// Authorization byte the firmware requires with every calibration or RTC write.
pub const CALIBRATION_KEY: u8 = 0xaa;

/// Analog channel selected for calibration; the payload is the 1-based channel number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationChannel {
    Rtd(u8),
    UIn(u8),
    UOut(u8),
    IIn(u8),
    IOut(u8),
}

impl CalibrationChannel {
    /// Validate the channel against the card configuration and return the firmware id.
    pub(crate) fn id(self, cfg: &MultiIoConfig) -> Result<u8, Invalid> {
        // ids are allocated in blocks, in the order below
        let (field, channel, count, first) = match self {
            CalibrationChannel::Rtd(c) => ("rtd", c, cfg.rtd, 1),
            CalibrationChannel::UIn(c) => ("u_in", c, cfg.u_in, 1 + cfg.rtd),
            CalibrationChannel::UOut(c) => ("u_out", c, cfg.u_out, 1 + cfg.rtd + cfg.u_in),
            CalibrationChannel::IIn(c) => {
                ("i_in", c, cfg.i_in, 1 + cfg.rtd + cfg.u_in + cfg.u_out)
            }
            CalibrationChannel::IOut(c) => (
                "i_out",
                c,
                cfg.i_out,
                1 + cfg.rtd + cfg.u_in + cfg.u_out + cfg.i_in,
            ),
        };
        check_channel(field, channel, count)?;
        Ok(first + channel - 1)
    }
}

/// `[value as f32 LE, id, key]`, written at the calibration value register.
pub(crate) fn set_payload(id: u8, value: f32) -> [u8; 6] {
    let v = value.to_le_bytes();
    [v[0], v[1], v[2], v[3], id, CALIBRATION_KEY]
}

/// `[id, key]`, written at the calibration channel register.
pub(crate) fn reset_payload(id: u8) -> [u8; 2] {
    [id, CALIBRATION_KEY]
}

#[cfg(test)]
mod tests {
    use super::CalibrationChannel;
    use crate::map::MULTIIO;

    #[test]
    fn channel_ids() {
        assert_eq!(CalibrationChannel::Rtd(1).id(&MULTIIO), Ok(1));
        assert_eq!(CalibrationChannel::Rtd(2).id(&MULTIIO), Ok(2));
        assert_eq!(CalibrationChannel::UIn(1).id(&MULTIIO), Ok(3));
        assert_eq!(CalibrationChannel::UOut(2).id(&MULTIIO), Ok(6));
        assert_eq!(CalibrationChannel::IIn(1).id(&MULTIIO), Ok(7));
        assert_eq!(CalibrationChannel::IOut(2).id(&MULTIIO), Ok(10));
        assert!(CalibrationChannel::IOut(3).id(&MULTIIO).is_err());
        assert!(CalibrationChannel::Rtd(0).id(&MULTIIO).is_err());
    }

    #[test]
    fn payloads() {
        assert_eq!(super::set_payload(3, 2.5), [0x00, 0x00, 0x20, 0x40, 3, 0xaa]);
        assert_eq!(super::reset_payload(9), [9, 0xaa]);
    }
}
