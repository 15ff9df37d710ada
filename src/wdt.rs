//! Watchdog accessors shared by the firmware-based cards.
//!
//! The watchdog power-cycles the Raspberry Pi if it is not reloaded within its period.  It is
//! armed by the first reload after power-up; until then the (longer) initial period applies.
use crate::bus::I2cExt;
use crate::fmt::debug;
use crate::map::WatchdogRegs;
use crate::{Error, Invalid};

/// Written to the reload register to reload (and arm) the watchdog.
pub const WDT_RESET_SIGNATURE: u8 = 0xca;
/// Written to the clear register to zero the reset counter.
pub const WDT_RESET_COUNT_SIGNATURE: u8 = 0xbe;
/// Longest power-off interval the firmware accepts (48 days), in seconds.
pub const WDT_MAX_OFF_INTERVAL_S: u32 = 48 * 24 * 3600;

fn check_period(period: u16) -> Result<(), Invalid> {
    if period == 0 {
        debug!("watchdog period must be non-zero");
        return Err(Invalid::Value {
            field: "watchdog period",
        });
    }
    Ok(())
}

pub(crate) fn reload<I: I2cExt>(i2c: &mut I, addr: u8, regs: &WatchdogRegs) -> Result<(), Error<I::Error>> {
    i2c.write_u8(addr, regs.reload, WDT_RESET_SIGNATURE)
}

pub(crate) fn period<I: I2cExt>(i2c: &mut I, addr: u8, regs: &WatchdogRegs) -> Result<u16, Error<I::Error>> {
    i2c.read_u16(addr, regs.interval_get)
}

pub(crate) fn set_period<I: I2cExt>(
    i2c: &mut I,
    addr: u8,
    regs: &WatchdogRegs,
    period: u16,
) -> Result<(), Error<I::Error>> {
    check_period(period)?;
    i2c.write_u16(addr, regs.interval_set, period)
}

pub(crate) fn init_period<I: I2cExt>(
    i2c: &mut I,
    addr: u8,
    regs: &WatchdogRegs,
) -> Result<u16, Error<I::Error>> {
    i2c.read_u16(addr, regs.init_interval_get)
}

pub(crate) fn set_init_period<I: I2cExt>(
    i2c: &mut I,
    addr: u8,
    regs: &WatchdogRegs,
    period: u16,
) -> Result<(), Error<I::Error>> {
    check_period(period)?;
    i2c.write_u16(addr, regs.init_interval_set, period)
}

pub(crate) fn off_period<I: I2cExt>(
    i2c: &mut I,
    addr: u8,
    regs: &WatchdogRegs,
) -> Result<u32, Error<I::Error>> {
    i2c.read_u32(addr, regs.off_interval_get)
}

pub(crate) fn set_off_period<I: I2cExt>(
    i2c: &mut I,
    addr: u8,
    regs: &WatchdogRegs,
    period: u32,
) -> Result<(), Error<I::Error>> {
    if period == 0 || period > WDT_MAX_OFF_INTERVAL_S {
        debug!("watchdog off period {} out of range", period);
        return Err(Invalid::Value {
            field: "watchdog off period",
        }
        .into());
    }
    i2c.write_u32(addr, regs.off_interval_set, period)
}

pub(crate) fn reset_count<I: I2cExt>(
    i2c: &mut I,
    addr: u8,
    regs: &WatchdogRegs,
) -> Result<u16, Error<I::Error>> {
    i2c.read_u16(addr, regs.reset_count)
}

pub(crate) fn clear_reset_count<I: I2cExt>(
    i2c: &mut I,
    addr: u8,
    regs: &WatchdogRegs,
) -> Result<(), Error<I::Error>> {
    i2c.write_u8(addr, regs.clear_reset_count, WDT_RESET_COUNT_SIGNATURE)
}
