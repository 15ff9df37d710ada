//! Register access for stackable Raspberry Pi I2C I/O cards.
//!
//! One session type per board family owns the I2C bus and reaches every stacked board on it:
//! the stack level (0 to 7, as set with the address jumpers) is the first argument of every
//! accessor.  Arguments are validated before any transfer; a rejected call never touches the bus.
//!
//! ```
//! # use embedded_hal_mock::eh1::i2c::{Mock, Transaction};
//! # let expectations = [Transaction::write_read(0x27, vec![0x00], vec![0xfe, 0xff])];
//! # let mut i2c = Mock::new(&expectations);
//! let mut card = ioboards::SixteenInputs::new(i2c.clone());
//! assert!(card.digital_input(0, 16)?);
//! # i2c.done();
//! # Ok::<(), ioboards::Error<embedded_hal::i2c::ErrorKind>>(())
//! ```
#![cfg_attr(not(any(test, feature = "std")), no_std)]

mod fmt;

mod bus;
mod calib;
mod common;
mod error;
mod map;
mod modbus;
mod mutex;
mod opto;
mod rtc;
mod wdt;

pub mod dev;

pub use bus::{I2cBus, MAX_BLOCK};
pub use calib::{CalibrationChannel, CALIBRATION_KEY};
pub use common::{
    Edge, LedMode, MaskWidth, PowerLedMode, StackAddressing, Version, PIN_MASK, STACK_LEVEL_MAX,
};
pub use error::{Error, Invalid};
pub use map::{
    MultiIoConfig, MultiIoMap, OptoRegs, SixteenInputsConfig, SixteenInputsMap, WatchdogRegs,
    MULTIIO, SIXTEEN_INPUTS,
};
pub use modbus::{ModbusMode, ModbusSettings, Parity, StopBits};
pub use mutex::BoardMutex;
pub use rtc::{RtcTime, RTC_EPOCH_YEAR};
pub use wdt::{WDT_MAX_OFF_INTERVAL_S, WDT_RESET_COUNT_SIGNATURE, WDT_RESET_SIGNATURE};

pub use dev::multiio::MultiIo;
pub use dev::sixteen_inputs::SixteenInputs;
