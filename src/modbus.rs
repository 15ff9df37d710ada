//! RS485 port settings of the 16-input card.
//!
//! The firmware can act as a Modbus RTU slave on the card's RS485 port, or leave the port to the
//! Raspberry Pi's serial interface.  The settings are a packed 5-byte record.
use modular_bitfield::prelude::*;

use crate::fmt::debug;
use crate::Invalid;

#[bitfield]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Packed {
    baud: B24,
    mode: B4,
    parity: B2,
    stop_bits: B2,
    address: B8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModbusMode {
    /// RS485 port disconnected from the card processor, usable from the Raspberry Pi.
    Disabled = 0,
    Rtu = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None = 0,
    Odd = 1,
    Even = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One = 1,
    Two = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModbusSettings {
    pub mode: ModbusMode,
    pub baud_rate: u32,
    pub parity: Parity,
    pub stop_bits: StopBits,
    /// Modbus slave id.
    pub address: u8,
}

impl ModbusSettings {
    /// Modbus RTU slave with the given id and line settings.
    pub fn rtu(address: u8, baud_rate: u32, stop_bits: StopBits, parity: Parity) -> Self {
        Self {
            mode: ModbusMode::Rtu,
            baud_rate,
            parity,
            stop_bits,
            address,
        }
    }

    /// Port released to the Raspberry Pi; line settings reset to the firmware defaults.
    pub fn disabled() -> Self {
        Self {
            mode: ModbusMode::Disabled,
            baud_rate: 38400,
            parity: Parity::None,
            stop_bits: StopBits::One,
            address: 1,
        }
    }

    pub(crate) fn to_registers(&self) -> Result<[u8; 5], Invalid> {
        if self.mode == ModbusMode::Rtu {
            if !(1..=254).contains(&self.address) {
                debug!("modbus id {} out of range", self.address);
                return Err(Invalid::Value { field: "modbus id" });
            }
            if !(1200..=115_200).contains(&self.baud_rate) {
                debug!("modbus baud rate {} out of range", self.baud_rate);
                return Err(Invalid::Value {
                    field: "modbus baud rate",
                });
            }
        }
        // the baud field is 24 bits wide even when the port is released
        if self.baud_rate > 0x00ff_ffff {
            return Err(Invalid::Value {
                field: "modbus baud rate",
            });
        }
        Ok(Packed::new()
            .with_baud(self.baud_rate)
            .with_mode(self.mode as u8)
            .with_parity(self.parity as u8)
            .with_stop_bits(self.stop_bits as u8)
            .with_address(self.address)
            .into_bytes())
    }

    /// Unknown field values decode to the nearest safe setting.
    pub(crate) fn from_registers(raw: [u8; 5]) -> Self {
        let packed = Packed::from_bytes(raw);
        Self {
            mode: match packed.mode() {
                0 => ModbusMode::Disabled,
                _ => ModbusMode::Rtu,
            },
            baud_rate: packed.baud(),
            parity: match packed.parity() {
                1 => Parity::Odd,
                2 => Parity::Even,
                _ => Parity::None,
            },
            stop_bits: match packed.stop_bits() {
                2 => StopBits::Two,
                _ => StopBits::One,
            },
            address: packed.address(),
        }
    }
}
