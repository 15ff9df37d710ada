use embedded_hal::i2c as hal_i2c;

use crate::fmt::{trace, warning};
use crate::{Error, Invalid};

/// Largest payload a single block write carries, excluding the register byte.
pub const MAX_BLOCK: usize = 8;

/// Blanket trait for types implementing `i2c::I2c`
pub trait I2cBus: hal_i2c::I2c {
    type BusError: From<<Self as hal_i2c::ErrorType>::Error>;
}

impl<T, E> I2cBus for T
where
    T: hal_i2c::I2c<Error = E>,
{
    type BusError = E;
}

/// Register-level transactions.  Every method is exactly one bus transaction except the
/// `update_*` family, which is a read followed by a write with no rollback.
pub(crate) trait I2cExt {
    type Error;

    fn read_block<const N: usize>(&mut self, addr: u8, reg: u8)
        -> Result<[u8; N], Error<Self::Error>>;
    fn write_block(&mut self, addr: u8, reg: u8, data: &[u8]) -> Result<(), Error<Self::Error>>;

    fn read_u8(&mut self, addr: u8, reg: u8) -> Result<u8, Error<Self::Error>> {
        self.read_block::<1>(addr, reg).map(|b| b[0])
    }
    fn read_u16(&mut self, addr: u8, reg: u8) -> Result<u16, Error<Self::Error>> {
        self.read_block(addr, reg).map(u16::from_le_bytes)
    }
    fn read_i16(&mut self, addr: u8, reg: u8) -> Result<i16, Error<Self::Error>> {
        self.read_block(addr, reg).map(i16::from_le_bytes)
    }
    fn read_u32(&mut self, addr: u8, reg: u8) -> Result<u32, Error<Self::Error>> {
        self.read_block(addr, reg).map(u32::from_le_bytes)
    }
    fn read_i32(&mut self, addr: u8, reg: u8) -> Result<i32, Error<Self::Error>> {
        self.read_block(addr, reg).map(i32::from_le_bytes)
    }
    fn read_f32(&mut self, addr: u8, reg: u8) -> Result<f32, Error<Self::Error>> {
        self.read_block(addr, reg).map(f32::from_le_bytes)
    }

    fn write_u8(&mut self, addr: u8, reg: u8, value: u8) -> Result<(), Error<Self::Error>> {
        self.write_block(addr, reg, &[value])
    }
    fn write_u16(&mut self, addr: u8, reg: u8, value: u16) -> Result<(), Error<Self::Error>> {
        self.write_block(addr, reg, &value.to_le_bytes())
    }
    fn write_i16(&mut self, addr: u8, reg: u8, value: i16) -> Result<(), Error<Self::Error>> {
        self.write_block(addr, reg, &value.to_le_bytes())
    }
    fn write_u32(&mut self, addr: u8, reg: u8, value: u32) -> Result<(), Error<Self::Error>> {
        self.write_block(addr, reg, &value.to_le_bytes())
    }
    fn write_i32(&mut self, addr: u8, reg: u8, value: i32) -> Result<(), Error<Self::Error>> {
        self.write_block(addr, reg, &value.to_le_bytes())
    }
    fn write_f32(&mut self, addr: u8, reg: u8, value: f32) -> Result<(), Error<Self::Error>> {
        self.write_block(addr, reg, &value.to_le_bytes())
    }

    fn update_u8(
        &mut self,
        addr: u8,
        reg: u8,
        mask_set: u8,
        mask_clear: u8,
    ) -> Result<(), Error<Self::Error>> {
        let value = self.read_u8(addr, reg)?;
        self.write_u8(addr, reg, (value & !mask_clear) | mask_set)
    }
    fn update_u16(
        &mut self,
        addr: u8,
        reg: u8,
        mask_set: u16,
        mask_clear: u16,
    ) -> Result<(), Error<Self::Error>> {
        let value = self.read_u16(addr, reg)?;
        self.write_u16(addr, reg, (value & !mask_clear) | mask_set)
    }
    fn update_u32(
        &mut self,
        addr: u8,
        reg: u8,
        mask_set: u32,
        mask_clear: u32,
    ) -> Result<(), Error<Self::Error>> {
        let value = self.read_u32(addr, reg)?;
        self.write_u32(addr, reg, (value & !mask_clear) | mask_set)
    }
}

impl<I2C: I2cBus> I2cExt for I2C {
    type Error = I2C::BusError;

    fn read_block<const N: usize>(
        &mut self,
        addr: u8,
        reg: u8,
    ) -> Result<[u8; N], Error<Self::Error>> {
        let mut buf = [0x00; N];
        trace!("i2c read {} bytes from {} reg {}", N, addr, reg);
        self.write_read(addr, &[reg], &mut buf).map_err(|e| {
            warning!("i2c read from {} reg {} failed", addr, reg);
            Error::Bus(e.into())
        })?;
        Ok(buf)
    }

    fn write_block(&mut self, addr: u8, reg: u8, data: &[u8]) -> Result<(), Error<Self::Error>> {
        let mut frame: heapless::Vec<u8, { MAX_BLOCK + 1 }> = heapless::Vec::new();
        // capacity is MAX_BLOCK + 1, the register byte always fits
        let _ = frame.push(reg);
        frame
            .extend_from_slice(data)
            .map_err(|_| Invalid::BlockLength(data.len()))?;
        trace!("i2c write {} bytes to {} reg {}", data.len(), addr, reg);
        self.write(addr, &frame).map_err(|e| {
            warning!("i2c write to {} reg {} failed", addr, reg);
            Error::Bus(e.into())
        })?;
        Ok(())
    }
}
