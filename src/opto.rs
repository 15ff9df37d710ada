//! Opto-isolated input accessors shared by the firmware-based cards.
//!
//! Bit masks in this module are firmware-native: channel 1 is bit 0.  Counters are only
//! advanced for the edges enabled with [`set_edge`]; encoders consume two adjacent inputs and
//! are addressed by the odd input of the pair.
use crate::bus::I2cExt;
use crate::common::{channel_bit, check_channel, check_encoder_channel, slot, Edge, MaskWidth};
use crate::map::OptoRegs;
use crate::Error;

const COUNTER_SIZE: u8 = 4;

pub(crate) fn read_mask<I: I2cExt>(
    i2c: &mut I,
    addr: u8,
    reg: u8,
    width: MaskWidth,
) -> Result<u16, Error<I::Error>> {
    match width {
        MaskWidth::U8 => i2c.read_u8(addr, reg).map(u16::from),
        MaskWidth::U16 => i2c.read_u16(addr, reg),
    }
}

pub(crate) fn update_mask<I: I2cExt>(
    i2c: &mut I,
    addr: u8,
    reg: u8,
    width: MaskWidth,
    mask_set: u16,
    mask_clear: u16,
) -> Result<(), Error<I::Error>> {
    match width {
        MaskWidth::U8 => i2c.update_u8(addr, reg, mask_set as u8, mask_clear as u8),
        MaskWidth::U16 => i2c.update_u16(addr, reg, mask_set, mask_clear),
    }
}

/// Set or clear the bit of `channel` in a firmware-native mask register.
pub(crate) fn update_bit<I: I2cExt>(
    i2c: &mut I,
    addr: u8,
    reg: u8,
    width: MaskWidth,
    channel: u8,
    state: bool,
) -> Result<(), Error<I::Error>> {
    let bit = channel_bit(channel) as u16;
    let (mask_set, mask_clear) = match state {
        true => (bit, 0),
        false => (0, bit),
    };
    update_mask(i2c, addr, reg, width, mask_set, mask_clear)
}

pub(crate) fn input<I: I2cExt>(
    i2c: &mut I,
    addr: u8,
    regs: &OptoRegs,
    channel: u8,
) -> Result<bool, Error<I::Error>> {
    check_channel("opto", channel, regs.channels)?;
    let mask = read_mask(i2c, addr, regs.input, regs.width)?;
    Ok(mask & channel_bit(channel) as u16 != 0)
}

pub(crate) fn inputs<I: I2cExt>(
    i2c: &mut I,
    addr: u8,
    regs: &OptoRegs,
) -> Result<u16, Error<I::Error>> {
    read_mask(i2c, addr, regs.input, regs.width)
}

/// Rising and falling enable masks, read in one transaction.
fn read_edge_masks<I: I2cExt>(
    i2c: &mut I,
    addr: u8,
    regs: &OptoRegs,
) -> Result<(u16, u16), Error<I::Error>> {
    match regs.width {
        MaskWidth::U8 => {
            let b: [u8; 2] = i2c.read_block(addr, regs.edge_enable)?;
            Ok((u16::from(b[0]), u16::from(b[1])))
        }
        MaskWidth::U16 => {
            let b: [u8; 4] = i2c.read_block(addr, regs.edge_enable)?;
            Ok((
                u16::from_le_bytes([b[0], b[1]]),
                u16::from_le_bytes([b[2], b[3]]),
            ))
        }
    }
}

fn write_edge_masks<I: I2cExt>(
    i2c: &mut I,
    addr: u8,
    regs: &OptoRegs,
    rising: u16,
    falling: u16,
) -> Result<(), Error<I::Error>> {
    match regs.width {
        MaskWidth::U8 => i2c.write_block(addr, regs.edge_enable, &[rising as u8, falling as u8]),
        MaskWidth::U16 => {
            let r = rising.to_le_bytes();
            let f = falling.to_le_bytes();
            i2c.write_block(addr, regs.edge_enable, &[r[0], r[1], f[0], f[1]])
        }
    }
}

pub(crate) fn edge<I: I2cExt>(
    i2c: &mut I,
    addr: u8,
    regs: &OptoRegs,
    channel: u8,
) -> Result<Edge, Error<I::Error>> {
    check_channel("opto", channel, regs.channels)?;
    let bit = channel_bit(channel) as u16;
    let (rising, falling) = read_edge_masks(i2c, addr, regs)?;
    Ok(Edge::from_bits(rising & bit != 0, falling & bit != 0))
}

/// Both directions are updated by one read of the edge block followed by one write.
pub(crate) fn set_edge<I: I2cExt>(
    i2c: &mut I,
    addr: u8,
    regs: &OptoRegs,
    channel: u8,
    edge: Edge,
) -> Result<(), Error<I::Error>> {
    check_channel("opto", channel, regs.channels)?;
    let bit = channel_bit(channel) as u16;
    let apply = |mask: u16, on: bool| match on {
        true => mask | bit,
        false => mask & !bit,
    };
    let (rising, falling) = read_edge_masks(i2c, addr, regs)?;
    write_edge_masks(
        i2c,
        addr,
        regs,
        apply(rising, edge.rising()),
        apply(falling, edge.falling()),
    )
}

pub(crate) fn counter<I: I2cExt>(
    i2c: &mut I,
    addr: u8,
    regs: &OptoRegs,
    channel: u8,
) -> Result<u32, Error<I::Error>> {
    check_channel("opto", channel, regs.channels)?;
    i2c.read_u32(addr, slot(regs.edge_count, channel, COUNTER_SIZE))
}

pub(crate) fn reset_counter<I: I2cExt>(
    i2c: &mut I,
    addr: u8,
    regs: &OptoRegs,
    channel: u8,
) -> Result<(), Error<I::Error>> {
    check_channel("opto", channel, regs.channels)?;
    i2c.write_u8(addr, regs.counter_reset, channel)
}

pub(crate) fn encoder_enabled<I: I2cExt>(
    i2c: &mut I,
    addr: u8,
    regs: &OptoRegs,
    channel: u8,
) -> Result<bool, Error<I::Error>> {
    let pair = check_encoder_channel(channel, regs.channels)?;
    let mask = i2c.read_u8(addr, regs.encoder_enable)?;
    Ok(mask & (1 << pair) != 0)
}

pub(crate) fn set_encoder<I: I2cExt>(
    i2c: &mut I,
    addr: u8,
    regs: &OptoRegs,
    channel: u8,
    enable: bool,
) -> Result<(), Error<I::Error>> {
    let pair = check_encoder_channel(channel, regs.channels)?;
    update_bit(i2c, addr, regs.encoder_enable, MaskWidth::U8, pair + 1, enable)
}

pub(crate) fn encoder_counter<I: I2cExt>(
    i2c: &mut I,
    addr: u8,
    regs: &OptoRegs,
    channel: u8,
) -> Result<i32, Error<I::Error>> {
    let pair = check_encoder_channel(channel, regs.channels)?;
    i2c.read_i32(addr, slot(regs.encoder_count, pair + 1, COUNTER_SIZE))
}

/// The firmware expects the 1-based encoder number, not the input channel.
pub(crate) fn reset_encoder_counter<I: I2cExt>(
    i2c: &mut I,
    addr: u8,
    regs: &OptoRegs,
    channel: u8,
) -> Result<(), Error<I::Error>> {
    let pair = check_encoder_channel(channel, regs.channels)?;
    i2c.write_u8(addr, regs.encoder_reset, pair + 1)
}

#[cfg(test)]
mod tests {
    use crate::common::Edge;
    use crate::map::{MULTIIO, SIXTEEN_INPUTS};
    use crate::Error;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c as mock_i2c;

    #[test]
    fn edge_configuration_16bit() {
        let regs = SIXTEEN_INPUTS.map.opto;
        let expectations = [
            // channel 10 to falling only, rising bit must be cleared
            mock_i2c::Transaction::write_read(0x27, vec![0x0c], vec![0x00, 0x02, 0x01, 0x00]),
            mock_i2c::Transaction::write(0x27, vec![0x0c, 0x00, 0x00, 0x01, 0x02]),
            mock_i2c::Transaction::write_read(0x27, vec![0x0c], vec![0x00, 0x00, 0x01, 0x02]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        super::set_edge(&mut bus, 0x27, &regs, 10, Edge::Falling).unwrap();
        assert_eq!(super::edge(&mut bus, 0x27, &regs, 10).unwrap(), Edge::Falling);

        bus.done();
    }

    #[test]
    fn clearing_falling_edge_keeps_rising() {
        let regs = MULTIIO.map.opto;
        let expectations = [
            mock_i2c::Transaction::write_read(0x0f, vec![0x2e], vec![0b0000_0100, 0b1000_0100]),
            mock_i2c::Transaction::write(0x0f, vec![0x2e, 0b0000_0100, 0b1000_0000]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        super::set_edge(&mut bus, 0x0f, &regs, 3, Edge::Rising).unwrap();

        bus.done();
    }

    #[test]
    fn failed_edge_read_writes_nothing() {
        let regs = SIXTEEN_INPUTS.map.opto;
        let expectations = [
            mock_i2c::Transaction::write_read(0x27, vec![0x0c], vec![0x01, 0x00, 0x00, 0x00])
                .with_error(ErrorKind::Other),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        assert_eq!(
            super::set_edge(&mut bus, 0x27, &regs, 1, Edge::Falling),
            Err(Error::Bus(ErrorKind::Other))
        );

        bus.done();
    }

    #[test]
    fn failed_edge_write_is_the_only_write() {
        let regs = SIXTEEN_INPUTS.map.opto;
        let expectations = [
            mock_i2c::Transaction::write_read(0x27, vec![0x0c], vec![0x01, 0x00, 0x00, 0x00]),
            mock_i2c::Transaction::write(0x27, vec![0x0c, 0x00, 0x00, 0x01, 0x00])
                .with_error(ErrorKind::Other),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        assert_eq!(
            super::set_edge(&mut bus, 0x27, &regs, 1, Edge::Falling),
            Err(Error::Bus(ErrorKind::Other))
        );

        bus.done();
    }

    #[test]
    fn counters_and_encoders() {
        let regs = SIXTEEN_INPUTS.map.opto;
        let expectations = [
            // edge counter of channel 2
            mock_i2c::Transaction::write_read(0x27, vec![0x2d], vec![0x39, 0x30, 0x00, 0x00]),
            mock_i2c::Transaction::write(0x27, vec![0x11, 0x02]),
            // encoder on inputs 3/4 is encoder 2
            mock_i2c::Transaction::write_read(0x27, vec![0x10], vec![0b0000_0001]),
            mock_i2c::Transaction::write(0x27, vec![0x10, 0b0000_0011]),
            mock_i2c::Transaction::write_read(0x27, vec![0x10], vec![0b0000_0011]),
            mock_i2c::Transaction::write_read(0x27, vec![0x6d], vec![0xfb, 0xff, 0xff, 0xff]),
            mock_i2c::Transaction::write(0x27, vec![0x12, 0x02]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        assert_eq!(super::counter(&mut bus, 0x27, &regs, 2).unwrap(), 12345);
        super::reset_counter(&mut bus, 0x27, &regs, 2).unwrap();
        super::set_encoder(&mut bus, 0x27, &regs, 3, true).unwrap();
        assert!(super::encoder_enabled(&mut bus, 0x27, &regs, 3).unwrap());
        assert_eq!(super::encoder_counter(&mut bus, 0x27, &regs, 3).unwrap(), -5);
        super::reset_encoder_counter(&mut bus, 0x27, &regs, 3).unwrap();

        bus.done();
    }

    #[test]
    fn even_encoder_channel_is_rejected() {
        let regs = MULTIIO.map.opto;
        let mut bus = mock_i2c::Mock::new(&[]);

        assert!(super::set_encoder(&mut bus, 0x0f, &regs, 4, true).is_err());
        assert!(super::encoder_counter(&mut bus, 0x0f, &regs, 8).is_err());
        assert!(super::reset_encoder_counter(&mut bus, 0x0f, &regs, 9).is_err());

        bus.done();
    }
}
