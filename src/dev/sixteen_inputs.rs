//! Support for the 16-input card: 16 opto-isolated digital inputs with per-input LEDs, edge
//! counters, quadrature encoders, frequency/PWM measurement, a watchdog and an RS485 port.
//!
//! The digital input word at register 0 is the legacy expander-compatible view: active-low and
//! ordered by [`PIN_MASK`].  The opto registers are the firmware-native view of the same inputs.
use crate::bus::I2cExt;
use crate::common::{
    channel_bit, check_channel, slot, LedMode, MaskWidth, PowerLedMode, Version, PIN_MASK,
};
use crate::fmt::debug;
use crate::map::{SixteenInputsConfig, SIXTEEN_INPUTS};
use crate::{opto, wdt, Edge, Error, Invalid, ModbusSettings};

/// Full-scale raw value of a PWM fill register.
pub const PWM_FILL_SCALE: f32 = 65535.0;

/// Session for any number of stacked 16-input cards on one bus.
///
/// Single-bit and sub-field writes are a read followed by a write.  Two hosts (or two sessions)
/// updating the same register concurrently can lose one of the updates; wrap the session in a
/// [`BoardMutex`](crate::BoardMutex) if that matters.
pub struct SixteenInputs<I2C> {
    i2c: I2C,
    config: SixteenInputsConfig,
}

impl<I2C> SixteenInputs<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            config: SIXTEEN_INPUTS,
        }
    }

    /// Session for a firmware variant with a different register layout.  The configuration is
    /// checked with [`SixteenInputsConfig::validate`] and rejected before the session exists.
    pub fn with_config(i2c: I2C, config: SixteenInputsConfig) -> Result<Self, Invalid> {
        config.validate()?;
        Ok(Self { i2c, config })
    }

    pub fn config(&self) -> &SixteenInputsConfig {
        &self.config
    }

    /// Give the bus back.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: crate::I2cBus> SixteenInputs<I2C> {
    fn address(&self, stack: u8) -> Result<u8, Error<I2C::BusError>> {
        Ok(self
            .config
            .addressing
            .resolve(self.config.base_address, stack)?)
    }

    fn check_input(&self, channel: u8) -> Result<(), Error<I2C::BusError>> {
        Ok(check_channel("input", channel, self.config.inputs)?)
    }

    fn check_led(&self, channel: u8) -> Result<(), Error<I2C::BusError>> {
        Ok(check_channel("led", channel, self.config.leds)?)
    }

    /// State of one digital input, `true` when energized.
    pub fn digital_input(&mut self, stack: u8, channel: u8) -> Result<bool, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        self.check_input(channel)?;
        let raw = self.i2c.read_u16(addr, self.config.map.inputs)?;
        Ok(raw & PIN_MASK[usize::from(channel - 1)] == 0)
    }

    /// All digital inputs; bit `n` is input `n + 1`, set when energized.
    pub fn digital_inputs(&mut self, stack: u8) -> Result<u16, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        let raw = self.i2c.read_u16(addr, self.config.map.inputs)?;
        Ok(PIN_MASK
            .iter()
            .enumerate()
            .filter(|(_, mask)| raw & **mask == 0)
            .fold(0, |acc, (i, _)| acc | 1u16 << i))
    }

    pub fn led(&mut self, stack: u8, channel: u8) -> Result<bool, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        self.check_led(channel)?;
        let leds = self.i2c.read_u16(addr, self.config.map.leds)?;
        Ok(leds & PIN_MASK[usize::from(channel - 1)] != 0)
    }

    /// Raw LED word, [`PIN_MASK`] ordered.
    pub fn leds(&mut self, stack: u8) -> Result<u16, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        self.i2c.read_u16(addr, self.config.map.leds)
    }

    /// Switch one LED.  Only visible while the LED is in [`LedMode::Manual`].
    pub fn set_led(&mut self, stack: u8, channel: u8, on: bool) -> Result<(), Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        self.check_led(channel)?;
        let mask = PIN_MASK[usize::from(channel - 1)];
        let (mask_set, mask_clear) = match on {
            true => (mask, 0),
            false => (0, mask),
        };
        self.i2c
            .update_u16(addr, self.config.map.leds, mask_set, mask_clear)
    }

    pub fn set_leds(&mut self, stack: u8, leds: u16) -> Result<(), Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        self.i2c.write_u16(addr, self.config.map.leds, leds)
    }

    pub fn led_mode(&mut self, stack: u8, channel: u8) -> Result<LedMode, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        self.check_led(channel)?;
        let modes = self.i2c.read_u32(addr, self.config.map.led_mode)?;
        let mode = (modes >> (2 * (channel - 1))) as u8 & LedMode::MASK;
        Ok(LedMode::from(mode))
    }

    pub fn set_led_mode(
        &mut self,
        stack: u8,
        channel: u8,
        mode: LedMode,
    ) -> Result<(), Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        self.check_led(channel)?;
        if mode.bits() > LedMode::MASK {
            debug!("led mode {} does not fit the mode field", mode.bits());
            return Err(Invalid::Value { field: "led mode" }.into());
        }
        let shift = 2 * (channel - 1);
        self.i2c.update_u32(
            addr,
            self.config.map.led_mode,
            u32::from(mode.bits()) << shift,
            u32::from(LedMode::MASK) << shift,
        )
    }

    pub fn power_led_mode(&mut self, stack: u8) -> Result<PowerLedMode, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        let mode = self.i2c.read_u8(addr, self.config.map.power_led_mode)?;
        Ok(PowerLedMode::from(mode))
    }

    pub fn set_power_led_mode(
        &mut self,
        stack: u8,
        mode: PowerLedMode,
    ) -> Result<(), Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        if let PowerLedMode::Other(v) = mode {
            debug!("power led mode {} has no meaning", v);
            return Err(Invalid::Value {
                field: "power led mode",
            }
            .into());
        }
        self.i2c
            .write_u8(addr, self.config.map.power_led_mode, mode.bits())
    }

    /// Reload the watchdog, arming it if it was not running.
    pub fn wdt_reload(&mut self, stack: u8) -> Result<(), Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        wdt::reload(&mut self.i2c, addr, &self.config.map.wdt)
    }

    /// Watchdog period in seconds.
    pub fn wdt_period(&mut self, stack: u8) -> Result<u16, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        wdt::period(&mut self.i2c, addr, &self.config.map.wdt)
    }

    pub fn set_wdt_period(&mut self, stack: u8, period: u16) -> Result<(), Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        wdt::set_period(&mut self.i2c, addr, &self.config.map.wdt, period)
    }

    /// Period in seconds loaded after a power cycle, giving the Raspberry Pi time to boot.
    pub fn wdt_init_period(&mut self, stack: u8) -> Result<u16, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        wdt::init_period(&mut self.i2c, addr, &self.config.map.wdt)
    }

    pub fn set_wdt_init_period(
        &mut self,
        stack: u8,
        period: u16,
    ) -> Result<(), Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        wdt::set_init_period(&mut self.i2c, addr, &self.config.map.wdt, period)
    }

    /// How long power stays off after the watchdog fires, in seconds.
    pub fn wdt_off_period(&mut self, stack: u8) -> Result<u32, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        wdt::off_period(&mut self.i2c, addr, &self.config.map.wdt)
    }

    pub fn set_wdt_off_period(
        &mut self,
        stack: u8,
        period: u32,
    ) -> Result<(), Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        wdt::set_off_period(&mut self.i2c, addr, &self.config.map.wdt, period)
    }

    /// Number of resets the watchdog has performed.
    pub fn wdt_reset_count(&mut self, stack: u8) -> Result<u16, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        wdt::reset_count(&mut self.i2c, addr, &self.config.map.wdt)
    }

    pub fn clear_wdt_reset_count(&mut self, stack: u8) -> Result<(), Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        wdt::clear_reset_count(&mut self.i2c, addr, &self.config.map.wdt)
    }

    pub fn opto_input(&mut self, stack: u8, channel: u8) -> Result<bool, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        opto::input(&mut self.i2c, addr, &self.config.map.opto, channel)
    }

    /// All opto inputs, channel 1 in bit 0.
    pub fn opto_inputs(&mut self, stack: u8) -> Result<u16, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        opto::inputs(&mut self.i2c, addr, &self.config.map.opto)
    }

    pub fn opto_edge(&mut self, stack: u8, channel: u8) -> Result<Edge, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        opto::edge(&mut self.i2c, addr, &self.config.map.opto, channel)
    }

    pub fn set_opto_edge(
        &mut self,
        stack: u8,
        channel: u8,
        edge: Edge,
    ) -> Result<(), Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        opto::set_edge(&mut self.i2c, addr, &self.config.map.opto, channel, edge)
    }

    pub fn opto_counter(&mut self, stack: u8, channel: u8) -> Result<u32, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        opto::counter(&mut self.i2c, addr, &self.config.map.opto, channel)
    }

    pub fn reset_opto_counter(&mut self, stack: u8, channel: u8) -> Result<(), Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        opto::reset_counter(&mut self.i2c, addr, &self.config.map.opto, channel)
    }

    /// `channel` is the odd input of the encoder pair.
    pub fn opto_encoder_enabled(
        &mut self,
        stack: u8,
        channel: u8,
    ) -> Result<bool, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        opto::encoder_enabled(&mut self.i2c, addr, &self.config.map.opto, channel)
    }

    pub fn set_opto_encoder(
        &mut self,
        stack: u8,
        channel: u8,
        enable: bool,
    ) -> Result<(), Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        opto::set_encoder(&mut self.i2c, addr, &self.config.map.opto, channel, enable)
    }

    pub fn opto_encoder_counter(
        &mut self,
        stack: u8,
        channel: u8,
    ) -> Result<i32, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        opto::encoder_counter(&mut self.i2c, addr, &self.config.map.opto, channel)
    }

    pub fn reset_opto_encoder_counter(
        &mut self,
        stack: u8,
        channel: u8,
    ) -> Result<(), Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        opto::reset_encoder_counter(&mut self.i2c, addr, &self.config.map.opto, channel)
    }

    /// Signal frequency on an input, in Hz.
    pub fn opto_frequency(&mut self, stack: u8, channel: u8) -> Result<u16, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        self.check_input(channel)?;
        self.i2c
            .read_u16(addr, slot(self.config.map.frequency, channel, 2))
    }

    /// PWM fill factor of the signal on an input, in percent.
    pub fn opto_pwm_fill(&mut self, stack: u8, channel: u8) -> Result<f32, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        self.check_input(channel)?;
        let raw = self
            .i2c
            .read_u16(addr, slot(self.config.map.pwm_fill, channel, 2))?;
        Ok(f32::from(raw) / PWM_FILL_SCALE * 100.0)
    }

    pub fn interrupt_enabled(&mut self, stack: u8, channel: u8) -> Result<bool, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        self.check_input(channel)?;
        let mask = self.i2c.read_u16(addr, self.config.map.interrupt_enable)?;
        Ok(mask & channel_bit(channel) as u16 != 0)
    }

    pub fn set_interrupt(
        &mut self,
        stack: u8,
        channel: u8,
        enable: bool,
    ) -> Result<(), Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        self.check_input(channel)?;
        opto::update_bit(
            &mut self.i2c,
            addr,
            self.config.map.interrupt_enable,
            MaskWidth::U16,
            channel,
            enable,
        )
    }

    /// Interrupt enable mask, channel 1 in bit 0.
    pub fn interrupt_mask(&mut self, stack: u8) -> Result<u16, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        self.i2c.read_u16(addr, self.config.map.interrupt_enable)
    }

    pub fn set_interrupt_mask(&mut self, stack: u8, mask: u16) -> Result<(), Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        self.i2c
            .write_u16(addr, self.config.map.interrupt_enable, mask)
    }

    pub fn modbus_settings(&mut self, stack: u8) -> Result<ModbusSettings, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        let raw = self.i2c.read_block(addr, self.config.map.modbus)?;
        Ok(ModbusSettings::from_registers(raw))
    }

    pub fn set_modbus_settings(
        &mut self,
        stack: u8,
        settings: &ModbusSettings,
    ) -> Result<(), Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        let raw = settings.to_registers()?;
        self.i2c.write_block(addr, self.config.map.modbus, &raw)
    }

    pub fn firmware_version(&mut self, stack: u8) -> Result<Version, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        let [major, minor] = self.i2c.read_block(addr, self.config.map.revision)?;
        Ok(Version { major, minor })
    }
}

#[cfg(test)]
mod tests {
    use crate::{Edge, Error, Invalid, LedMode, ModbusSettings, Parity, PowerLedMode, StopBits};
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c as mock_i2c;

    #[test]
    fn digital_inputs_are_active_low() {
        let expectations = [
            // only input 1 energized (bit 15 low)
            mock_i2c::Transaction::write_read(0x27, vec![0x00], vec![0xff, 0x7f]),
            mock_i2c::Transaction::write_read(0x27, vec![0x00], vec![0xff, 0x7f]),
            // inputs 1, 9 and 16 energized on stack 7
            mock_i2c::Transaction::write_read(0x20, vec![0x00], vec![0x7e, 0x7f]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let mut card = super::SixteenInputs::new(bus.clone());
        assert!(card.digital_input(0, 1).unwrap());
        assert!(!card.digital_input(0, 2).unwrap());
        assert_eq!(card.digital_inputs(7).unwrap(), 0b1000_0001_0000_0001);

        bus.done();
    }

    #[test]
    fn out_of_range_stack_never_touches_the_bus() {
        let mut bus = mock_i2c::Mock::new(&[]);

        let mut card = super::SixteenInputs::new(bus.clone());
        for stack in 8..=u8::MAX {
            let err = Error::Invalid(Invalid::Stack(stack));
            assert_eq!(card.digital_input(stack, 1).unwrap_err(), err);
            assert_eq!(card.digital_inputs(stack).unwrap_err(), err);
            assert_eq!(card.led(stack, 1).unwrap_err(), err);
            assert_eq!(card.set_led(stack, 1, true).unwrap_err(), err);
            assert_eq!(card.set_led_mode(stack, 1, LedMode::Manual).unwrap_err(), err);
            assert_eq!(card.set_power_led_mode(stack, PowerLedMode::Off).unwrap_err(), err);
            assert_eq!(card.wdt_reload(stack).unwrap_err(), err);
            assert_eq!(card.set_wdt_period(stack, 10).unwrap_err(), err);
            assert_eq!(card.wdt_reset_count(stack).unwrap_err(), err);
            assert_eq!(card.set_opto_edge(stack, 1, Edge::Both).unwrap_err(), err);
            assert_eq!(card.opto_counter(stack, 1).unwrap_err(), err);
            assert_eq!(card.set_opto_encoder(stack, 1, true).unwrap_err(), err);
            assert_eq!(card.opto_pwm_fill(stack, 1).unwrap_err(), err);
            assert_eq!(card.set_interrupt(stack, 1, true).unwrap_err(), err);
            assert_eq!(card.firmware_version(stack).unwrap_err(), err);
        }

        bus.done();
    }

    #[test]
    fn out_of_range_channel_never_touches_the_bus() {
        let mut bus = mock_i2c::Mock::new(&[]);

        let mut card = super::SixteenInputs::new(bus.clone());
        for channel in [0, 17, 100, u8::MAX] {
            assert!(card.digital_input(0, channel).unwrap_err().is_invalid());
            assert!(card.led(0, channel).unwrap_err().is_invalid());
            assert!(card.set_led(0, channel, true).unwrap_err().is_invalid());
            assert!(card.led_mode(0, channel).unwrap_err().is_invalid());
            assert!(card.opto_input(0, channel).unwrap_err().is_invalid());
            assert!(card.opto_edge(0, channel).unwrap_err().is_invalid());
            assert!(card.reset_opto_counter(0, channel).unwrap_err().is_invalid());
            assert!(card.opto_frequency(0, channel).unwrap_err().is_invalid());
            assert!(card.interrupt_enabled(0, channel).unwrap_err().is_invalid());
        }
        assert_eq!(
            card.opto_encoder_counter(0, 2),
            Err(Error::Invalid(Invalid::Channel {
                field: "encoder",
                channel: 2
            }))
        );

        bus.done();
    }

    #[test]
    fn led_round_trip_and_isolation() {
        let expectations = [
            // LED 3 on, everything else as found
            mock_i2c::Transaction::write_read(0x26, vec![0x02], vec![0x5a, 0x85]),
            mock_i2c::Transaction::write(0x26, vec![0x02, 0x5a, 0xa5]),
            mock_i2c::Transaction::write_read(0x26, vec![0x02], vec![0x5a, 0xa5]),
            // LED 3 off again
            mock_i2c::Transaction::write_read(0x26, vec![0x02], vec![0x5a, 0xa5]),
            mock_i2c::Transaction::write(0x26, vec![0x02, 0x5a, 0x85]),
            mock_i2c::Transaction::write_read(0x26, vec![0x02], vec![0x5a, 0x85]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let mut card = super::SixteenInputs::new(bus.clone());
        card.set_led(1, 3, true).unwrap();
        assert!(card.led(1, 3).unwrap());
        card.set_led(1, 3, false).unwrap();
        assert!(!card.led(1, 3).unwrap());

        bus.done();
    }

    #[test]
    fn led_mode_fields_are_isolated() {
        let expectations = [
            // LED 1 = 1, LED 2 = 2, LED 3 = 1, LED 4 = 2
            mock_i2c::Transaction::write_read(0x27, vec![0x04], vec![0b1001_1001, 0, 0, 0]),
            mock_i2c::Transaction::write(0x27, vec![0x04, 0b1010_1001, 0, 0, 0]),
            mock_i2c::Transaction::write_read(0x27, vec![0x04], vec![0b1010_1001, 0, 0, 0]),
            // LED 16 lives in the top bits
            mock_i2c::Transaction::write_read(0x27, vec![0x04], vec![0, 0, 0, 0]),
            mock_i2c::Transaction::write(0x27, vec![0x04, 0, 0, 0, 0b0100_0000]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let mut card = super::SixteenInputs::new(bus.clone());
        card.set_led_mode(0, 3, LedMode::Other(2)).unwrap();
        assert_eq!(card.led_mode(0, 3).unwrap(), LedMode::Other(2));
        card.set_led_mode(0, 16, LedMode::Manual).unwrap();

        bus.done();
    }

    #[test]
    fn unnamed_led_modes_read_back_as_other() {
        let expectations = [
            // LED 2 holds 3, a value the firmware may use but that has no name here
            mock_i2c::Transaction::write_read(0x27, vec![0x04], vec![0b0000_1101, 0, 0, 0]),
            mock_i2c::Transaction::write_read(0x27, vec![0x04], vec![0b0000_1101, 0, 0, 0]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let mut card = super::SixteenInputs::new(bus.clone());
        assert_eq!(card.led_mode(0, 2).unwrap(), LedMode::Other(3));
        assert_eq!(card.led_mode(0, 1).unwrap(), LedMode::Manual);
        // wider than the 2-bit field, rejected without a transfer
        assert_eq!(
            card.set_led_mode(0, 1, LedMode::Other(4)),
            Err(Error::Invalid(Invalid::Value { field: "led mode" }))
        );

        bus.done();
    }

    #[test]
    fn power_led_mode() {
        let expectations = [
            mock_i2c::Transaction::write(0x27, vec![0x08, 0x02]),
            mock_i2c::Transaction::write_read(0x27, vec![0x08], vec![0x01]),
            mock_i2c::Transaction::write_read(0x27, vec![0x08], vec![0x07]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let mut card = super::SixteenInputs::new(bus.clone());
        card.set_power_led_mode(0, PowerLedMode::Off).unwrap();
        assert_eq!(card.power_led_mode(0).unwrap(), PowerLedMode::Solid);
        assert_eq!(card.power_led_mode(0).unwrap(), PowerLedMode::Other(7));
        assert!(card
            .set_power_led_mode(0, PowerLedMode::Other(5))
            .unwrap_err()
            .is_invalid());

        bus.done();
    }

    #[test]
    fn failed_read_leaves_register_untouched() {
        let expectations = [
            mock_i2c::Transaction::write_read(0x27, vec![0x02], vec![0, 0])
                .with_error(ErrorKind::Other),
            mock_i2c::Transaction::write_read(0x27, vec![0x02], vec![0x00, 0x00]),
        ];
        let bus = mock_i2c::Mock::new(&expectations);

        let mut card = super::SixteenInputs::new(bus);
        assert_eq!(
            card.set_led(0, 1, true),
            Err(Error::Bus(ErrorKind::Other))
        );
        // no write went out and the bus is still usable
        assert!(!card.led(0, 1).unwrap());
        let mut bus = card.release();

        bus.done();
    }

    #[test]
    fn frequency_pwm_and_interrupts() {
        let expectations = [
            mock_i2c::Transaction::write_read(0x27, vec![0x8b], vec![0xe8, 0x03]),
            mock_i2c::Transaction::write_read(0x27, vec![0xab], vec![0xff, 0x7f]),
            mock_i2c::Transaction::write_read(0x27, vec![0x13], vec![0x00, 0x00]),
            mock_i2c::Transaction::write(0x27, vec![0x13, 0x00, 0x80]),
            mock_i2c::Transaction::write_read(0x27, vec![0x13], vec![0x00, 0x80]),
            mock_i2c::Transaction::write(0x27, vec![0x13, 0xff, 0x00]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let mut card = super::SixteenInputs::new(bus.clone());
        assert_eq!(card.opto_frequency(0, 2).unwrap(), 1000);
        let fill = card.opto_pwm_fill(0, 2).unwrap();
        assert!((fill - 50.0).abs() < 0.01);
        card.set_interrupt(0, 16, true).unwrap();
        assert!(card.interrupt_enabled(0, 16).unwrap());
        card.set_interrupt_mask(0, 0x00ff).unwrap();

        bus.done();
    }

    #[test]
    fn modbus_and_version() {
        let expectations = [
            mock_i2c::Transaction::write(0x27, vec![0xc9, 0x80, 0x25, 0x00, 0x41, 0x01]),
            mock_i2c::Transaction::write_read(
                0x27,
                vec![0xc9],
                vec![0x00, 0x96, 0x00, 0x00, 0x01],
            ),
            mock_i2c::Transaction::write_read(0x27, vec![0xce], vec![0x01, 0x03]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let mut card = super::SixteenInputs::new(bus.clone());
        card.set_modbus_settings(0, &ModbusSettings::rtu(1, 9600, StopBits::One, Parity::None))
            .unwrap();
        assert_eq!(card.modbus_settings(0).unwrap(), ModbusSettings::disabled());
        let version = card.firmware_version(0).unwrap();
        assert_eq!((version.major, version.minor), (1, 3));

        bus.done();
    }

    #[test]
    fn failed_version_read_is_one_transaction() {
        let expectations = [
            mock_i2c::Transaction::write_read(0x27, vec![0xce], vec![0x00, 0x00])
                .with_error(ErrorKind::Other),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let mut card = super::SixteenInputs::new(bus.clone());
        assert_eq!(card.firmware_version(0), Err(Error::Bus(ErrorKind::Other)));

        bus.done();
    }

    #[test]
    fn broken_configuration_is_refused_before_any_transfer() {
        let mut bus = mock_i2c::Mock::new(&[]);

        let mut config = crate::SIXTEEN_INPUTS;
        config.inputs = 17;
        assert!(super::SixteenInputs::with_config(bus.clone(), config).is_err());

        let mut config = crate::SIXTEEN_INPUTS;
        config.base_address = 0xfc;
        assert_eq!(
            super::SixteenInputs::with_config(bus.clone(), config).err(),
            Some(Invalid::Config {
                field: "base address"
            })
        );

        let mut config = crate::SIXTEEN_INPUTS;
        config.base_address = 0x30;
        let mut card = super::SixteenInputs::with_config(bus.clone(), config).unwrap();
        assert!(card.digital_input(0, 17).unwrap_err().is_invalid());

        bus.done();
    }

    #[test]
    fn invalid_modbus_settings_are_not_written() {
        let mut bus = mock_i2c::Mock::new(&[]);

        let mut card = super::SixteenInputs::new(bus.clone());
        let settings = ModbusSettings::rtu(1, 250_000, StopBits::One, Parity::None);
        assert!(card.set_modbus_settings(0, &settings).unwrap_err().is_invalid());

        bus.done();
    }
}
