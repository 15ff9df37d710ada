//! Support for the multi-I/O card: relays, 0-10V and 4-20mA analog I/O, RTD inputs, servo and
//! motor outputs, opto inputs, a push-button, an RTC and a watchdog.
//!
//! Relays and LEDs are switched through dedicated set/clear command registers, so single-channel
//! writes on this card are one transaction and do not race.
use chrono::NaiveDateTime;

use crate::bus::I2cExt;
use crate::calib::{self, CalibrationChannel};
use crate::common::{channel_bit, check_channel, check_range, slot, Version};
use crate::fmt::debug;
use crate::map::{MultiIoConfig, MULTIIO};
use crate::rtc::RtcTime;
use crate::{opto, wdt, Edge, Error, Invalid, CALIBRATION_KEY};

/// Raw analog values are in mV or µA.
const ANALOG_SCALE: f32 = 1000.0;
/// Servo and motor values are in tenths of a percent.
const MOTION_SCALE: f32 = 10.0;

pub const U_MIN: f32 = 0.0;
pub const U_MAX: f32 = 10.0;
pub const I_MIN: f32 = 4.0;
pub const I_MAX: f32 = 20.0;
pub const SERVO_MAX: f32 = 140.0;
pub const MOTOR_MAX: f32 = 100.0;

const BUTTON_STATE: u8 = 0x01;
const BUTTON_LATCH: u8 = 0x02;

/// Session for any number of stacked multi-I/O cards on one bus.
pub struct MultiIo<I2C> {
    i2c: I2C,
    config: MultiIoConfig,
}

impl<I2C> MultiIo<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            config: MULTIIO,
        }
    }

    /// Session for a firmware variant with a different register layout.  The configuration is
    /// checked with [`MultiIoConfig::validate`] and rejected before the session exists.
    pub fn with_config(i2c: I2C, config: MultiIoConfig) -> Result<Self, Invalid> {
        config.validate()?;
        Ok(Self { i2c, config })
    }

    pub fn config(&self) -> &MultiIoConfig {
        &self.config
    }

    /// Give the bus back.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: crate::I2cBus> MultiIo<I2C> {
    fn address(&self, stack: u8) -> Result<u8, Error<I2C::BusError>> {
        Ok(self
            .config
            .addressing
            .resolve(self.config.base_address, stack)?)
    }

    fn read_scaled(&mut self, addr: u8, reg: u8) -> Result<f32, Error<I2C::BusError>> {
        let raw = self.i2c.read_u16(addr, reg)?;
        Ok(f32::from(raw) / ANALOG_SCALE)
    }

    fn write_scaled(&mut self, addr: u8, reg: u8, value: f32) -> Result<(), Error<I2C::BusError>> {
        // range checked by the caller, the product fits
        self.i2c.write_u16(addr, reg, (value * ANALOG_SCALE) as u16)
    }

    fn write_command(
        &mut self,
        addr: u8,
        set: u8,
        clear: u8,
        channel: u8,
        on: bool,
    ) -> Result<(), Error<I2C::BusError>> {
        let reg = match on {
            true => set,
            false => clear,
        };
        self.i2c.write_u8(addr, reg, channel)
    }

    fn check_mask(&self, field: &'static str, mask: u8, count: u8) -> Result<(), Invalid> {
        if u32::from(mask) >= 1 << count {
            debug!("{} mask {} has bits beyond channel {}", field, mask, count);
            return Err(Invalid::Value { field });
        }
        Ok(())
    }

    pub fn relay(&mut self, stack: u8, channel: u8) -> Result<bool, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        check_channel("relay", channel, self.config.relays)?;
        let relays = self.i2c.read_u8(addr, self.config.map.relays)?;
        Ok(u32::from(relays) & channel_bit(channel) != 0)
    }

    /// All relays, relay 1 in bit 0.
    pub fn relays(&mut self, stack: u8) -> Result<u8, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        self.i2c.read_u8(addr, self.config.map.relays)
    }

    pub fn set_relay(&mut self, stack: u8, channel: u8, on: bool) -> Result<(), Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        check_channel("relay", channel, self.config.relays)?;
        let map = self.config.map;
        self.write_command(addr, map.relay_set, map.relay_clear, channel, on)
    }

    pub fn set_relays(&mut self, stack: u8, relays: u8) -> Result<(), Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        self.check_mask("relays", relays, self.config.relays)?;
        self.i2c.write_u8(addr, self.config.map.relays, relays)
    }

    pub fn led(&mut self, stack: u8, channel: u8) -> Result<bool, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        check_channel("led", channel, self.config.leds)?;
        let leds = self.i2c.read_u8(addr, self.config.map.leds)?;
        Ok(u32::from(leds) & channel_bit(channel) != 0)
    }

    pub fn leds(&mut self, stack: u8) -> Result<u8, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        self.i2c.read_u8(addr, self.config.map.leds)
    }

    pub fn set_led(&mut self, stack: u8, channel: u8, on: bool) -> Result<(), Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        check_channel("led", channel, self.config.leds)?;
        let map = self.config.map;
        self.write_command(addr, map.led_set, map.led_clear, channel, on)
    }

    pub fn set_leds(&mut self, stack: u8, leds: u8) -> Result<(), Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        self.check_mask("leds", leds, self.config.leds)?;
        self.i2c.write_u8(addr, self.config.map.leds, leds)
    }

    /// 0-10V input, in volts.
    pub fn u_in(&mut self, stack: u8, channel: u8) -> Result<f32, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        check_channel("u_in", channel, self.config.u_in)?;
        self.read_scaled(addr, slot(self.config.map.u_in, channel, 2))
    }

    /// 0-10V output setpoint, in volts.
    pub fn u_out(&mut self, stack: u8, channel: u8) -> Result<f32, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        check_channel("u_out", channel, self.config.u_out)?;
        self.read_scaled(addr, slot(self.config.map.u_out, channel, 2))
    }

    pub fn set_u_out(&mut self, stack: u8, channel: u8, volts: f32) -> Result<(), Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        check_channel("u_out", channel, self.config.u_out)?;
        check_range("u_out", volts, U_MIN, U_MAX)?;
        self.write_scaled(addr, slot(self.config.map.u_out, channel, 2), volts)
    }

    /// 4-20mA input, in milliamps.
    pub fn i_in(&mut self, stack: u8, channel: u8) -> Result<f32, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        check_channel("i_in", channel, self.config.i_in)?;
        self.read_scaled(addr, slot(self.config.map.i_in, channel, 2))
    }

    /// 4-20mA output setpoint, in milliamps.
    pub fn i_out(&mut self, stack: u8, channel: u8) -> Result<f32, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        check_channel("i_out", channel, self.config.i_out)?;
        self.read_scaled(addr, slot(self.config.map.i_out, channel, 2))
    }

    pub fn set_i_out(&mut self, stack: u8, channel: u8, milliamps: f32) -> Result<(), Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        check_channel("i_out", channel, self.config.i_out)?;
        check_range("i_out", milliamps, I_MIN, I_MAX)?;
        self.write_scaled(addr, slot(self.config.map.i_out, channel, 2), milliamps)
    }

    /// RTD sensor resistance, in ohm.
    pub fn rtd_resistance(&mut self, stack: u8, channel: u8) -> Result<f32, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        check_channel("rtd", channel, self.config.rtd)?;
        self.i2c
            .read_f32(addr, slot(self.config.map.rtd_resistance, channel, 4))
    }

    /// RTD temperature, in degrees Celsius.
    pub fn rtd_temperature(&mut self, stack: u8, channel: u8) -> Result<f32, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        check_channel("rtd", channel, self.config.rtd)?;
        self.i2c
            .read_f32(addr, slot(self.config.map.rtd_temperature, channel, 4))
    }

    /// Servo position in percent of full travel.
    pub fn servo(&mut self, stack: u8, channel: u8) -> Result<f32, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        check_channel("servo", channel, self.config.servo)?;
        let raw = self.i2c.read_i16(addr, slot(self.config.map.servo, channel, 2))?;
        Ok(f32::from(raw) / MOTION_SCALE)
    }

    /// Positions beyond +-100% drive the servo past its nominal range.
    pub fn set_servo(&mut self, stack: u8, channel: u8, percent: f32) -> Result<(), Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        check_channel("servo", channel, self.config.servo)?;
        check_range("servo", percent, -SERVO_MAX, SERVO_MAX)?;
        self.i2c.write_i16(
            addr,
            slot(self.config.map.servo, channel, 2),
            (percent * MOTION_SCALE) as i16,
        )
    }

    /// Motor speed in percent, negative values reverse.
    pub fn motor(&mut self, stack: u8) -> Result<f32, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        let raw = self.i2c.read_i16(addr, self.config.map.motor)?;
        Ok(f32::from(raw) / MOTION_SCALE)
    }

    pub fn set_motor(&mut self, stack: u8, percent: f32) -> Result<(), Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        check_range("motor", percent, -MOTOR_MAX, MOTOR_MAX)?;
        self.i2c
            .write_i16(addr, self.config.map.motor, (percent * MOTION_SCALE) as i16)
    }

    /// Current state of the push-button, `true` while pressed.
    pub fn button(&mut self, stack: u8) -> Result<bool, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        let state = self.i2c.read_u8(addr, self.config.map.button)?;
        Ok(state & BUTTON_STATE != 0)
    }

    /// Whether the button was pressed since the last call.  Reading clears the latch.
    pub fn button_latch(&mut self, stack: u8) -> Result<bool, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        let state = self.i2c.read_u8(addr, self.config.map.button)?;
        if state & BUTTON_LATCH == 0 {
            return Ok(false);
        }
        self.i2c
            .write_u8(addr, self.config.map.button, state & !BUTTON_LATCH)?;
        Ok(true)
    }

    pub fn rtc(&mut self, stack: u8) -> Result<RtcTime, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        let raw = self.i2c.read_block(addr, self.config.map.rtc)?;
        Ok(RtcTime::from_registers(raw))
    }

    /// Set the on-board clock.  The date is validated before anything is written.
    pub fn set_rtc(&mut self, stack: u8, time: &RtcTime) -> Result<(), Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        let r = time.to_registers()?;
        let payload = [r[0], r[1], r[2], r[3], r[4], r[5], CALIBRATION_KEY];
        self.i2c.write_block(addr, self.config.map.rtc_set, &payload)
    }

    pub fn set_rtc_datetime(
        &mut self,
        stack: u8,
        datetime: &NaiveDateTime,
    ) -> Result<(), Error<I2C::BusError>> {
        // validate the stack first so a bad stack is reported as such
        self.address(stack)?;
        let time = RtcTime::try_from(datetime)?;
        self.set_rtc(stack, &time)
    }

    /// Send one calibration point: the real value of the quantity at the channel right now,
    /// in the channel's unit.
    pub fn calibrate(
        &mut self,
        stack: u8,
        channel: CalibrationChannel,
        value: f32,
    ) -> Result<(), Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        let id = channel.id(&self.config)?;
        if !value.is_finite() {
            debug!("calibration value must be finite");
            return Err(Invalid::Value {
                field: "calibration",
            }
            .into());
        }
        let payload = calib::set_payload(id, value);
        self.i2c
            .write_block(addr, self.config.map.calib_value, &payload)
    }

    /// Drop the calibration of a channel and return it to factory values.
    pub fn reset_calibration(
        &mut self,
        stack: u8,
        channel: CalibrationChannel,
    ) -> Result<(), Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        let id = channel.id(&self.config)?;
        let payload = calib::reset_payload(id);
        self.i2c
            .write_block(addr, self.config.map.calib_channel, &payload)
    }

    /// Raw firmware status of the last calibration request.
    pub fn calibration_status(&mut self, stack: u8) -> Result<u8, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        self.i2c.read_u8(addr, self.config.map.calib_status)
    }

    pub fn wdt_reload(&mut self, stack: u8) -> Result<(), Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        wdt::reload(&mut self.i2c, addr, &self.config.map.wdt)
    }

    pub fn wdt_period(&mut self, stack: u8) -> Result<u16, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        wdt::period(&mut self.i2c, addr, &self.config.map.wdt)
    }

    pub fn set_wdt_period(&mut self, stack: u8, period: u16) -> Result<(), Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        wdt::set_period(&mut self.i2c, addr, &self.config.map.wdt, period)
    }

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

    pub fn opto_inputs(&mut self, stack: u8) -> Result<u8, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        let mask = opto::inputs(&mut self.i2c, addr, &self.config.map.opto)?;
        Ok(mask as u8)
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

    pub fn firmware_version(&mut self, stack: u8) -> Result<Version, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        let [major, minor] = self.i2c.read_block(addr, self.config.map.revision)?;
        Ok(Version { major, minor })
    }

    pub fn hardware_version(&mut self, stack: u8) -> Result<Version, Error<I2C::BusError>> {
        let addr = self.address(stack)?;
        let [major, minor] = self.i2c.read_block(addr, self.config.map.hw_revision)?;
        Ok(Version { major, minor })
    }
}
