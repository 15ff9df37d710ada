//! Register maps and board-family configuration.
//!
//! Each board family has its own, non-interchangeable register map.  A session copies its
//! configuration at construction and never changes it afterwards.  The shipped constants
//! [`SIXTEEN_INPUTS`] and [`MULTIIO`] describe the boards as delivered; custom configurations are
//! only needed for firmware variants with a different layout.
use crate::common::{MaskWidth, StackAddressing, STACK_LEVEL_MAX};
use crate::fmt::debug;
use crate::Invalid;

/// Highest general-purpose 7-bit I2C address.
const ADDRESS_MAX: u8 = 0x77;

fn require(ok: bool, field: &'static str) -> Result<(), Invalid> {
    if !ok {
        debug!("board configuration rejected: {}", field);
        return Err(Invalid::Config { field });
    }
    Ok(())
}

/// Whether `count` slots of `stride` bytes starting at `reg` stay inside the register space.
fn fits(reg: u8, count: u8, stride: u8) -> bool {
    u16::from(reg) + u16::from(count) * u16::from(stride) <= 0x100
}

fn check_base(base: u8) -> Result<(), Invalid> {
    require(base <= ADDRESS_MAX - STACK_LEVEL_MAX, "base address")
}

/// Watchdog register block, shared by every firmware-based family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchdogRegs {
    pub reload: u8,
    pub interval_set: u8,
    pub interval_get: u8,
    pub init_interval_set: u8,
    pub init_interval_get: u8,
    pub reset_count: u8,
    pub clear_reset_count: u8,
    pub off_interval_set: u8,
    pub off_interval_get: u8,
}

impl WatchdogRegs {
    /// The block as laid out by the firmware, starting at `base`.
    pub const fn at(base: u8) -> Self {
        Self {
            reload: base,
            interval_set: base + 0x01,
            interval_get: base + 0x03,
            init_interval_set: base + 0x05,
            init_interval_get: base + 0x07,
            reset_count: base + 0x09,
            clear_reset_count: base + 0x0b,
            off_interval_set: base + 0x0c,
            off_interval_get: base + 0x10,
        }
    }
}

impl WatchdogRegs {
    fn validate(&self) -> Result<(), Invalid> {
        require(
            fits(self.reload, 1, 1)
                && fits(self.interval_set, 1, 2)
                && fits(self.interval_get, 1, 2)
                && fits(self.init_interval_set, 1, 2)
                && fits(self.init_interval_get, 1, 2)
                && fits(self.reset_count, 1, 2)
                && fits(self.clear_reset_count, 1, 1)
                && fits(self.off_interval_set, 1, 4)
                && fits(self.off_interval_get, 1, 4),
            "watchdog registers",
        )
    }
}

/// Opto-input registers: level, edge counting and quadrature encoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptoRegs {
    /// Number of opto inputs; encoders exist on every odd input below this count.
    pub channels: u8,
    /// Width of `input` and of each edge mask.  `encoder_enable` is always 8 bits.
    pub width: MaskWidth,
    pub input: u8,
    /// Rising-edge enable mask, immediately followed by the falling-edge enable mask.
    pub edge_enable: u8,
    pub counter_reset: u8,
    pub encoder_enable: u8,
    pub encoder_reset: u8,
    /// One `u32` per input.
    pub edge_count: u8,
    /// One `i32` per encoder.
    pub encoder_count: u8,
}

impl OptoRegs {
    fn validate(&self) -> Result<(), Invalid> {
        let width = match self.width {
            MaskWidth::U8 => 1,
            MaskWidth::U16 => 2,
        };
        require(
            (1..=8 * width).contains(&self.channels),
            "opto channel count",
        )?;
        require(
            fits(self.input, 1, width)
                && fits(self.edge_enable, 2, width)
                && fits(self.counter_reset, 1, 1)
                && fits(self.encoder_enable, 1, 1)
                && fits(self.encoder_reset, 1, 1)
                && fits(self.edge_count, self.channels, 4)
                && fits(self.encoder_count, self.channels / 2, 4),
            "opto registers",
        )
    }
}

/// Register map of the 16-input card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SixteenInputsMap {
    /// Active-low, [`PIN_MASK`](crate::PIN_MASK) ordered.
    pub inputs: u8,
    /// [`PIN_MASK`](crate::PIN_MASK) ordered.
    pub leds: u8,
    /// Two bits per LED, LED 1 in the lowest bits of a `u32`.
    pub led_mode: u8,
    pub power_led_mode: u8,
    pub opto: OptoRegs,
    pub interrupt_enable: u8,
    /// One `u16` in Hz per input.
    pub frequency: u8,
    /// One `u16` per input, full scale is 65535.
    pub pwm_fill: u8,
    pub wdt: WatchdogRegs,
    pub modbus: u8,
    /// Firmware revision, major then minor.
    pub revision: u8,
}

/// Configuration of a 16-input card session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SixteenInputsConfig {
    pub base_address: u8,
    pub addressing: StackAddressing,
    pub inputs: u8,
    pub leds: u8,
    pub map: SixteenInputsMap,
}

impl SixteenInputsConfig {
    /// Check that every address, channel count and register slot fits.  Sessions built with
    /// `with_config` run this first, so accessors never index past a table or a register.
    pub fn validate(&self) -> Result<(), Invalid> {
        check_base(self.base_address)?;
        require((1..=16).contains(&self.inputs), "input count")?;
        require((1..=16).contains(&self.leds), "led count")?;
        let map = &self.map;
        map.opto.validate()?;
        map.wdt.validate()?;
        require(
            fits(map.inputs, 1, 2)
                && fits(map.leds, 1, 2)
                && fits(map.led_mode, 1, 4)
                && fits(map.power_led_mode, 1, 1)
                && fits(map.interrupt_enable, 1, 2)
                && fits(map.frequency, self.inputs, 2)
                && fits(map.pwm_fill, self.inputs, 2)
                && fits(map.modbus, 1, 5)
                && fits(map.revision, 1, 2),
            "register map",
        )
    }
}

pub const SIXTEEN_INPUTS: SixteenInputsConfig = SixteenInputsConfig {
    base_address: 0x20,
    addressing: StackAddressing::Inverted,
    inputs: 16,
    leds: 16,
    map: SixteenInputsMap {
        inputs: 0x00,
        leds: 0x02,
        led_mode: 0x04,
        power_led_mode: 0x08,
        opto: OptoRegs {
            channels: 16,
            width: MaskWidth::U16,
            input: 0x0a,
            edge_enable: 0x0c,
            encoder_enable: 0x10,
            counter_reset: 0x11,
            encoder_reset: 0x12,
            edge_count: 0x29,
            encoder_count: 0x69,
        },
        interrupt_enable: 0x13,
        wdt: WatchdogRegs::at(0x15),
        frequency: 0x89,
        pwm_fill: 0xa9,
        modbus: 0xc9,
        revision: 0xce,
    },
};

/// Register map of the multi-I/O card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiIoMap {
    pub relays: u8,
    pub relay_set: u8,
    pub relay_clear: u8,
    pub leds: u8,
    pub led_set: u8,
    pub led_clear: u8,
    /// One `u16` in mV per channel.
    pub u_out: u8,
    /// One `u16` in µA per channel.
    pub i_out: u8,
    pub u_in: u8,
    pub i_in: u8,
    /// One `f32` in °C per channel.
    pub rtd_temperature: u8,
    /// One `f32` in ohm per channel.
    pub rtd_resistance: u8,
    /// One `i16` in tenths of a percent per channel.
    pub servo: u8,
    pub motor: u8,
    pub button: u8,
    pub opto: OptoRegs,
    pub calib_value: u8,
    pub calib_channel: u8,
    pub calib_status: u8,
    pub wdt: WatchdogRegs,
    pub rtc: u8,
    pub rtc_set: u8,
    /// Hardware revision, major then minor.
    pub hw_revision: u8,
    /// Firmware revision, major then minor.
    pub revision: u8,
}

/// Configuration of a multi-I/O card session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiIoConfig {
    pub base_address: u8,
    pub addressing: StackAddressing,
    pub relays: u8,
    pub leds: u8,
    pub u_in: u8,
    pub u_out: u8,
    pub i_in: u8,
    pub i_out: u8,
    pub rtd: u8,
    pub servo: u8,
    pub map: MultiIoMap,
}

impl MultiIoConfig {
    /// Check that every address, channel count and register slot fits.  Sessions built with
    /// `with_config` run this first.
    pub fn validate(&self) -> Result<(), Invalid> {
        check_base(self.base_address)?;
        require((1..=8).contains(&self.relays), "relay count")?;
        require((1..=8).contains(&self.leds), "led count")?;
        // calibration ids are allocated in one 8-bit block
        let calibrated = u16::from(self.rtd)
            + u16::from(self.u_in)
            + u16::from(self.u_out)
            + u16::from(self.i_in)
            + u16::from(self.i_out);
        require(calibrated < 0xff, "calibration channel count")?;
        let map = &self.map;
        map.opto.validate()?;
        map.wdt.validate()?;
        require(
            fits(map.u_out, self.u_out, 2)
                && fits(map.i_out, self.i_out, 2)
                && fits(map.u_in, self.u_in, 2)
                && fits(map.i_in, self.i_in, 2)
                && fits(map.rtd_temperature, self.rtd, 4)
                && fits(map.rtd_resistance, self.rtd, 4)
                && fits(map.servo, self.servo, 2)
                && fits(map.motor, 1, 2)
                && fits(map.calib_value, 1, 6)
                && fits(map.calib_channel, 1, 2)
                && fits(map.rtc, 1, 6)
                && fits(map.rtc_set, 1, 7)
                && fits(map.hw_revision, 1, 2)
                && fits(map.revision, 1, 2),
            "register map",
        )
    }
}

pub const MULTIIO: MultiIoConfig = MultiIoConfig {
    base_address: 0x06,
    addressing: StackAddressing::Inverted,
    relays: 2,
    leds: 4,
    u_in: 2,
    u_out: 2,
    i_in: 2,
    i_out: 2,
    rtd: 2,
    servo: 2,
    map: MultiIoMap {
        relays: 0x00,
        relay_set: 0x01,
        relay_clear: 0x02,
        leds: 0x04,
        led_set: 0x05,
        led_clear: 0x06,
        u_out: 0x07,
        i_out: 0x0b,
        u_in: 0x0f,
        i_in: 0x13,
        rtd_temperature: 0x17,
        rtd_resistance: 0x1f,
        servo: 0x27,
        motor: 0x2b,
        button: 0x2d,
        opto: OptoRegs {
            channels: 8,
            width: MaskWidth::U8,
            input: 0x03,
            edge_enable: 0x2e,
            counter_reset: 0x30,
            encoder_enable: 0x31,
            encoder_reset: 0x32,
            edge_count: 0x33,
            encoder_count: 0x53,
        },
        calib_value: 0x63,
        calib_channel: 0x67,
        calib_status: 0x69,
        wdt: WatchdogRegs::at(0x6a),
        rtc: 0x7e,
        rtc_set: 0x84,
        hw_revision: 0x8b,
        revision: 0x8d,
    },
};

#[cfg(test)]
mod tests {
    use crate::Invalid;

    #[test]
    fn watchdog_block_layout() {
        let wdt = super::WatchdogRegs::at(0x15);
        assert_eq!(wdt.interval_get, 0x18);
        assert_eq!(wdt.clear_reset_count, 0x20);
        assert_eq!(wdt.off_interval_get, 0x25);
        // the block ends where the edge counters start
        assert_eq!(
            wdt.off_interval_get + 4,
            super::SIXTEEN_INPUTS.map.opto.edge_count
        );
    }

    #[test]
    fn shipped_configurations_are_valid() {
        assert_eq!(super::SIXTEEN_INPUTS.validate(), Ok(()));
        assert_eq!(super::MULTIIO.validate(), Ok(()));
    }

    #[test]
    fn broken_configurations_are_rejected() {
        let mut cfg = super::SIXTEEN_INPUTS;
        cfg.inputs = 17;
        assert!(cfg.validate().is_err());

        let mut cfg = super::SIXTEEN_INPUTS;
        cfg.base_address = 0xfc;
        assert_eq!(
            cfg.validate(),
            Err(Invalid::Config {
                field: "base address"
            })
        );

        let mut cfg = super::SIXTEEN_INPUTS;
        cfg.map.pwm_fill = 0xf0;
        assert!(cfg.validate().is_err());

        let mut cfg = super::MULTIIO;
        cfg.relays = 9;
        assert!(cfg.validate().is_err());

        let mut cfg = super::MULTIIO;
        cfg.map.opto.channels = 9;
        assert!(cfg.validate().is_err());

        let mut cfg = super::MULTIIO;
        cfg.rtd = 0xff;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn multiio_slots_do_not_overlap() {
        let cfg = super::MULTIIO;
        assert_eq!(cfg.map.u_out + cfg.u_out * 2, cfg.map.i_out);
        assert_eq!(cfg.map.rtd_temperature + cfg.rtd * 4, cfg.map.rtd_resistance);
        assert_eq!(
            cfg.map.opto.edge_count + cfg.map.opto.channels * 4,
            cfg.map.opto.encoder_count
        );
        assert_eq!(cfg.map.wdt.off_interval_get + 4, cfg.map.rtc);
    }
}
