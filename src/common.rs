use crate::fmt::debug;
use crate::Invalid;

/// Highest stack level selectable with the address jumpers.
pub const STACK_LEVEL_MAX: u8 = 7;

/// Single-bit mask per channel, most significant bit first (channel 1 is bit 15).
pub const PIN_MASK: [u16; 16] = [
    0x8000, 0x4000, 0x2000, 0x1000, 0x0800, 0x0400, 0x0200, 0x0100, 0x0080, 0x0040, 0x0020,
    0x0010, 0x0008, 0x0004, 0x0002, 0x0001,
];

/// How the jumper-selected stack level maps onto the low address bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StackAddressing {
    /// `base + (0x07 ^ stack)`: a board without jumpers answers at `base + 7`.
    Inverted,
    /// `base + stack`
    Direct,
}

impl StackAddressing {
    pub(crate) fn resolve(self, base: u8, stack: u8) -> Result<u8, Invalid> {
        check_stack(stack)?;
        Ok(match self {
            StackAddressing::Inverted => base + (STACK_LEVEL_MAX ^ stack),
            StackAddressing::Direct => base + stack,
        })
    }
}

pub(crate) fn check_stack(stack: u8) -> Result<(), Invalid> {
    if stack > STACK_LEVEL_MAX {
        debug!("stack level {} out of range", stack);
        return Err(Invalid::Stack(stack));
    }
    Ok(())
}

/// Check a 1-based channel against `1..=count`.
pub(crate) fn check_channel(field: &'static str, channel: u8, count: u8) -> Result<(), Invalid> {
    if channel < 1 || channel > count {
        debug!("{} channel {} out of range 1..={}", field, channel, count);
        return Err(Invalid::Channel { field, channel });
    }
    Ok(())
}

/// Encoders pair up adjacent inputs and are addressed by the odd (first) input of the pair.
/// Returns the 0-based pair index.
pub(crate) fn check_encoder_channel(channel: u8, inputs: u8) -> Result<u8, Invalid> {
    check_channel("encoder", channel, inputs)?;
    if channel % 2 == 0 || channel == inputs {
        debug!("encoder channel {} is not the first input of a pair", channel);
        return Err(Invalid::Channel {
            field: "encoder",
            channel,
        });
    }
    Ok((channel - 1) / 2)
}

/// Register offset of slot `channel` in an array of `stride`-byte slots.
pub(crate) fn slot(base: u8, channel: u8, stride: u8) -> u8 {
    base + (channel - 1) * stride
}

/// Firmware-native bit for a 1-based channel (channel 1 is bit 0).
pub(crate) fn channel_bit(channel: u8) -> u32 {
    1 << (channel - 1)
}

/// Reject non-finite values and values outside `min..=max`.
pub(crate) fn check_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), Invalid> {
    if !value.is_finite() || value < min || value > max {
        debug!("{} value out of range", field);
        return Err(Invalid::Value { field });
    }
    Ok(())
}

/// Width of the per-channel bit masks of a board family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MaskWidth {
    U8,
    U16,
}

/// Operating mode of a per-channel LED on the 16-input card.
///
/// The mode field is two bits wide.  Values without a name here are kept as [`LedMode::Other`]
/// when read and can be written back unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedMode {
    /// The LED follows its input.
    Auto,
    /// The LED is driven by the host via the LED register.
    Manual,
    Other(u8),
}

impl LedMode {
    pub const MASK: u8 = 0x03;

    pub fn bits(self) -> u8 {
        match self {
            LedMode::Auto => 0,
            LedMode::Manual => 1,
            LedMode::Other(v) => v,
        }
    }
}

impl From<u8> for LedMode {
    fn from(v: u8) -> Self {
        match v {
            0 => LedMode::Auto,
            1 => LedMode::Manual,
            v => LedMode::Other(v),
        }
    }
}

/// Behaviour of the power LED.  Unknown register values are kept as [`PowerLedMode::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerLedMode {
    Blink,
    Solid,
    Off,
    Other(u8),
}

impl PowerLedMode {
    pub fn bits(self) -> u8 {
        match self {
            PowerLedMode::Blink => 0,
            PowerLedMode::Solid => 1,
            PowerLedMode::Off => 2,
            PowerLedMode::Other(v) => v,
        }
    }
}

impl From<u8> for PowerLedMode {
    fn from(v: u8) -> Self {
        match v {
            0 => PowerLedMode::Blink,
            1 => PowerLedMode::Solid,
            2 => PowerLedMode::Off,
            v => PowerLedMode::Other(v),
        }
    }
}

/// Which edges of an opto input are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    None = 0,
    Rising = 1,
    Falling = 2,
    Both = 3,
}

impl Edge {
    pub fn rising(self) -> bool {
        self as u8 & 0x01 != 0
    }

    pub fn falling(self) -> bool {
        self as u8 & 0x02 != 0
    }

    pub(crate) fn from_bits(rising: bool, falling: bool) -> Self {
        match (rising, falling) {
            (false, false) => Edge::None,
            (true, false) => Edge::Rising,
            (false, true) => Edge::Falling,
            (true, true) => Edge::Both,
        }
    }
}

impl TryFrom<u8> for Edge {
    type Error = Invalid;

    fn try_from(v: u8) -> Result<Self, Invalid> {
        match v {
            0 => Ok(Edge::None),
            1 => Ok(Edge::Rising),
            2 => Ok(Edge::Falling),
            3 => Ok(Edge::Both),
            _ => Err(Invalid::Value { field: "edge" }),
        }
    }
}

/// Firmware or hardware revision as reported by the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl core::fmt::Display for Version {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.major, self.minor)
    }
}
