use core::fmt;

/// Reasons an accessor refused its arguments before touching the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Invalid {
    /// Stack level outside `0..=7`.
    Stack(u8),
    /// Channel outside the bound of the named field.
    Channel {
        field: &'static str,
        channel: u8,
    },
    /// Value outside the domain of the named field.
    Value { field: &'static str },
    /// Not a real calendar date or time of day.
    Date,
    /// Block payload larger than a single transfer can carry.
    BlockLength(usize),
    /// Board configuration with a register, address or channel count that cannot work.
    Config { field: &'static str },
}

impl fmt::Display for Invalid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Invalid::Stack(s) => write!(f, "invalid stack level {} (must be 0..=7)", s),
            Invalid::Channel { field, channel } => {
                write!(f, "invalid {} channel {}", field, channel)
            }
            Invalid::Value { field } => write!(f, "{} value out of range", field),
            Invalid::Date => f.write_str("invalid calendar date or time"),
            Invalid::BlockLength(n) => write!(f, "block of {} bytes does not fit one transfer", n),
            Invalid::Config { field } => write!(f, "invalid board configuration: {}", field),
        }
    }
}

/// Error returned by every accessor.
///
/// There are exactly two kinds: the arguments were rejected before any bus access
/// ([`Error::Invalid`]), or the single bus transaction failed ([`Error::Bus`]).  A missing board
/// and a board that NAKs or garbles a transfer are indistinguishable and both end up as
/// [`Error::Bus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    Invalid(Invalid),
    Bus(E),
}

impl<E> Error<E> {
    /// The transport error, if this is a bus failure.
    pub fn bus_error(&self) -> Option<&E> {
        match self {
            Error::Bus(e) => Some(e),
            Error::Invalid(_) => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Error::Invalid(_))
    }
}

impl<E> From<Invalid> for Error<E> {
    fn from(i: Invalid) -> Self {
        Error::Invalid(i)
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Invalid(i) => fmt::Display::fmt(i, f),
            Error::Bus(e) => write!(f, "i2c communication failed: {:?}", e),
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug> std::error::Error for Error<E> {}

#[cfg(feature = "std")]
impl std::error::Error for Invalid {}
