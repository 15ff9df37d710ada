//! The device module contains the session types for each of the supported board families.
//!
//! In most cases you will not need anything from here explicitly, the exposed types at the root of
//! the crate should be enough.

pub mod multiio;
pub mod sixteen_inputs;
