#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod actuator;
pub mod error;
pub mod node;
pub mod sensor;

pub use error::{Error, Result};
