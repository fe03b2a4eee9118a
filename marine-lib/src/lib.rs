#![doc = include_str!("../README.md")]

mod error;

pub mod bits;
pub mod bytes;
pub mod ctd;
pub mod describe;
pub mod em;
pub mod pd0;
pub mod sbd;
pub mod schema;
pub mod section;
pub mod segy;
pub mod time;

pub use error::{Error, Result};
