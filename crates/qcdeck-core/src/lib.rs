#![forbid(unsafe_code)]
//! qcdeck foundations.
//!
//! Everything above this crate depends on it; it depends on nothing in the
//! workspace. Deterministic core paths must not read wall-clock time: the
//! only clock access goes through [`ports::ClockPort`].

pub mod canonical;
pub mod errors;
pub mod ports;
pub mod time;

pub const CRATE_NAME: &str = "qcdeck-core";
