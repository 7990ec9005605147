//! Manual test of the low power modes of the CC26xx.
//!
//! The test registers an LPM module, stays awake for a while and then lets the chip go into
//! deep sleep or forces a full shutdown. Before that it prints the clock gate and pin
//! registers that decide how much current the chip draws while it sleeps.
//!
//! The LPM framework, the scheduler and the chip primitives are passed in through the traits
//! in [lpm], [event] and [platform].

#![cfg_attr(not(test), no_std)]

use embedded_io::WriteFmtError;

pub mod config;
pub mod diag;
pub mod event;
pub mod ll;
pub mod lpm;
pub mod platform;
pub mod process;
pub mod sleep;

#[cfg(test)]
mod fakes;

pub use config::{Config, TestMode};
pub use process::{run, LpmTest, State};
pub use sleep::SleepTrigger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Error<Reg, Con> {
    /// Reading a register failed
    Register(Reg),
    /// Writing to the console failed
    Console(Con),
    /// A value could not be formatted
    Fmt,
}

impl<Reg, Con> From<WriteFmtError<Con>> for Error<Reg, Con> {
    fn from(v: WriteFmtError<Con>) -> Self {
        match v {
            WriteFmtError::FmtError => Self::Fmt,
            WriteFmtError::Other(e) => Self::Console(e),
        }
    }
}
