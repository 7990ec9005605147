//! Build time configuration of the test

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Which low power mode gets tested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum TestMode {
    /// Let the LPM framework drop into deep sleep on its own and watch what happens
    DeepSleep,
    /// Force a full shutdown that only a pin can wake from
    Shutdown,
}

impl TestMode {
    /// The mode selected with the `shutdown` feature
    pub const BUILD: Self = if cfg!(feature = "shutdown") {
        Self::Shutdown
    } else {
        Self::DeepSleep
    };
}

/// A DIO pin number, `IOID_0` to `IOID_31`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct IoId(u8);

impl IoId {
    pub const COUNT: u8 = 32;

    pub const fn new(id: u8) -> Option<Self> {
        if id < Self::COUNT {
            Some(Self(id))
        } else {
            None
        }
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// All the pins, in order
    pub fn all() -> impl Iterator<Item = IoId> {
        (0..Self::COUNT).map(IoId)
    }
}

impl From<IoId> for u8 {
    fn from(value: IoId) -> Self {
        value.0
    }
}

/// Pull configuration of a pin, matching the `PULL_CTL` field of `IOCFG`
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u32)]
pub enum Pull {
    Down = 0x0000_2000,
    Up = 0x0000_4000,
    None = 0x0000_6000,
}

/// Wake up behaviour of a pin, matching the `WU_CFG` field of `IOCFG`
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u32)]
pub enum WakeOn {
    Never = 0x0000_0000,
    Low = 0x1000_0000,
    High = 0x1800_0000,
}

/// The pin that brings the chip back out of shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct WakeConfig {
    pub pin: IoId,
    pub pull: Pull,
    pub wake_on: WakeOn,
}

impl Default for WakeConfig {
    /// The right key of the SmartRF06 board, pressed pulls it low
    fn default() -> Self {
        Self {
            pin: IoId(19),
            pull: Pull::Up,
            wake_on: WakeOn::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Config {
    pub mode: TestMode,
    /// How long to stay awake before sleep is allowed
    pub delay_ms: u32,
    /// Reset all pins to their default state right before hard sleep
    pub disable_pins: bool,
    /// Print the progress lines that are normally kept quiet
    pub debug_print: bool,
    pub wake: WakeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: TestMode::BUILD,
            delay_ms: 10_000,
            disable_pins: cfg!(feature = "disable-pins"),
            debug_print: cfg!(feature = "debug-print"),
            wake: WakeConfig::default(),
        }
    }
}
