//! The interface to the LPM framework

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::config::WakeConfig;

/// Power modes the framework can put the chip in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum LpmMode {
    Awake = 0,
    Sleep = 1,
    DeepSleep = 2,
    Shutdown = 3,
}

impl LpmMode {
    /// The deepest mode the framework will pick on its own
    pub const MAX_SUPPORTED: Self = Self::DeepSleep;
}

/// The power domains a module needs kept on
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum Domain {
    None = 0,
    Serial = 1,
    Periph = 2,
}

/// The callbacks of an LPM module. They're called from the framework, often in interrupt context.
pub trait LpmCallbacks {
    /// The deepest mode this module allows
    fn max_mode(&self) -> LpmMode {
        LpmMode::MAX_SUPPORTED
    }

    /// Called with the mode the framework is about to enter
    fn shutdown(&self, mode: u8);

    /// Called when the chip comes back from sleep
    fn wakeup(&self);
}

/// A module registration: the callbacks and the domain they need
#[derive(Clone, Copy)]
pub struct LpmModule<'a> {
    pub callbacks: &'a (dyn LpmCallbacks + 'a),
    pub domain: Domain,
}

impl<'a> LpmModule<'a> {
    pub fn new(callbacks: &'a (dyn LpmCallbacks + 'a), domain: Domain) -> Self {
        Self { callbacks, domain }
    }
}

pub trait LowPowerFramework<'a> {
    /// Register the module. There is no way to take it out again.
    fn register_module(&mut self, module: LpmModule<'a>);

    /// Shut the chip down and only wake on the given pin.
    ///
    /// Waking from shutdown resets the chip, so this should never return.
    fn shutdown(&mut self, wake: &WakeConfig);
}
