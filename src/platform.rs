//! The chip primitives the test needs besides plain register reads.
//!
//! All of these get called from the LPM callbacks as well, which run in interrupt context.
//! That's why everything takes `&self`.

use crate::config::IoId;

/// Interrupt lines the test touches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum Irq {
    /// Combined AON RTC event interrupt (`INT_AON_RTC`)
    AonRtc = 20,
}

/// The AON RTC compare/capture channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum RtcChannel {
    Ch0 = 0x1,
    Ch1 = 0x2,
    Ch2 = 0x4,
}

impl RtcChannel {
    pub const ALL: [RtcChannel; 3] = [Self::Ch0, Self::Ch1, Self::Ch2];
}

pub trait Watchdog {
    /// Stop the watchdog so it can't reset the chip while it sleeps
    fn stop(&self);
}

/// Everything that can pull the chip out of sleep
pub trait WakeSources {
    /// Disable interrupts globally.
    ///
    /// Returns true if they were already disabled.
    fn master_disable(&self) -> bool;
    fn master_enable(&self);

    fn disable_irq(&self, irq: Irq);
    fn clear_pending(&self, irq: Irq);

    fn rtc_disable(&self);
    fn rtc_event_clear(&self, channel: RtcChannel);

    /// Wait until all writes to the AON domain have gone through
    fn aon_sync(&self);
}

pub trait PinControl {
    /// Put the pin back into its default, lowest power, configuration
    fn set_default_state(&self, pin: IoId);
}

pub trait NetStack {
    /// Turn the MAC layer off
    fn mac_off(&self, keep_radio_on: bool);
}

/// All the chip primitives together
pub trait Platform: Watchdog + WakeSources + PinControl + NetStack {}

impl<T: Watchdog + WakeSources + PinControl + NetStack> Platform for T {}

impl<T: Watchdog + ?Sized> Watchdog for &T {
    fn stop(&self) {
        T::stop(self)
    }
}

impl<T: WakeSources + ?Sized> WakeSources for &T {
    fn master_disable(&self) -> bool {
        T::master_disable(self)
    }

    fn master_enable(&self) {
        T::master_enable(self)
    }

    fn disable_irq(&self, irq: Irq) {
        T::disable_irq(self, irq)
    }

    fn clear_pending(&self, irq: Irq) {
        T::clear_pending(self, irq)
    }

    fn rtc_disable(&self) {
        T::rtc_disable(self)
    }

    fn rtc_event_clear(&self, channel: RtcChannel) {
        T::rtc_event_clear(self, channel)
    }

    fn aon_sync(&self) {
        T::aon_sync(self)
    }
}

impl<T: PinControl + ?Sized> PinControl for &T {
    fn set_default_state(&self, pin: IoId) {
        T::set_default_state(self, pin)
    }
}

impl<T: NetStack + ?Sized> NetStack for &T {
    fn mac_off(&self, keep_radio_on: bool) {
        T::mac_off(self, keep_radio_on)
    }
}
