//! The LPM module of the test: decides when the chip may go into hard sleep and gets it ready

use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal_async::delay::DelayNs;

use crate::{
    config::{Config, IoId},
    event::{EventId, EventQueue, EventSlot},
    lpm::{LpmCallbacks, LpmMode},
    platform::{Irq, Platform, RtcChannel},
};

/// True if the framework is about to go as deep as it can and we've waited long enough
pub fn ready_for_hard_sleep(mode: u8, timer_expired: bool) -> bool {
    mode == u8::from(LpmMode::MAX_SUPPORTED) && timer_expired
}

/// One shot timer that can be checked from interrupt context
#[derive(Debug)]
pub struct DelayTimer {
    duration_ms: u32,
    armed: AtomicBool,
    expired: AtomicBool,
}

impl DelayTimer {
    pub const fn new(duration_ms: u32) -> Self {
        Self {
            duration_ms,
            armed: AtomicBool::new(false),
            expired: AtomicBool::new(false),
        }
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::Relaxed);
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Relaxed)
    }

    pub fn expired(&self) -> bool {
        self.expired.load(Ordering::Relaxed)
    }

    /// Let the timer run out. A timer that isn't armed never does.
    pub async fn wait<D: DelayNs>(&self, delay: &mut D) {
        if !self.is_armed() {
            #[cfg(feature = "defmt-03")]
            defmt::warn!("Waiting on a delay timer that isn't armed");

            return core::future::pending().await;
        }

        delay.delay_ms(self.duration_ms).await;
        self.expired.store(true, Ordering::Relaxed);

        #[cfg(feature = "defmt-03")]
        defmt::debug!("Delay timer expired after {=u32} ms", self.duration_ms);
    }
}

/// The callbacks the test registers with the LPM framework, plus the state they share
/// with the test process.
pub struct SleepTrigger<P, Q> {
    platform: P,
    queue: Q,
    timer: DelayTimer,
    triggered: AtomicBool,
    shutdown_event: EventSlot,
    wake_event: EventSlot,
    disable_pins: bool,
}

impl<P, Q> SleepTrigger<P, Q> {
    pub const fn new(platform: P, queue: Q, config: &Config) -> Self {
        Self {
            platform,
            queue,
            timer: DelayTimer::new(config.delay_ms),
            triggered: AtomicBool::new(false),
            shutdown_event: EventSlot::new(),
            wake_event: EventSlot::new(),
            disable_pins: config.disable_pins,
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    pub fn timer(&self) -> &DelayTimer {
        &self.timer
    }

    /// True once hard sleep got triggered. It never goes back to false.
    pub fn triggered(&self) -> bool {
        self.triggered.load(Ordering::Relaxed)
    }

    /// Tell the callbacks which events to post
    pub fn bind_events(&self, shutdown: EventId, wake: EventId) {
        self.shutdown_event.set(shutdown);
        self.wake_event.set(wake);
    }

    pub fn shutdown_event(&self) -> Option<EventId> {
        self.shutdown_event.get()
    }

    pub fn wake_event(&self) -> Option<EventId> {
        self.wake_event.get()
    }

    pub fn ready_for_hard_sleep(&self, mode: u8) -> bool {
        ready_for_hard_sleep(mode, self.timer.expired())
    }
}

impl<P: Platform, Q: EventQueue> SleepTrigger<P, Q> {
    /// Called by the framework before it goes into `mode`.
    ///
    /// The first time the chip may go into hard sleep, the watchdog is stopped and all
    /// wake up sources are turned off. Every other call gets posted to the test process.
    pub fn shutdown_handler(&self, mode: u8) {
        if self.ready_for_hard_sleep(mode) && !self.triggered.swap(true, Ordering::Relaxed) {
            #[cfg(feature = "defmt-03")]
            defmt::debug!("Triggering hard sleep");

            self.platform.stop();
            self.disable_wakeups();

            if self.disable_pins {
                self.disable_pins();
            }
        } else if let Some(id) = self.shutdown_event.get() {
            self.queue.post(id, mode as u32);
        }
    }

    /// Called by the framework after waking up
    pub fn wakeup_handler(&self) {
        if !self.triggered() {
            return;
        }

        if let Some(id) = self.wake_event.get() {
            self.queue.post(id, 0);
        }
    }

    /// Put every pin back into its default state
    pub fn disable_pins(&self) {
        for pin in IoId::all() {
            self.platform.set_default_state(pin);
        }
    }

    fn disable_wakeups(&self) {
        let interrupts_disabled = self.platform.master_disable();

        self.platform.disable_irq(Irq::AonRtc);
        self.platform.clear_pending(Irq::AonRtc);

        self.platform.rtc_disable();
        for channel in RtcChannel::ALL {
            self.platform.rtc_event_clear(channel);
        }

        self.platform.aon_sync();

        if !interrupts_disabled {
            self.platform.master_enable();
        }
    }
}

impl<P: Platform, Q: EventQueue> LpmCallbacks for SleepTrigger<P, Q> {
    fn shutdown(&self, mode: u8) {
        self.shutdown_handler(mode);
    }

    fn wakeup(&self) {
        self.wakeup_handler();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::TestMode,
        event::Event,
        fakes::{Call, FakePlatform, FakeQueue},
    };
    use core::{future::Future, pin::pin};
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use futures_test::task::noop_context;

    const MAX: u8 = LpmMode::MAX_SUPPORTED as u8;

    /// Same result with every feature combination
    fn config(disable_pins: bool) -> Config {
        Config {
            mode: TestMode::DeepSleep,
            disable_pins,
            debug_print: false,
            ..Config::default()
        }
    }

    fn trigger<'a>(
        platform: &'a FakePlatform,
        queue: &'a FakeQueue,
        config: &Config,
    ) -> SleepTrigger<&'a FakePlatform, &'a FakeQueue> {
        let trigger = SleepTrigger::new(platform, queue, config);
        trigger.bind_events(EventId(0x8A), EventId(0x8B));
        trigger
    }

    fn expire(trigger: &SleepTrigger<&FakePlatform, &FakeQueue>) {
        trigger.timer().arm();
        let mut delay = NoopDelay::new();
        let wait = pin!(trigger.timer().wait(&mut delay));
        assert!(wait.poll(&mut noop_context()).is_ready());
        assert!(trigger.timer().expired());
    }

    #[test]
    fn unarmed_timer_never_expires() {
        let timer = DelayTimer::new(10);
        let mut delay = NoopDelay::new();
        let mut wait = pin!(timer.wait(&mut delay));

        assert!(wait.as_mut().poll(&mut noop_context()).is_pending());
        assert!(wait.as_mut().poll(&mut noop_context()).is_pending());
        assert!(!timer.expired());

        timer.arm();
        let mut delay = NoopDelay::new();
        assert!(pin!(timer.wait(&mut delay))
            .poll(&mut noop_context())
            .is_ready());
        assert!(timer.expired());
    }

    #[test]
    fn readiness_needs_max_mode_and_expired_timer() {
        for mode in 0..=u8::MAX {
            assert_eq!(ready_for_hard_sleep(mode, true), mode == MAX);
            assert!(!ready_for_hard_sleep(mode, false));
        }
    }

    #[test]
    fn not_ready_posts_the_mode() {
        let platform = FakePlatform::default();
        let queue = FakeQueue::default();
        let trigger = trigger(&platform, &queue, &config(false));

        trigger.shutdown_handler(MAX);

        assert!(!trigger.triggered());
        assert!(platform.calls().is_empty());
        assert_eq!(
            queue.take(),
            [Event::Posted {
                id: EventId(0x8A),
                data: MAX as u32
            }]
        );
    }

    #[test]
    fn ready_triggers_hard_sleep_once() {
        let platform = FakePlatform::default();
        let queue = FakeQueue::default();
        let trigger = trigger(&platform, &queue, &config(false));
        expire(&trigger);

        trigger.shutdown_handler(MAX);

        assert!(trigger.triggered());
        assert!(queue.take().is_empty());
        assert_eq!(
            platform.calls(),
            [
                Call::WatchdogStop,
                Call::MasterDisable,
                Call::DisableIrq(Irq::AonRtc),
                Call::ClearPending(Irq::AonRtc),
                Call::RtcDisable,
                Call::RtcEventClear(RtcChannel::Ch0),
                Call::RtcEventClear(RtcChannel::Ch1),
                Call::RtcEventClear(RtcChannel::Ch2),
                Call::AonSync,
                Call::MasterEnable,
            ]
        );
        assert!(!platform.interrupts_disabled.get());

        // Latched: the hardware isn't touched again, the attempt only gets reported
        trigger.shutdown_handler(MAX);

        assert!(trigger.triggered());
        assert_eq!(platform.calls().len(), 10);
        assert_eq!(
            queue.take(),
            [Event::Posted {
                id: EventId(0x8A),
                data: MAX as u32
            }]
        );
    }

    #[test]
    fn shallower_modes_never_trigger() {
        let platform = FakePlatform::default();
        let queue = FakeQueue::default();
        let trigger = trigger(&platform, &queue, &config(false));
        expire(&trigger);

        trigger.shutdown_handler(LpmMode::Sleep as u8);

        assert!(!trigger.triggered());
        assert!(platform.calls().is_empty());
        assert_eq!(queue.take().len(), 1);
    }

    #[test]
    fn interrupts_stay_disabled_if_they_were() {
        let platform = FakePlatform::default();
        platform.interrupts_disabled.set(true);
        let queue = FakeQueue::default();
        let trigger = trigger(&platform, &queue, &config(false));
        expire(&trigger);

        trigger.shutdown_handler(MAX);

        assert!(platform.interrupts_disabled.get());
        assert!(!platform.calls().contains(&Call::MasterEnable));
    }

    #[test]
    fn pins_get_reset_when_configured() {
        let platform = FakePlatform::default();
        let queue = FakeQueue::default();
        let trigger = trigger(&platform, &queue, &config(true));
        expire(&trigger);

        trigger.shutdown_handler(MAX);

        let pins: Vec<_> = platform
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::PinDefault(pin) => Some(pin),
                _ => None,
            })
            .collect();
        assert_eq!(pins, IoId::all().collect::<Vec<_>>());
        assert_eq!(platform.calls().last(), Some(&Call::PinDefault(IoId::new(31).unwrap())));
    }

    #[test]
    fn wakeup_only_reports_after_trigger() {
        let platform = FakePlatform::default();
        let queue = FakeQueue::default();
        let trigger = trigger(&platform, &queue, &config(false));

        trigger.wakeup_handler();
        assert!(queue.take().is_empty());

        expire(&trigger);
        trigger.shutdown_handler(MAX);
        trigger.wakeup_handler();

        assert_eq!(
            queue.take(),
            [Event::Posted {
                id: EventId(0x8B),
                data: 0
            }]
        );
    }

    #[test]
    fn highest_event_ids_still_get_posted() {
        let platform = FakePlatform::default();
        let queue = FakeQueue::default();
        let trigger = SleepTrigger::new(&platform, &queue, &config(false));
        trigger.bind_events(EventId(0xFF), EventId(0xFE));

        trigger.shutdown_handler(MAX);
        expire(&trigger);
        trigger.shutdown_handler(MAX);
        trigger.wakeup_handler();

        assert_eq!(
            queue.take(),
            [
                Event::Posted {
                    id: EventId(0xFF),
                    data: MAX as u32
                },
                Event::Posted {
                    id: EventId(0xFE),
                    data: 0
                },
            ]
        );
    }

    #[test]
    fn unbound_events_are_not_posted() {
        let platform = FakePlatform::default();
        let queue = FakeQueue::default();
        let trigger = SleepTrigger::new(&platform, &queue, &config(false));

        trigger.shutdown_handler(MAX);

        assert!(queue.take().is_empty());
        assert!(!trigger.triggered());
    }
}
