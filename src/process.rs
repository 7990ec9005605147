//! The test process itself

use core::pin::pin;

use device_driver::RegisterInterface;
use embassy_futures::select::{select, Either};
use embedded_hal_async::delay::DelayNs;
use embedded_io::{ErrorType, Write};

use crate::{
    config::{Config, TestMode},
    diag::StateReport,
    event::{Event, EventQueue, EventSource},
    ll::Device,
    lpm::{Domain, LowPowerFramework, LpmModule},
    platform::Platform,
    sleep::{DelayTimer, SleepTrigger},
    Error,
};

/// Where the test process is at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum State {
    /// Not started yet
    Init,
    /// Set up and waiting for the first event
    Armed,
    /// Deep sleep test: waiting for the framework to try going to sleep
    WaitShutdownEvent,
    /// Deep sleep test: reporting every sleep and wake up. This is the end state.
    Observing,
    /// Shutdown test: waiting for the delay timer
    WaitTimer,
    /// Shutdown test: in the shutdown call
    ShuttingDown,
    /// Shutdown test: came back from shutdown, which shouldn't happen. This is the end state.
    Idle,
}

pub type TestError<I, W> =
    Error<<I as RegisterInterface>::Error, <W as ErrorType>::Error>;

/// The test process. It's driven by calling [Self::handle] with every event the scheduler
/// delivers, or by running it with [run].
pub struct LpmTest<'a, P, Q, F, I, W> {
    config: Config,
    trigger: &'a SleepTrigger<P, Q>,
    framework: F,
    device: Device<I>,
    console: W,
    state: State,
}

impl<'a, P, Q, F, I, W> LpmTest<'a, P, Q, F, I, W>
where
    P: Platform + 'a,
    Q: EventQueue + 'a,
    F: LowPowerFramework<'a>,
    I: RegisterInterface<AddressType = u32>,
    W: Write,
{
    pub fn new(
        config: Config,
        trigger: &'a SleepTrigger<P, Q>,
        framework: F,
        registers: I,
        console: W,
    ) -> Self {
        Self {
            config,
            trigger,
            framework,
            device: Device::new(registers),
            console,
            state: State::Init,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn timer(&self) -> &'a DelayTimer {
        let trigger: &'a SleepTrigger<P, Q> = self.trigger;
        trigger.timer()
    }

    /// Access the registers directly
    pub fn ll(&mut self) -> &mut Device<I> {
        &mut self.device
    }

    /// Resume the process with the next event
    pub fn handle(&mut self, event: Event) -> Result<(), TestError<I, W>> {
        #[cfg(feature = "defmt-03")]
        defmt::trace!("Handling {} in state {}", event, self.state);

        match self.state {
            State::Init => {
                self.arm();
                Ok(())
            }
            State::Armed => {
                self.state = match self.config.mode {
                    TestMode::DeepSleep => State::WaitShutdownEvent,
                    TestMode::Shutdown => State::WaitTimer,
                };
                self.resume(event)
            }
            _ => self.resume(event),
        }
    }

    /// Like [Self::handle], but a failed step only gets logged and reported on the console
    pub fn dispatch(&mut self, event: Event) {
        if self.handle(event).is_err() {
            #[cfg(feature = "defmt-03")]
            defmt::warn!("Handling {} failed, now in state {}", event, self.state);

            // The console may be what failed, so there's nothing left to do with this error
            let _ = writeln!(self.console, "step failed in state {:?}", self.state);
        }
    }

    /// Read the sleep relevant registers and print them to the console
    pub fn print_state(&mut self) -> Result<StateReport, TestError<I, W>> {
        let report = StateReport::read(&mut self.device).map_err(Error::Register)?;

        #[cfg(feature = "defmt-03")]
        defmt::debug!("State: {}", report);

        write!(self.console, "{}", report)?;

        Ok(report)
    }

    fn arm(&mut self) {
        if self.config.mode == TestMode::DeepSleep {
            let queue = self.trigger.queue();
            let shutdown_event = queue.alloc_event();
            let wake_event = queue.alloc_event();
            self.trigger.bind_events(shutdown_event, wake_event);

            self.framework
                .register_module(LpmModule::new(self.trigger, Domain::None));
        }

        self.trigger.timer().arm();
        self.trigger.platform().mac_off(false);

        #[cfg(feature = "defmt-03")]
        defmt::debug!("Armed the {} test", self.config.mode);

        self.state = State::Armed;
    }

    fn resume(&mut self, event: Event) -> Result<(), TestError<I, W>> {
        match self.state {
            State::WaitShutdownEvent => {
                if event.is(self.trigger.shutdown_event()) {
                    self.state = State::Observing;
                    self.print_state()?;
                    self.observe(event)?;
                }
            }
            State::Observing => self.observe(event)?,
            State::WaitTimer => {
                if self.trigger.timer().expired() {
                    self.shut_down()?;
                }
            }
            State::Init | State::Armed | State::ShuttingDown | State::Idle => {}
        }

        Ok(())
    }

    fn observe(&mut self, event: Event) -> Result<(), TestError<I, W>> {
        if event.is(self.trigger.wake_event()) {
            writeln!(self.console, "woke")?;
        } else if event.is(self.trigger.shutdown_event()) {
            self.debug_line("wake")?;
        }

        Ok(())
    }

    fn shut_down(&mut self) -> Result<(), TestError<I, W>> {
        self.state = State::ShuttingDown;
        self.trigger.platform().stop();

        // The shutdown goes ahead even if the console is broken
        let printed = self.print_state().map(|_| ());
        let announced = self.debug_line("shutting down...");

        #[cfg(feature = "defmt-03")]
        defmt::info!("Shutting down, wake up with {}", self.config.wake);

        self.framework.shutdown(&self.config.wake);

        // Waking up from shutdown resets the chip, so we should never get here
        #[cfg(feature = "defmt-03")]
        defmt::error!("Returned from shutdown");

        self.state = State::Idle;
        printed
            .and(announced)
            .and(self.debug_line("somehow wokeup!"))
    }

    fn debug_line(&mut self, line: &str) -> Result<(), TestError<I, W>> {
        if self.config.debug_print {
            writeln!(self.console, "{}", line)?;
        }

        Ok(())
    }
}

/// Run the test process forever.
///
/// Delivers [Event::Init] first and then every event from `events`. The delay timer runs on
/// `delay` and is delivered as [Event::Timer] when it expires.
pub async fn run<'a, P, Q, F, I, W, S, D>(
    mut test: LpmTest<'a, P, Q, F, I, W>,
    mut events: S,
    mut delay: D,
) -> !
where
    P: Platform + 'a,
    Q: EventQueue + 'a,
    F: LowPowerFramework<'a>,
    I: RegisterInterface<AddressType = u32>,
    W: Write,
    S: EventSource,
    D: DelayNs,
{
    test.dispatch(Event::Init);

    let timer = test.timer();
    let mut expiry = pin!(timer.wait(&mut delay));
    let mut expired = false;

    loop {
        let event = if expired {
            events.next().await
        } else {
            match select(expiry.as_mut(), events.next()).await {
                Either::First(()) => {
                    expired = true;
                    Event::Timer
                }
                Either::Second(event) => event,
            }
        };

        test.dispatch(event);
    }
}
