#![no_std]

use core::{
    cell::RefCell,
    convert::Infallible,
    future::poll_fn,
    sync::atomic::{AtomicU8, Ordering},
    task::Poll,
};

use cc26xx_lpm_test::{
    config::{IoId, Pull, WakeConfig},
    event::{Event, EventId, EventQueue, EventSource},
    ll::{Device, Mmio},
    lpm::{LowPowerFramework, LpmCallbacks, LpmMode, LpmModule},
    platform::{Irq, NetStack, PinControl, RtcChannel, WakeSources, Watchdog},
};
use cortex_m::{
    interrupt::InterruptNumber,
    peripheral::{NVIC, SCB},
    register::primask,
};
use defmt::unwrap;
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};
use embedded_hal_async::delay::DelayNs;
use {defmt_rtt as _, panic_probe as _};

pub mod ll;

use ll::BoardDevice;

const WDT_UNLOCK: u32 = 0x1ACC_E551;
/// `AON_EVENT_RTC_CH0` in the AON event fabric
const AON_EVENT_RTC_CH0: u8 = 33;
/// `IE` bit of `IOCFG`
const IOCFG_INPUT_ENABLED: u32 = 0x2000_0000;
/// Ids below this are used by the system
const FIRST_EVENT_ID: u8 = 0x8A;

/// Customer configuration read by the boot ROM: flash image valid, bootloader off, debug
/// access on, clocked from the 32 kHz crystal of the SmartRF06.
#[link_section = ".ccfg"]
#[used]
static CCFG: [u32; 22] = [
    0x0180_0000, // EXT_LF_CLK
    0xFF82_0010, // MODE_CONF_1
    0x0058_FFFD, // SIZE_AND_DIS_FLAGS
    0xF3BF_FF3A, // MODE_CONF
    0xFFFF_FFFF, // VOLT_LOAD_0
    0xFFFF_FFFF, // VOLT_LOAD_1
    0xFFFF_FFFF, // RTC_OFFSET
    0xFFFF_FFFF, // FREQ_OFFSET
    0xFFFF_FFFF, // IEEE_MAC_0
    0xFFFF_FFFF, // IEEE_MAC_1
    0xFFFF_FFFF, // IEEE_BLE_0
    0xFFFF_FFFF, // IEEE_BLE_1
    0x00FF_FFFF, // BL_CONFIG
    0xFFFF_FFFF, // ERASE_CONF
    0xFFFF_FFC5, // CCFG_TI_OPTIONS
    0xFFC5_C5C5, // CCFG_TAP_DAP_0
    0xFFC5_C5C5, // CCFG_TAP_DAP_1
    0x0000_0000, // IMAGE_VALID_CONF
    0xFFFF_FFFF, // CCFG_PROT_31_0
    0xFFFF_FFFF, // CCFG_PROT_63_32
    0xFFFF_FFFF, // CCFG_PROT_95_64
    0xFFFF_FFFF, // CCFG_PROT_127_96
];

pub fn init_board() -> Board {
    defmt::info!("Initializing the board");

    let board = Board { _private: () };
    board.start_rtc();
    board
}

/// The chip primitives, implemented with plain register accesses
pub struct Board {
    _private: (),
}

impl Board {
    /// Clear the RTC wake up so the interrupt doesn't fire again. Call this from the interrupt.
    pub fn rtc_interrupt() {
        let mut regs = board_registers();
        unwrap!(regs
            .aon_rtc_evflags()
            .write(|reg| reg.set_value(event_flag(RtcChannel::Ch0))));
    }

    fn regs(&self) -> BoardDevice<Mmio> {
        board_registers()
    }

    fn test_regs(&self) -> Device<Mmio> {
        // Safety: a board only exists on the chip itself
        Device::new(unsafe { Mmio::new() })
    }

    fn start_rtc(&self) {
        let mut regs = self.regs();

        unwrap!(regs.aon_rtc_ctl().modify(|reg| {
            reg.set_en(true);
            reg.set_comb_ev_mask(RtcChannel::Ch0 as u8);
        }));
        unwrap!(regs
            .aon_event_mcu_wake_sel()
            .modify(|reg| reg.set_first_event(AON_EVENT_RTC_CH0)));
        self.aon_sync();

        // Safety: the interrupt only clears the RTC event, which doesn't break any critical section
        unsafe { NVIC::unmask(IrqNr(Irq::AonRtc)) };
    }

    /// RTC time in 1/2^32 seconds
    fn now(&self) -> u64 {
        let mut regs = self.regs();

        loop {
            let sec = unwrap!(regs.aon_rtc_sec().read()).value();
            let subsec = unwrap!(regs.aon_rtc_subsec().read()).value();

            if unwrap!(regs.aon_rtc_sec().read()).value() == sec {
                return (u64::from(sec) << 32) | u64::from(subsec);
            }
        }
    }

    fn wake_at(&self, time: u64) {
        let mut regs = self.regs();

        unwrap!(regs.aon_rtc_compare().write(|reg| reg.set_value((time >> 16) as u32)));
        unwrap!(regs.aon_rtc_chctl().modify(|reg| reg.set_compare_en(true)));
        self.aon_sync();
    }

    fn configure_wake_pin(&self, wake: &WakeConfig) {
        let config = IOCFG_INPUT_ENABLED | u32::from(wake.pull) | u32::from(wake.wake_on);

        self.disable_output(wake.pin);
        unwrap!(self
            .test_regs()
            .iocfg(wake.pin.index())
            .write(|reg| reg.set_value(config)));
    }

    fn disable_output(&self, pin: IoId) {
        unwrap!(self
            .regs()
            .gpio_doe()
            .modify(|reg| reg.set_value(reg.value() & !(1u32 << pin.index()))));
    }

    fn request_shutdown(&self) {
        // The MCU domain can't power down while JTAG is on
        unwrap!(self.test_regs().jtag_cfg().write(|reg| reg.set_value(0)));
        unwrap!(self.regs().aon_wuc_shutdown().write(|reg| reg.set_en(true)));
        self.aon_sync();
    }
}

fn board_registers() -> BoardDevice<Mmio> {
    // Safety: only called by the board, which only exists on the chip itself
    BoardDevice::new(unsafe { Mmio::new() })
}

/// The `EVFLAGS` bit of a channel
fn event_flag(channel: RtcChannel) -> u32 {
    match channel {
        RtcChannel::Ch0 => 1 << 0,
        RtcChannel::Ch1 => 1 << 8,
        RtcChannel::Ch2 => 1 << 16,
    }
}

#[derive(Clone, Copy)]
struct IrqNr(Irq);

// Safety: the interrupt numbers are the ones of the chip
unsafe impl InterruptNumber for IrqNr {
    fn number(self) -> u16 {
        self.0 as u16
    }
}

impl Watchdog for Board {
    fn stop(&self) {
        let mut regs = self.regs();

        unwrap!(regs.wdt_lock().write(|reg| reg.set_value(WDT_UNLOCK)));
        // The interrupt can't be turned off again, so only the reset gets disabled
        unwrap!(regs.wdt_ctl().modify(|reg| reg.set_resen(false)));
        unwrap!(regs.wdt_lock().write(|reg| reg.set_value(0)));

        defmt::debug!("Watchdog stopped");
    }
}

impl WakeSources for Board {
    fn master_disable(&self) -> bool {
        let was_enabled = primask::read().is_active();
        cortex_m::interrupt::disable();
        !was_enabled
    }

    fn master_enable(&self) {
        // Safety: only called to undo `master_disable`
        unsafe { cortex_m::interrupt::enable() };
    }

    fn disable_irq(&self, irq: Irq) {
        NVIC::mask(IrqNr(irq));
    }

    fn clear_pending(&self, irq: Irq) {
        NVIC::unpend(IrqNr(irq));
    }

    fn rtc_disable(&self) {
        unwrap!(self.regs().aon_rtc_ctl().modify(|reg| reg.set_en(false)));
    }

    fn rtc_event_clear(&self, channel: RtcChannel) {
        unwrap!(self
            .regs()
            .aon_rtc_evflags()
            .write(|reg| reg.set_value(event_flag(channel))));
    }

    fn aon_sync(&self) {
        unwrap!(self.regs().aon_rtc_sync().read());
    }
}

impl PinControl for Board {
    fn set_default_state(&self, pin: IoId) {
        self.disable_output(pin);
        unwrap!(self
            .test_regs()
            .iocfg(pin.index())
            .write(|reg| reg.set_value(u32::from(Pull::None))));
    }
}

impl NetStack for Board {
    fn mac_off(&self, keep_radio_on: bool) {
        // There's no network stack on this board, so the radio is already off
        defmt::debug!("MAC off (keep radio on: {})", keep_radio_on);
    }
}

/// Delay on the AON RTC, which keeps running in deep sleep
pub struct RtcDelay<'a> {
    board: &'a Board,
}

impl<'a> RtcDelay<'a> {
    pub fn new(board: &'a Board) -> Self {
        Self { board }
    }

    async fn wait(&mut self, duration: u64) {
        let deadline = self.board.now() + duration;
        self.board.wake_at(deadline);

        poll_fn(|_| {
            if self.board.now() >= deadline {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
        .await
    }
}

impl DelayNs for RtcDelay<'_> {
    async fn delay_ns(&mut self, ns: u32) {
        self.wait((u64::from(ns) << 32) / 1_000_000_000).await
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.wait((u64::from(ms) << 32) / 1_000).await
    }
}

/// The event queue of the test process
pub struct Scheduler {
    next_id: AtomicU8,
    events: Channel<CriticalSectionRawMutex, Event, 8>,
}

impl Scheduler {
    pub const fn new() -> Self {
        Self {
            next_id: AtomicU8::new(FIRST_EVENT_ID),
            events: Channel::new(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue for Scheduler {
    fn alloc_event(&self) -> EventId {
        EventId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn post(&self, id: EventId, data: u32) {
        if self.events.try_send(Event::Posted { id, data }).is_err() {
            defmt::warn!("Event queue full, dropped {}", id);
        }
    }
}

/// The receiving side of a [Scheduler]
pub struct Events<'a>(pub &'a Scheduler);

impl EventSource for Events<'_> {
    async fn next(&mut self) -> Event {
        self.0.events.receive().await
    }
}

/// A small LPM framework: the main loop calls [Self::idle] whenever the test process is waiting
pub struct Lpm<'a> {
    board: &'a Board,
    scheduler: &'a Scheduler,
    scb: RefCell<SCB>,
    modules: RefCell<[Option<LpmModule<'a>>; 4]>,
}

impl<'a> Lpm<'a> {
    pub fn new(board: &'a Board, scheduler: &'a Scheduler, scb: SCB) -> Self {
        Self {
            board,
            scheduler,
            scb: RefCell::new(scb),
            modules: RefCell::new([None; 4]),
        }
    }

    /// Sleep as deep as the modules allow, unless there are events left to handle
    pub fn idle(&self) {
        if !self.scheduler.is_idle() {
            return;
        }

        cortex_m::interrupt::disable();

        let modules = *self.modules.borrow();
        let mode = modules
            .iter()
            .flatten()
            .map(|module| module.callbacks.max_mode())
            .min()
            .unwrap_or(LpmMode::MAX_SUPPORTED);

        for module in modules.iter().flatten() {
            module.callbacks.shutdown(mode.into());
        }

        // The modules may have posted something
        if self.scheduler.is_idle() {
            self.sleep(mode >= LpmMode::DeepSleep);
        }

        for module in modules.iter().flatten() {
            module.callbacks.wakeup();
        }

        // Safety: interrupts were enabled when the main loop called us
        unsafe { cortex_m::interrupt::enable() };
    }

    fn sleep(&self, deep: bool) {
        let mut scb = self.scb.borrow_mut();

        if deep {
            scb.set_sleepdeep();
        } else {
            scb.clear_sleepdeep();
        }

        cortex_m::asm::dsb();
        cortex_m::asm::wfi();
    }
}

impl<'a> LowPowerFramework<'a> for &Lpm<'a> {
    fn register_module(&mut self, module: LpmModule<'a>) {
        let mut modules = self.modules.borrow_mut();

        match modules.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => *slot = Some(module),
            None => defmt::error!("No room for another LPM module"),
        }
    }

    fn shutdown(&mut self, wake: &WakeConfig) {
        cortex_m::interrupt::disable();

        self.board.configure_wake_pin(wake);
        self.board.request_shutdown();
        self.sleep(true);

        // Safety: interrupts were enabled by the caller
        unsafe { cortex_m::interrupt::enable() };
    }
}

/// Console on top of defmt, one message per line
pub struct Console {
    line: [u8; 80],
    len: usize,
}

impl Console {
    pub const fn new() -> Self {
        Self {
            line: [0; 80],
            len: 0,
        }
    }

    fn print_line(&mut self) {
        let line = &self.line[..self.len];

        match core::str::from_utf8(line) {
            Ok(line) => defmt::println!("{=str}", line),
            Err(_) => defmt::println!("{=[u8]}", line),
        }

        self.len = 0;
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl embedded_io::ErrorType for Console {
    type Error = Infallible;
}

impl embedded_io::Write for Console {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        for &byte in buf {
            if byte == b'\n' {
                self.print_line();
                continue;
            }

            if self.len == self.line.len() {
                self.print_line();
            }

            self.line[self.len] = byte;
            self.len += 1;
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if self.len > 0 {
            self.print_line();
        }

        Ok(())
    }
}
