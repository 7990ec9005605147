//! Recording stand-ins for the hardware and the scheduler

use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, VecDeque},
    convert::Infallible,
    task::Poll,
};

use device_driver::RegisterInterface;

use crate::{
    config::{IoId, WakeConfig},
    event::{Event, EventId, EventQueue, EventSource},
    lpm::{LowPowerFramework, LpmModule},
    platform::{Irq, NetStack, PinControl, RtcChannel, WakeSources, Watchdog},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    WatchdogStop,
    MasterDisable,
    MasterEnable,
    DisableIrq(Irq),
    ClearPending(Irq),
    RtcDisable,
    RtcEventClear(RtcChannel),
    AonSync,
    PinDefault(IoId),
    MacOff(bool),
}

#[derive(Debug, Default)]
pub struct FakePlatform {
    pub calls: RefCell<Vec<Call>>,
    pub interrupts_disabled: Cell<bool>,
}

impl FakePlatform {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl Watchdog for FakePlatform {
    fn stop(&self) {
        self.record(Call::WatchdogStop);
    }
}

impl WakeSources for FakePlatform {
    fn master_disable(&self) -> bool {
        self.record(Call::MasterDisable);
        self.interrupts_disabled.replace(true)
    }

    fn master_enable(&self) {
        self.record(Call::MasterEnable);
        self.interrupts_disabled.set(false);
    }

    fn disable_irq(&self, irq: Irq) {
        self.record(Call::DisableIrq(irq));
    }

    fn clear_pending(&self, irq: Irq) {
        self.record(Call::ClearPending(irq));
    }

    fn rtc_disable(&self) {
        self.record(Call::RtcDisable);
    }

    fn rtc_event_clear(&self, channel: RtcChannel) {
        self.record(Call::RtcEventClear(channel));
    }

    fn aon_sync(&self) {
        self.record(Call::AonSync);
    }
}

impl PinControl for FakePlatform {
    fn set_default_state(&self, pin: IoId) {
        self.record(Call::PinDefault(pin));
    }
}

impl NetStack for FakePlatform {
    fn mac_off(&self, keep_radio_on: bool) {
        self.record(Call::MacOff(keep_radio_on));
    }
}

/// Event queue that hands out ids the way the scheduler does, starting after the system events
#[derive(Debug)]
pub struct FakeQueue {
    next_id: Cell<u8>,
    pending: RefCell<VecDeque<Event>>,
}

impl Default for FakeQueue {
    fn default() -> Self {
        Self {
            next_id: Cell::new(0x8A),
            pending: RefCell::new(VecDeque::new()),
        }
    }
}

impl FakeQueue {
    pub fn push(&self, event: Event) {
        self.pending.borrow_mut().push_back(event);
    }

    pub fn pending(&self) -> Vec<Event> {
        self.pending.borrow().iter().copied().collect()
    }

    pub fn take(&self) -> Vec<Event> {
        self.pending.borrow_mut().drain(..).collect()
    }
}

impl EventQueue for FakeQueue {
    fn alloc_event(&self) -> EventId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        EventId(id)
    }

    fn post(&self, id: EventId, data: u32) {
        self.push(Event::Posted { id, data });
    }
}

impl EventSource for &FakeQueue {
    async fn next(&mut self) -> Event {
        // Checks again on every poll, so events posted while waiting get picked up
        core::future::poll_fn(|_| match self.pending.borrow_mut().pop_front() {
            Some(event) => Poll::Ready(event),
            None => Poll::Pending,
        })
        .await
    }
}

#[derive(Default)]
pub struct FakeFramework<'a> {
    pub modules: RefCell<Vec<LpmModule<'a>>>,
    pub shutdowns: RefCell<Vec<WakeConfig>>,
}

impl<'a> FakeFramework<'a> {
    pub fn module(&self) -> LpmModule<'a> {
        self.modules.borrow()[0]
    }
}

impl<'a> LowPowerFramework<'a> for &FakeFramework<'a> {
    fn register_module(&mut self, module: LpmModule<'a>) {
        self.modules.borrow_mut().push(module);
    }

    fn shutdown(&mut self, wake: &WakeConfig) {
        self.shutdowns.borrow_mut().push(*wake);
    }
}

/// Register memory where every unset address reads as zero
#[derive(Debug, Default)]
pub struct FakeMemory {
    words: HashMap<u32, u32>,
}

impl FakeMemory {
    pub fn set(&mut self, address: u32, value: u32) {
        self.words.insert(address, value);
    }
}

impl RegisterInterface for FakeMemory {
    type Error = Infallible;

    type AddressType = u32;

    fn write_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        data: &[u8],
    ) -> Result<(), Self::Error> {
        let mut word = [0; 4];
        word.copy_from_slice(data);
        self.words.insert(address, u32::from_le_bytes(word));
        Ok(())
    }

    fn read_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        data: &mut [u8],
    ) -> Result<(), Self::Error> {
        let word = self.words.get(&address).copied().unwrap_or_default();
        data.copy_from_slice(&word.to_le_bytes());
        Ok(())
    }
}

/// Register memory where every access fails
#[derive(Debug, Default)]
pub struct BrokenMemory;

impl RegisterInterface for BrokenMemory {
    type Error = ();

    type AddressType = u32;

    fn write_register(
        &mut self,
        _address: Self::AddressType,
        _size_bits: u32,
        _data: &[u8],
    ) -> Result<(), Self::Error> {
        Err(())
    }

    fn read_register(
        &mut self,
        _address: Self::AddressType,
        _size_bits: u32,
        _data: &mut [u8],
    ) -> Result<(), Self::Error> {
        Err(())
    }
}
