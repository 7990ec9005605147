//! Dump of the registers that decide how much current the chip draws while sleeping

use core::fmt;

use device_driver::RegisterInterface;

use crate::{config::IoId, ll::Device};

/// `IE` bit of `IOCFG`
const INPUT_ENABLED: u32 = 0x2000_0000;
/// `PORT_ID` values other than 0 route the pin to a peripheral
const PORT_ID: u32 = 0x0000_001F;

/// True if the pin configuration can draw current: the input buffer is on or
/// the pin isn't a plain gpio.
pub fn check_io_config(state: u32) -> bool {
    state & INPUT_ENABLED != 0 || state & PORT_ID != 0
}

/// The peripheral clock gates that are active in deep sleep, numbered in register order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum ClockGate {
    SecDma = 0,
    Gpio = 1,
    Gpt = 2,
    I2c = 3,
    Uart = 4,
    Ssi = 5,
    I2s = 6,
}

impl ClockGate {
    /// All gates in the order they get printed
    pub const ALL: [ClockGate; 7] = [
        Self::Gpt,
        Self::Ssi,
        Self::Uart,
        Self::I2c,
        Self::SecDma,
        Self::Gpio,
        Self::I2s,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ClockGate::Gpt => "GPT",
            ClockGate::Ssi => "SSI",
            ClockGate::Uart => "UART",
            ClockGate::I2c => "I2C",
            ClockGate::SecDma => "SECDMA",
            ClockGate::Gpio => "GPIO",
            ClockGate::I2s => "I2S",
        }
    }
}

/// A snapshot of the sleep relevant registers
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct StateReport {
    /// Indexed by [ClockGate]
    pub clock_gates: [u32; 7],
    /// `IOCFG` of every pin
    pub io_config: [u32; 32],
    pub aux_ctl: u32,
    pub aux_clk: u32,
    pub jtag_cfg: u32,
}

impl StateReport {
    pub fn read<I>(device: &mut Device<I>) -> Result<Self, I::Error>
    where
        I: RegisterInterface<AddressType = u32>,
    {
        let mut clock_gates = [0; 7];
        for (index, value) in clock_gates.iter_mut().enumerate() {
            *value = device.clk_gds(index).read()?.value();
        }

        let mut io_config = [0; 32];
        for pin in IoId::all() {
            io_config[pin.index()] = device.iocfg(pin.index()).read()?.value();
        }

        Ok(Self {
            clock_gates,
            io_config,
            aux_ctl: device.aux_ctl().read()?.value(),
            aux_clk: device.aux_clk().read()?.value(),
            jtag_cfg: device.jtag_cfg().read()?.value(),
        })
    }

    pub fn clock_gate(&self, gate: ClockGate) -> u32 {
        self.clock_gates[gate as usize]
    }

    /// The pins worth looking at, see [check_io_config]
    pub fn reported_pins(&self) -> impl Iterator<Item = (IoId, u32)> + '_ {
        IoId::all()
            .map(|pin| (pin, self.io_config[pin.index()]))
            .filter(|(_, state)| check_io_config(*state))
    }
}

impl fmt::Display for StateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for gate in ClockGate::ALL {
            writeln!(f, "{:<6} CLKG 0x{:08x}", gate.name(), self.clock_gate(gate))?;
        }

        for (pin, state) in self.reported_pins() {
            writeln!(f, "IOCFG{:02}     0x{:08x}", u8::from(pin), state)?;
        }

        writeln!(f, "AUXCTL      0x{:08x}", self.aux_ctl)?;
        writeln!(f, "AUXCLK      0x{:08x}", self.aux_clk)?;
        writeln!(f, "JTAGCFG     0x{:08x}", self.jtag_cfg)
    }
}
