//! Low level register definitions for the registers the test reads

use core::convert::Infallible;

use device_driver::RegisterInterface;

device_driver::create_device!(
    device_name: Device,
    dsl: {
        config {
            type RegisterAddressType = u32;
            type DefaultByteOrder = LE;
        }
        /// Deep sleep clock gates, in order: SECDMA, GPIO, GPT, I2C, UART, SSI, I2S
        register ClkGds {
            const ADDRESS = 0x4008_2044;
            const SIZE_BITS = 32;
            const REPEAT = {
                count: 7,
                stride: 12,
            };

            value: uint = 0..32,
        },
        /// IO configuration, one register per DIO
        register Iocfg {
            const ADDRESS = 0x4008_1000;
            const SIZE_BITS = 32;
            const REPEAT = {
                count: 32,
                stride: 4,
            };

            value: uint = 0..32,
        },
        /// AUX clock management
        register AuxClk {
            const ADDRESS = 0x4009_1004;
            const SIZE_BITS = 32;

            value: uint = 0..32,
        },
        /// AUX control
        register AuxCtl {
            const ADDRESS = 0x4009_1010;
            const SIZE_BITS = 32;

            value: uint = 0..32,
        },
        /// JTAG power configuration
        register JtagCfg {
            const ADDRESS = 0x4009_1040;
            const SIZE_BITS = 32;

            value: uint = 0..32,
        },
    }
);

/// Direct memory mapped access to the chip registers
#[derive(Debug)]
pub struct Mmio {
    _private: (),
}

impl Mmio {
    /// Create the memory mapped interface.
    ///
    /// # Safety
    ///
    /// Must only be used on a CC26xx where every address of the [Device] register map is valid.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl RegisterInterface for Mmio {
    type Error = Infallible;

    type AddressType = u32;

    fn write_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        data: &[u8],
    ) -> Result<(), Self::Error> {
        let mut word = [0; 4];
        let len = data.len().min(4);
        word[..len].copy_from_slice(&data[..len]);

        // Safety: the creator of `Mmio` guarantees the register map is valid
        unsafe {
            core::ptr::write_volatile(address as usize as *mut u32, u32::from_le_bytes(word));
        }

        Ok(())
    }

    fn read_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        data: &mut [u8],
    ) -> Result<(), Self::Error> {
        // Safety: the creator of `Mmio` guarantees the register map is valid
        let word = unsafe { core::ptr::read_volatile(address as usize as *const u32) };

        let len = data.len().min(4);
        data[..len].copy_from_slice(&word.to_le_bytes()[..len]);

        Ok(())
    }
}
