//! The registers the board writes to, on top of the ones the test itself reads

device_driver::create_device!(
    device_name: BoardDevice,
    dsl: {
        config {
            type RegisterAddressType = u32;
            type DefaultByteOrder = LE;
        }
        /// Watchdog control
        register WdtCtl {
            const ADDRESS = 0x4008_0008;
            const SIZE_BITS = 32;

            inten: bool = 0,
            resen: bool = 1,
            intty: bool = 2,
        },
        /// Watchdog lock, writing the unlock key opens the other watchdog registers
        register WdtLock {
            const ADDRESS = 0x4008_0C00;
            const SIZE_BITS = 32;

            value: uint = 0..32,
        },
        /// GPIO data output enable, one bit per DIO
        register GpioDoe {
            const ADDRESS = 0x4002_20D0;
            const SIZE_BITS = 32;

            value: uint = 0..32,
        },
        /// Shutdown request
        register AonWucShutdown {
            const ADDRESS = 0x4009_1018;
            const SIZE_BITS = 32;

            en: bool = 0,
        },
        register AonRtcCtl {
            const ADDRESS = 0x4009_2000;
            const SIZE_BITS = 32;

            en: bool = 0,
            rtc_upd_en: bool = 1,
            /// Channels that feed the combined event
            comb_ev_mask: uint = 16..19,
        },
        /// Channel events, one byte per channel, write 1 to clear
        register AonRtcEvflags {
            const ADDRESS = 0x4009_2004;
            const SIZE_BITS = 32;

            value: uint = 0..32,
        },
        register AonRtcSec {
            const ADDRESS = 0x4009_2008;
            const SIZE_BITS = 32;
            type Access = RO;

            value: uint = 0..32,
        },
        register AonRtcSubsec {
            const ADDRESS = 0x4009_200C;
            const SIZE_BITS = 32;
            type Access = RO;

            value: uint = 0..32,
        },
        register AonRtcChctl {
            const ADDRESS = 0x4009_2014;
            const SIZE_BITS = 32;

            /// Channel 0
            compare_en: bool = 0,
        },
        /// Channel 0 compare value, 16.16 seconds
        register AonRtcCompare {
            const ADDRESS = 0x4009_2018;
            const SIZE_BITS = 32;

            value: uint = 0..32,
        },
        /// Reading this waits for all pending AON writes
        register AonRtcSync {
            const ADDRESS = 0x4009_202C;
            const SIZE_BITS = 32;
            type Access = RO;

            value: uint = 0..32,
        },
        /// The AON events that wake the MCU domain
        register AonEventMcuWakeSel {
            const ADDRESS = 0x4009_3000;
            const SIZE_BITS = 32;

            /// `WU0_EV`, the other selectors stay as they are
            first_event: uint = 0..6,
        },
    }
);
