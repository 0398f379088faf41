//! Test doubles for the hardware seams.

use crate::hal::{DmxSerialHal, FrameFormat, MonotonicClock, ReceiveStatus, SerialEnables};
use core::cell::Cell;
use core::convert::Infallible;

/// Records everything the driver does to the UART.
pub struct MockHal {
    /// Written bytes together with the baud rate that was active.
    pub written: heapless::Vec<(u8, u32), 2048>,
    pub baud_rate: u32,
    pub format: FrameFormat,
    pub enables: SerialEnables,
    /// Byte and status returned by the next read.
    pub pending: (u8, ReceiveStatus),
}

impl MockHal {
    pub fn new() -> Self {
        Self {
            written: heapless::Vec::new(),
            baud_rate: 0,
            format: FrameFormat::new(),
            enables: SerialEnables::none(),
            pending: (0, ReceiveStatus::default()),
        }
    }
}

impl DmxSerialHal for MockHal {
    fn set_baud_rate(&mut self, baud_rate: u32) {
        self.baud_rate = baud_rate;
    }

    fn set_frame_format(&mut self, format: FrameFormat) {
        self.format = format;
    }

    fn set_enables(&mut self, enables: SerialEnables) {
        self.enables = enables;
    }

    fn write_byte(&mut self, byte: u8) {
        self.written.push((byte, self.baud_rate)).unwrap();
    }

    fn read_byte(&mut self) -> u8 {
        self.pending.0
    }

    fn read_status(&mut self) -> ReceiveStatus {
        self.pending.1
    }
}

#[derive(Debug, Default)]
pub struct MockPin {
    pub high: bool,
}

impl embedded_hal::digital::ErrorType for MockPin {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high = true;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MockClock {
    pub millis: Cell<u32>,
}

impl MockClock {
    pub fn advance(&self, millis: u32) {
        self.millis.set(self.millis.get().wrapping_add(millis));
    }
}

impl MonotonicClock for MockClock {
    fn now_millis(&self) -> u32 {
        self.millis.get()
    }
}
