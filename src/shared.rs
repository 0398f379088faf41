use crate::driver::DmxSerial;
use crate::hal::{DmxSerialHal, MonotonicClock};
use core::cell::RefCell;
use critical_section::Mutex;
use embedded_hal::digital::OutputPin;

/// A [DmxSerial] that lives in a `static` and is shared between the main
/// loop and the UART interrupt handlers.
///
/// ```ignore
/// static DMX: SharedDmx<AvrUsart<MmioUsart>, DirectionPin, Millis> = SharedDmx::new();
///
/// #[avr_device::interrupt(atmega328p)]
/// fn USART_RX() {
///     DMX.on_receive_interrupt();
/// }
/// ```
///
/// Every access runs inside a critical section, so values like the last
/// packet timestamp are never read half updated. The update callback runs
/// inside that critical section too and must not access the [SharedDmx].
pub struct SharedDmx<H, P, C> {
    inner: Mutex<RefCell<Option<DmxSerial<H, P, C>>>>,
}

impl<H, P, C> Default for SharedDmx<H, P, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H, P, C> SharedDmx<H, P, C> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Installs the driver and returns the one installed before.
    pub fn install(&self, dmx: DmxSerial<H, P, C>) -> Option<DmxSerial<H, P, C>> {
        critical_section::with(|cs| self.inner.borrow(cs).replace(Some(dmx)))
    }

    /// Removes the driver. Interrupts arriving afterwards are ignored.
    pub fn take(&self) -> Option<DmxSerial<H, P, C>> {
        critical_section::with(|cs| self.inner.borrow(cs).borrow_mut().take())
    }

    /// Runs `f` with exclusive access to the driver. Returns `None` if no
    /// driver is installed.
    pub fn with<R>(&self, f: impl FnOnce(&mut DmxSerial<H, P, C>) -> R) -> Option<R> {
        critical_section::with(|cs| self.inner.borrow(cs).borrow_mut().as_mut().map(f))
    }
}

impl<H: DmxSerialHal, P: OutputPin, C: MonotonicClock> SharedDmx<H, P, C> {
    /// Call from the receive complete interrupt.
    pub fn on_receive_interrupt(&self) {
        self.with(|dmx| dmx.handle_receive_interrupt());
    }

    /// Call from the transmit complete interrupt.
    pub fn on_transmit_complete_interrupt(&self) {
        self.with(|dmx| dmx.on_transmit_complete());
    }

    /// Call from the data register empty interrupt.
    pub fn on_transmit_ready_interrupt(&self) {
        self.with(|dmx| dmx.on_transmit_ready());
    }
}
