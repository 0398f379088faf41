use crate::consts::{BREAK_BAUD, DMX_BAUD};
use modular_bitfield::prelude::*;

#[derive(BitfieldSpecifier, Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CharacterSize {
    FiveBits = 0,
    SixBits = 1,
    SevenBits = 2,
    EightBits = 3,
}

#[derive(BitfieldSpecifier, Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    Disabled = 0,
    Reserved = 1,
    Even = 2,
    Odd = 3,
}

/// Character framing of the serial port.
///
/// The bit layout matches the `UCSRnC` register of the ATmega USART so that
/// platforms with that peripheral can write the byte unchanged.
#[bitfield]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FrameFormat {
    pub clock_polarity: bool,
    pub character_size: CharacterSize,
    pub two_stop_bits: bool,
    pub parity: Parity,
    #[skip]
    mode_select: B2,
}

impl FrameFormat {
    /// 8 data bits, no parity, 2 stop bits.
    pub fn dmx_data() -> Self {
        Self::new()
            .with_character_size(CharacterSize::EightBits)
            .with_two_stop_bits(true)
            .with_parity(Parity::Disabled)
    }

    /// 8 data bits, even parity, 1 stop bit. A zero byte keeps the line low
    /// for 10 bit times, the stop bit becomes the mark after break.
    pub fn dmx_break() -> Self {
        Self::new()
            .with_character_size(CharacterSize::EightBits)
            .with_two_stop_bits(false)
            .with_parity(Parity::Even)
    }
}

/// Bit rate plus framing, applied together whenever the driver switches
/// between break and data speed.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BaudProfile {
    pub baud_rate: u32,
    pub format: FrameFormat,
}

impl BaudProfile {
    pub fn dmx_data() -> Self {
        Self {
            baud_rate: DMX_BAUD,
            format: FrameFormat::dmx_data(),
        }
    }

    pub fn dmx_break() -> Self {
        Self {
            baud_rate: BREAK_BAUD,
            format: FrameFormat::dmx_break(),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for FrameFormat {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "FrameFormat({=u8:#x})", self.into_bytes()[0]);
    }
}

/// The peripheral features and interrupt sources that are switched on.
#[bitfield]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SerialEnables {
    pub transmitter: bool,
    pub receiver: bool,
    /// A byte (or a framing error) was received.
    pub receive_complete: bool,
    /// The last byte including its stop bits left the shift register.
    pub transmit_complete: bool,
    /// The data register can take the next byte.
    pub transmit_ready: bool,
    #[skip]
    reserved: B3,
}

impl SerialEnables {
    /// Everything off.
    pub fn none() -> Self {
        Self::new()
    }

    pub fn receive() -> Self {
        Self::new()
            .with_receiver(true)
            .with_receive_complete(true)
    }

    /// Interrupt once the byte in flight is fully on the wire. Used around
    /// speed changes.
    pub fn transmit_on_complete() -> Self {
        Self::new()
            .with_transmitter(true)
            .with_transmit_complete(true)
    }

    /// Interrupt as soon as the next byte can be queued. Used while streaming
    /// channel data at constant speed.
    pub fn transmit_on_ready() -> Self {
        Self::new()
            .with_transmitter(true)
            .with_transmit_ready(true)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SerialEnables {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "SerialEnables({=u8:#x})", self.into_bytes()[0]);
    }
}

/// Receive error flags that belong to the byte currently in the data register.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReceiveStatus {
    /// The stop bit was low. On a DMX line this is how a break shows up.
    pub framing_error: bool,
    pub overrun: bool,
    pub parity_error: bool,
}

/// Register level access to a UART that can be reconfigured at interrupt time.
///
/// Every method has to be callable from an interrupt handler, so none of them
/// may block.
pub trait DmxSerialHal {
    fn set_baud_rate(&mut self, baud_rate: u32);

    fn set_frame_format(&mut self, format: FrameFormat);

    /// Replace the full set of enabled features and interrupt sources.
    fn set_enables(&mut self, enables: SerialEnables);

    /// Queue a byte for transmission.
    fn write_byte(&mut self, byte: u8);

    /// Take the received byte out of the data register.
    fn read_byte(&mut self) -> u8;

    /// Error flags of the received byte. Has to be read before [DmxSerialHal::read_byte].
    fn read_status(&mut self) -> ReceiveStatus;

    fn apply_profile(&mut self, profile: &BaudProfile) {
        self.set_baud_rate(profile.baud_rate);
        self.set_frame_format(profile.format);
    }
}

/// A free running millisecond counter. It is expected to wrap around.
pub trait MonotonicClock {
    fn now_millis(&self) -> u32;
}

impl<C: MonotonicClock> MonotonicClock for &C {
    fn now_millis(&self) -> u32 {
        (**self).now_millis()
    }
}

#[cfg(test)]
mod tests {
    use crate::hal::{CharacterSize, FrameFormat, Parity, SerialEnables};

    #[test]
    fn test_frame_format_register_values() {
        assert_eq!(FrameFormat::dmx_data().into_bytes(), [0x0E]);
        assert_eq!(FrameFormat::dmx_break().into_bytes(), [0x26]);
    }

    #[test]
    fn test_frame_format_fields() {
        let format = FrameFormat::from_bytes([0x26]);

        assert_eq!(format.character_size(), CharacterSize::EightBits);
        assert_eq!(format.parity(), Parity::Even);
        assert!(!format.two_stop_bits());
    }

    #[test]
    fn test_serial_enables_are_disjoint() {
        assert_eq!(SerialEnables::none().into_bytes(), [0]);
        assert!(!SerialEnables::receive().transmitter());
        assert!(SerialEnables::transmit_on_complete().transmit_complete());
        assert!(!SerialEnables::transmit_on_complete().transmit_ready());
        assert!(SerialEnables::transmit_on_ready().transmit_ready());
        assert!(!SerialEnables::transmit_on_ready().transmit_complete());
    }
}
