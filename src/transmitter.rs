use crate::consts::{DMX_BUFFER_SIZE, DMX_NULL_START};
use crate::hal::{BaudProfile, DmxSerialHal, SerialEnables};

/// The next thing the transmitter puts on the wire.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransmitPosition {
    /// The break byte is in flight, the start code follows once it is complete.
    Break,
    /// The channel with this number is sent on the next ready interrupt.
    Data(u16),
    /// All channels are queued. A break starts after the last one is complete.
    Finished,
}

/// Interrupt driven transmit sequencer.
///
/// Break and start code are sent from the transmit complete interrupt since
/// the speed changes in between. Channel data is sent from the transmit ready
/// interrupt so the next byte is queued while the previous one is shifted out.
#[derive(Debug)]
pub struct Transmitter {
    position: TransmitPosition,
    frame_channels: u16,
}

impl Default for Transmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Transmitter {
    pub const fn new() -> Self {
        Self {
            position: TransmitPosition::Break,
            frame_channels: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn position(&self) -> TransmitPosition {
        self.position
    }

    /// Channels of the frame that is currently sent.
    pub fn frame_channels(&self) -> u16 {
        self.frame_channels
    }

    /// Emit a break. The channel count for the upcoming frame is latched here,
    /// later changes apply to the frame after it.
    pub fn start_break<H: DmxSerialHal>(&mut self, hal: &mut H, max_channel: u16) {
        hal.apply_profile(&BaudProfile::dmx_break());
        hal.write_byte(0);
        self.position = TransmitPosition::Break;
        self.frame_channels = max_channel;
    }

    pub fn on_transmit_complete<H: DmxSerialHal>(&mut self, hal: &mut H, max_channel: u16) {
        match self.position {
            TransmitPosition::Finished => self.start_break(hal, max_channel),
            TransmitPosition::Break => {
                hal.apply_profile(&BaudProfile::dmx_data());
                hal.set_enables(SerialEnables::transmit_on_ready());
                hal.write_byte(DMX_NULL_START);
                self.position = TransmitPosition::Data(1);
            },
            TransmitPosition::Data(_) => {},
        }
    }

    pub fn on_transmit_ready<H: DmxSerialHal>(
        &mut self,
        hal: &mut H,
        channels: &[u8; DMX_BUFFER_SIZE],
    ) {
        let channel = match self.position {
            TransmitPosition::Data(channel) => channel,
            _ => return,
        };

        hal.write_byte(channels[channel as usize]);

        if channel >= self.frame_channels {
            self.position = TransmitPosition::Finished;
            hal.set_enables(SerialEnables::transmit_on_complete());
        } else {
            self.position = TransmitPosition::Data(channel + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::consts::{BREAK_BAUD, DMX_BAUD, DMX_BUFFER_SIZE};
    use crate::hal::SerialEnables;
    use crate::mock::MockHal;
    use crate::transmitter::{TransmitPosition, Transmitter};

    #[test]
    fn test_break_then_start_code() {
        let mut hal = MockHal::new();
        let mut transmitter = Transmitter::new();

        transmitter.start_break(&mut hal, 3);
        assert_eq!(hal.written.as_slice(), &[(0, BREAK_BAUD)]);

        transmitter.on_transmit_complete(&mut hal, 3);
        assert_eq!(hal.written.as_slice(), &[(0, BREAK_BAUD), (0, DMX_BAUD)]);
        assert_eq!(hal.enables, SerialEnables::transmit_on_ready());
        assert_eq!(transmitter.position(), TransmitPosition::Data(1));
    }

    #[test]
    fn test_data_then_finished() {
        let mut hal = MockHal::new();
        let mut transmitter = Transmitter::new();
        let mut channels = [0u8; DMX_BUFFER_SIZE];
        channels[1..4].copy_from_slice(&[1, 2, 3]);

        transmitter.start_break(&mut hal, 3);
        transmitter.on_transmit_complete(&mut hal, 3);
        hal.written.clear();

        for _ in 0..3 {
            transmitter.on_transmit_ready(&mut hal, &channels);
        }

        assert_eq!(
            hal.written.as_slice(),
            &[(1, DMX_BAUD), (2, DMX_BAUD), (3, DMX_BAUD)]
        );
        assert_eq!(transmitter.position(), TransmitPosition::Finished);
        assert_eq!(hal.enables, SerialEnables::transmit_on_complete());

        // a stray ready interrupt sends nothing
        transmitter.on_transmit_ready(&mut hal, &channels);
        assert_eq!(hal.written.len(), 3);
    }

    #[test]
    fn test_complete_during_data_is_ignored() {
        let mut hal = MockHal::new();
        let mut transmitter = Transmitter::new();

        transmitter.start_break(&mut hal, 3);
        transmitter.on_transmit_complete(&mut hal, 3);
        transmitter.on_transmit_complete(&mut hal, 3);

        assert_eq!(hal.written.len(), 2);
        assert_eq!(transmitter.position(), TransmitPosition::Data(1));
    }
}
