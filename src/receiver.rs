use crate::consts::{DMX_BUFFER_SIZE, DMX_MAX_CHANNEL, DMX_NULL_START};

/// Position of the receiver within the DMX byte stream.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReceiveState {
    /// Waiting for a break. Bytes are ignored.
    Idle,
    /// A break was seen, the next byte is the start code.
    Break,
    /// Collecting channel values.
    Data,
}

/// What a single received byte did to the frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReceiveEvent {
    None,
    /// A break reset the frame.
    Break,
    /// A null start code followed the break.
    FrameStarted,
    /// A start code other than [DMX_NULL_START]. The frame is dropped.
    ForeignStartCode(u8),
    /// The last expected channel was stored.
    FrameComplete,
}

/// Interrupt driven receive state machine.
///
/// It only owns its state and the write cursor, the channel buffer and the
/// updated flag are borrowed from the driver for every byte.
#[derive(Debug)]
pub struct Receiver {
    state: ReceiveState,
    cursor: usize,
}

impl Default for Receiver {
    fn default() -> Self {
        Self::new()
    }
}

impl Receiver {
    pub const fn new() -> Self {
        Self {
            state: ReceiveState::Idle,
            cursor: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn state(&self) -> ReceiveState {
        self.state
    }

    /// Feed one byte from the receive interrupt.
    ///
    /// `last_slot` is the highest channel expected per frame. `updated` gets set
    /// whenever a stored value changes.
    pub fn on_byte(
        &mut self,
        byte: u8,
        framing_error: bool,
        channels: &mut [u8; DMX_BUFFER_SIZE],
        last_slot: usize,
        updated: &mut bool,
    ) -> ReceiveEvent {
        if framing_error {
            self.state = ReceiveState::Break;
            self.cursor = 0;
            return ReceiveEvent::Break;
        }

        match self.state {
            ReceiveState::Break => {
                if byte != DMX_NULL_START {
                    self.state = ReceiveState::Idle;
                    return ReceiveEvent::ForeignStartCode(byte);
                }

                self.state = ReceiveState::Data;
                self.cursor += 1;
                ReceiveEvent::FrameStarted
            },
            ReceiveState::Data => {
                let slot = &mut channels[self.cursor];
                if *slot != byte {
                    *updated = true;
                    *slot = byte;
                }

                // `>=` also ends the frame if the bound was lowered mid frame.
                let complete = self.cursor >= last_slot.min(DMX_MAX_CHANNEL);
                if complete {
                    self.state = ReceiveState::Idle;
                }
                self.cursor += 1;

                if complete {
                    ReceiveEvent::FrameComplete
                } else {
                    ReceiveEvent::None
                }
            },
            ReceiveState::Idle => ReceiveEvent::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::consts::DMX_BUFFER_SIZE;
    use crate::receiver::{ReceiveEvent, ReceiveState, Receiver};

    fn feed(
        receiver: &mut Receiver,
        channels: &mut [u8; DMX_BUFFER_SIZE],
        last_slot: usize,
        updated: &mut bool,
        bytes: &[u8],
    ) -> heapless::Vec<ReceiveEvent, 16> {
        bytes
            .iter()
            .map(|byte| receiver.on_byte(*byte, false, channels, last_slot, updated))
            .filter(|event| *event != ReceiveEvent::None)
            .collect()
    }

    #[test]
    fn test_full_frame() {
        let mut receiver = Receiver::new();
        let mut channels = [0u8; DMX_BUFFER_SIZE];
        let mut updated = false;

        assert_eq!(
            receiver.on_byte(0, true, &mut channels, 4, &mut updated),
            ReceiveEvent::Break
        );
        let events = feed(
            &mut receiver,
            &mut channels,
            4,
            &mut updated,
            &[0, 10, 20, 30, 40],
        );

        assert_eq!(
            events.as_slice(),
            &[ReceiveEvent::FrameStarted, ReceiveEvent::FrameComplete]
        );
        assert_eq!(&channels[..6], &[0, 10, 20, 30, 40, 0]);
        assert!(updated);
        assert_eq!(receiver.state(), ReceiveState::Idle);
    }

    #[test]
    fn test_bytes_ignored_before_break() {
        let mut receiver = Receiver::new();
        let mut channels = [0u8; DMX_BUFFER_SIZE];
        let mut updated = false;

        let events = feed(&mut receiver, &mut channels, 512, &mut updated, &[0, 1, 2]);

        assert!(events.is_empty());
        assert!(channels.iter().all(|value| *value == 0));
        assert!(!updated);
    }

    #[test]
    fn test_unchanged_values_do_not_mark_updated() {
        let mut receiver = Receiver::new();
        let mut channels = [0u8; DMX_BUFFER_SIZE];
        channels[1] = 7;
        channels[2] = 8;
        let mut updated = false;

        receiver.on_byte(0, true, &mut channels, 2, &mut updated);
        feed(&mut receiver, &mut channels, 2, &mut updated, &[0, 7, 8]);

        assert!(!updated);
    }

    #[test]
    fn test_foreign_start_code() {
        let mut receiver = Receiver::new();
        let mut channels = [0u8; DMX_BUFFER_SIZE];
        let mut updated = false;

        receiver.on_byte(0, true, &mut channels, 3, &mut updated);
        let events = feed(&mut receiver, &mut channels, 3, &mut updated, &[0xCC, 1, 2, 3]);

        assert_eq!(events.as_slice(), &[ReceiveEvent::ForeignStartCode(0xCC)]);
        assert!(channels.iter().all(|value| *value == 0));
        assert_eq!(receiver.state(), ReceiveState::Idle);
    }

    #[test]
    fn test_lowered_bound_ends_frame() {
        let mut receiver = Receiver::new();
        let mut channels = [0u8; DMX_BUFFER_SIZE];
        let mut updated = false;

        receiver.on_byte(0, true, &mut channels, 10, &mut updated);
        feed(&mut receiver, &mut channels, 10, &mut updated, &[0, 1, 2, 3]);

        // bound drops below the cursor, the next byte completes the frame
        assert_eq!(
            receiver.on_byte(4, false, &mut channels, 2, &mut updated),
            ReceiveEvent::FrameComplete
        );
        assert_eq!(receiver.state(), ReceiveState::Idle);
    }
}
