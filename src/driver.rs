use crate::consts::{
    DEFAULT_TRANSMIT_CHANNELS, DMX_BUFFER_SIZE, DMX_MAX_CHANNEL, DMX_NULL_START,
};
use crate::hal::{BaudProfile, DmxSerialHal, MonotonicClock, SerialEnables};
use crate::receiver::{ReceiveEvent, ReceiveState, Receiver};
use crate::transmitter::{TransmitPosition, Transmitter};
use embedded_hal::digital::OutputPin;

/// The start code followed by the active channels of one frame.
pub type DmxFrame = heapless::Vec<u8, DMX_BUFFER_SIZE>;

/// Called from the receive interrupt after a frame with changed values
/// completed. It runs at interrupt priority and has to return quickly, at
/// 250k baud the next byte arrives 44us later.
pub type UpdateCallback = fn();

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmxMode {
    /// No traffic, all interrupt sources are disabled.
    Off,
    /// Send the channel buffer continuously.
    Transmitter,
    /// Fill the channel buffer from the line.
    Receiver,
}

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmxSerialError<E> {
    /// The transceiver direction line could not be switched.
    Direction(E),
}

impl<E: core::fmt::Debug> core::fmt::Display for DmxSerialError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DmxSerialError::Direction(error) => {
                write!(f, "couldn't switch transceiver direction: {:?}", error)
            },
        }
    }
}

#[cfg(feature = "std")]
impl<E: core::fmt::Debug> std::error::Error for DmxSerialError<E> {}

#[derive(Debug, Clone)]
pub struct DmxSerialConfig {
    /// Channels sent per frame right after switching to [DmxMode::Transmitter].
    /// Writing a higher channel raises it.
    pub transmit_channels: u16,
}

impl Default for DmxSerialConfig {
    fn default() -> Self {
        Self {
            transmit_channels: DEFAULT_TRANSMIT_CHANNELS,
        }
    }
}

fn clamp_channel(channel: u16) -> u16 {
    channel.clamp(1, DMX_MAX_CHANNEL as u16)
}

/// DMX512 over a UART, either as transmitter or as receiver.
///
/// The normal context configures the driver and reads or writes channels. The
/// interrupt handlers of the UART have to call [DmxSerial::handle_receive_interrupt]
/// (or [DmxSerial::on_byte_received]), [DmxSerial::on_transmit_complete] and
/// [DmxSerial::on_transmit_ready]. Use [crate::shared::SharedDmx] to reach a
/// single instance from both.
///
/// The direction line `P` is driven high for sending and low for receiving.
pub struct DmxSerial<H, P, C> {
    hal: H,
    direction: P,
    clock: C,
    config: DmxSerialConfig,
    mode: DmxMode,
    channels: [u8; DMX_BUFFER_SIZE],
    max_channel: u16,
    updated: bool,
    update_notice: bool,
    last_packet: u32,
    on_update: Option<UpdateCallback>,
    receiver: Receiver,
    transmitter: Transmitter,
}

impl<H: DmxSerialHal, P: OutputPin, C: MonotonicClock> DmxSerial<H, P, C> {
    /// Creates a driver in [DmxMode::Off]. Nothing is sent or received before
    /// [DmxSerial::init] gets called.
    pub fn new(hal: H, direction: P, clock: C, config: DmxSerialConfig) -> Self {
        let last_packet = clock.now_millis();
        let max_channel = clamp_channel(config.transmit_channels);

        Self {
            hal,
            direction,
            clock,
            config,
            mode: DmxMode::Off,
            channels: [0; DMX_BUFFER_SIZE],
            max_channel,
            updated: true,
            update_notice: false,
            last_packet,
            on_update: None,
            receiver: Receiver::new(),
            transmitter: Transmitter::new(),
        }
    }

    /// (Re)initializes the driver in the given mode.
    ///
    /// All interrupt sources are disabled before any state is touched, so
    /// this is safe while the driver is running. The channel buffer is
    /// cleared, a transmitter starts with the configured channel count and a
    /// receiver expects all 512 channels.
    pub fn init(&mut self, mode: DmxMode) -> Result<(), DmxSerialError<P::Error>> {
        self.hal.set_enables(SerialEnables::none());

        self.mode = DmxMode::Off;
        self.receiver.reset();
        self.transmitter.reset();
        self.channels = [0; DMX_BUFFER_SIZE];
        self.last_packet = self.clock.now_millis();
        self.updated = true;
        self.update_notice = false;

        match mode {
            DmxMode::Transmitter => {
                self.direction
                    .set_high()
                    .map_err(DmxSerialError::Direction)?;

                self.set_max_channel(self.config.transmit_channels);
                self.hal.set_enables(SerialEnables::transmit_on_complete());
                self.transmitter
                    .start_break(&mut self.hal, self.max_channel);
            },
            DmxMode::Receiver => {
                self.direction
                    .set_low()
                    .map_err(DmxSerialError::Direction)?;

                self.hal.apply_profile(&BaudProfile::dmx_data());
                self.hal.set_enables(SerialEnables::receive());
                self.set_max_channel(DMX_MAX_CHANNEL as u16);
            },
            DmxMode::Off => {},
        }

        self.mode = mode;
        info!(
            "dmx serial in {:?} mode with {} channels",
            self.mode, self.max_channel
        );

        Ok(())
    }

    /// Stops all traffic. Buffer and configuration stay as they are.
    pub fn term(&mut self) {
        self.hal.set_enables(SerialEnables::none());
        self.mode = DmxMode::Off;
        debug!("dmx serial terminated");
    }

    pub fn mode(&self) -> DmxMode {
        self.mode
    }

    /// Sets the number of channels sent per frame or expected per frame.
    /// Values are clamped to 1..=512.
    pub fn set_max_channel(&mut self, channel: u16) {
        self.max_channel = clamp_channel(channel);
    }

    pub fn max_channel(&self) -> u16 {
        self.max_channel
    }

    /// Reads a channel. The channel is clamped to 1..=512.
    pub fn read(&self, channel: u16) -> u8 {
        self.channels[clamp_channel(channel) as usize]
    }

    /// Writes a channel. The channel is clamped to 1..=512.
    ///
    /// Writing above the current maximum channel raises the maximum, a
    /// transmitter sends the additional channels from the next frame on.
    pub fn write(&mut self, channel: u16, value: u8) {
        let channel = clamp_channel(channel);
        self.channels[channel as usize] = value;

        if channel > self.max_channel {
            self.max_channel = channel;
        }
    }

    /// Direct access to all slots. Slot 0 is unused, channel `n` is at index `n`.
    ///
    /// A receiver fills it byte by byte, so a read between two receive
    /// interrupts can see the first channels of a new frame next to the
    /// remaining channels of the previous one.
    pub fn buffer(&self) -> &[u8; DMX_BUFFER_SIZE] {
        &self.channels
    }

    pub fn buffer_mut(&mut self) -> &mut [u8; DMX_BUFFER_SIZE] {
        &mut self.channels
    }

    /// Snapshot of the frame as it appears on the wire: start code plus the
    /// active channels.
    pub fn frame(&self) -> DmxFrame {
        core::iter::once(DMX_NULL_START)
            .chain(self.channels[1..=self.max_channel as usize].iter().copied())
            .collect()
    }

    /// Milliseconds since the last valid start code. Starts at 0 on
    /// [DmxSerial::init]. Compare against [crate::consts::LINK_LOSS_MILLIS]
    /// or a similar timeout to detect a lost signal.
    pub fn no_data_since(&self) -> u32 {
        self.clock.now_millis().wrapping_sub(self.last_packet)
    }

    /// Registers the callback for completed frames with changed values.
    /// `None` removes it.
    pub fn attach_on_update(&mut self, callback: Option<UpdateCallback>) {
        self.on_update = callback;
    }

    /// True if a received value changed since the flag was last cleared.
    ///
    /// An attached callback consumes the flag at the end of each frame,
    /// without a callback it stays set until [DmxSerial::reset_updated].
    pub fn data_updated(&self) -> bool {
        self.updated
    }

    pub fn reset_updated(&mut self) {
        self.updated = false;
    }

    /// Returns true once for every completed frame that changed values since
    /// the last call.
    ///
    /// Use this instead of the callback if channel updates should be handled
    /// outside of the interrupt.
    pub fn take_update_notice(&mut self) -> bool {
        core::mem::replace(&mut self.update_notice, false)
    }

    pub fn receive_state(&self) -> ReceiveState {
        self.receiver.state()
    }

    pub fn transmit_position(&self) -> TransmitPosition {
        self.transmitter.position()
    }

    /// Receive complete interrupt. Reads the status before the data register.
    pub fn handle_receive_interrupt(&mut self) {
        let status = self.hal.read_status();
        let byte = self.hal.read_byte();

        self.on_byte_received(byte, status.framing_error);
    }

    /// Feed a received byte. A framing error marks a break.
    pub fn on_byte_received(&mut self, byte: u8, framing_error: bool) {
        if self.mode != DmxMode::Receiver {
            return;
        }

        let event = self.receiver.on_byte(
            byte,
            framing_error,
            &mut self.channels,
            self.max_channel as usize,
            &mut self.updated,
        );

        match event {
            ReceiveEvent::FrameStarted => {
                self.last_packet = self.clock.now_millis();
            },
            ReceiveEvent::FrameComplete => {
                if self.updated {
                    self.update_notice = true;

                    if let Some(on_update) = self.on_update {
                        on_update();
                        self.updated = false;
                    }
                }
            },
            ReceiveEvent::ForeignStartCode(start_code) => {
                trace!("dropping frame with start code {}", start_code);
            },
            ReceiveEvent::Break | ReceiveEvent::None => {},
        }
    }

    /// Transmit complete interrupt: the byte in flight and its stop bits are
    /// on the wire.
    pub fn on_transmit_complete(&mut self) {
        if self.mode != DmxMode::Transmitter {
            return;
        }

        self.transmitter
            .on_transmit_complete(&mut self.hal, self.max_channel);
    }

    /// Data register empty interrupt: the next byte can be queued.
    pub fn on_transmit_ready(&mut self) {
        if self.mode != DmxMode::Transmitter {
            return;
        }

        self.transmitter
            .on_transmit_ready(&mut self.hal, &self.channels);
    }

    /// Get a reference to the underlying serial port.
    pub fn get_hal(&mut self) -> &mut H {
        &mut self.hal
    }

    /// Stops all traffic and hands back the hardware.
    pub fn release(mut self) -> (H, P, C) {
        self.term();
        (self.hal, self.direction, self.clock)
    }
}
