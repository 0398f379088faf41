pub const DMX_NULL_START: u8 = 0x00;
/// Highest addressable channel.
pub const DMX_MAX_CHANNEL: usize = 512;
/// start code slot + 512 channel slots
pub const DMX_BUFFER_SIZE: usize = DMX_MAX_CHANNEL + 1;

pub const DMX_BAUD: u32 = 250_000;
/// A zero byte at this speed with 8E1 framing holds the line low for 100us
/// and leaves a 10us mark before the start code.
pub const BREAK_BAUD: u32 = 100_000;

/// Channels sent per frame after entering transmitter mode.
pub const DEFAULT_TRANSMIT_CHANNELS: u16 = 32;

pub const TX_BREAK_MIN_MICROS: u32 = 92;
pub const TX_MAB_MIN_MICROS: u32 = 12;
pub const RX_BREAK_MIN_MICROS: u32 = 88;
pub const RX_MAB_MIN_MICROS: u32 = 8;
/// One slot (start bit, 8 data bits, 2 stop bits) at 250k baud.
pub const SLOT_MICROS: u32 = 44;

/// A receiver should consider the link lost if no frame arrived for this long.
pub const LINK_LOSS_MILLIS: u32 = 1000;
