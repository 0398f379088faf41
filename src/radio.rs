use crate::layouts::radio_config_layout;
use modular_bitfield::prelude::*;

/// Size of a serialized [RadioLinkConfig].
pub const RADIO_CONFIG_SIZE: usize = 21;
/// Highest channel the radio can tune to.
pub const RADIO_MAX_RF_CHANNEL: u8 = 127;
/// Retry delay and retry count are 4 bit register fields.
pub const RADIO_MAX_RETRY_SETTING: u8 = 15;
/// Length of a pipe address on air.
pub const RADIO_ADDRESS_WIDTH: usize = 5;

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeserializationError {
    /// The buffer is shorter than [RADIO_CONFIG_SIZE].
    BufferTooSmall,
    /// A field holds a value the radio can't be configured with.
    ValueOutOfRange,
}

impl core::fmt::Display for DeserializationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DeserializationError::BufferTooSmall => write!(f, "radio config buffer too small"),
            DeserializationError::ValueOutOfRange => write!(f, "radio config value out of range"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DeserializationError {}

/// Auto retransmit register of the radio: delay in the high nibble, count in
/// the low nibble.
#[bitfield]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SetupRetr {
    pub retransmit_count: B4,
    pub retransmit_delay: B4,
}

/// Settings shared by the DMX transmitter and the receivers on the other end
/// of the wireless link. Both sides have to use identical values.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RadioLinkConfig {
    pub rf_channel: u8,
    /// Wait `(retry_delay + 1) * 250` us before a retransmit.
    pub retry_delay: u8,
    pub max_retries: u8,
    /// Upper bytes of the data pipe address, the lowest byte is the pipe number.
    pub data_pipe_mask: u64,
    pub data_pipe_number: u8,
    pub telemetry_pipe_mask: u64,
    pub telemetry_pipe_number: u8,
}

impl Default for RadioLinkConfig {
    fn default() -> Self {
        Self {
            rf_channel: 0x4C,
            retry_delay: 15,
            max_retries: 15,
            data_pipe_mask: 0xF0F0_F0F0_00,
            data_pipe_number: 1,
            telemetry_pipe_mask: 0xF1F1_F1F1_00,
            telemetry_pipe_number: 2,
        }
    }
}

/// The pipe number fills the lowest byte and the address is five bytes wide.
fn valid_pipe_mask(mask: u64) -> bool {
    mask & 0xFF == 0 && mask >> (8 * RADIO_ADDRESS_WIDTH) == 0
}

fn pipe_address(mask: u64, pipe_number: u8) -> [u8; RADIO_ADDRESS_WIDTH] {
    let mut address = [0u8; RADIO_ADDRESS_WIDTH];
    address.copy_from_slice(&(mask | pipe_number as u64).to_le_bytes()[..RADIO_ADDRESS_WIDTH]);
    address
}

impl RadioLinkConfig {
    /// Data pipe address, least significant byte first as the radio expects it.
    pub fn data_pipe_address(&self) -> [u8; RADIO_ADDRESS_WIDTH] {
        pipe_address(self.data_pipe_mask, self.data_pipe_number)
    }

    pub fn telemetry_pipe_address(&self) -> [u8; RADIO_ADDRESS_WIDTH] {
        pipe_address(self.telemetry_pipe_mask, self.telemetry_pipe_number)
    }

    pub fn retry_delay_micros(&self) -> u32 {
        (self.retry_delay as u32 + 1) * 250
    }

    pub fn setup_retr(&self) -> SetupRetr {
        SetupRetr::new()
            .with_retransmit_count(self.max_retries & 0x0F)
            .with_retransmit_delay(self.retry_delay & 0x0F)
    }

    pub fn serialize(&self) -> [u8; RADIO_CONFIG_SIZE] {
        let mut buffer = [0u8; RADIO_CONFIG_SIZE];
        let mut view = radio_config_layout::View::new(&mut buffer[..]);

        view.rf_channel_mut().write(self.rf_channel);
        view.retry_delay_mut().write(self.retry_delay);
        view.max_retries_mut().write(self.max_retries);
        view.data_pipe_number_mut().write(self.data_pipe_number);
        view.telemetry_pipe_number_mut()
            .write(self.telemetry_pipe_number);
        view.data_pipe_mask_mut().write(self.data_pipe_mask);
        view.telemetry_pipe_mask_mut()
            .write(self.telemetry_pipe_mask);

        buffer
    }

    pub fn deserialize(data: &[u8]) -> Result<Self, DeserializationError> {
        if data.len() < RADIO_CONFIG_SIZE {
            return Err(DeserializationError::BufferTooSmall);
        }

        let view = radio_config_layout::View::new(&data[..RADIO_CONFIG_SIZE]);
        let config = Self {
            rf_channel: view.rf_channel().read(),
            retry_delay: view.retry_delay().read(),
            max_retries: view.max_retries().read(),
            data_pipe_mask: view.data_pipe_mask().read(),
            data_pipe_number: view.data_pipe_number().read(),
            telemetry_pipe_mask: view.telemetry_pipe_mask().read(),
            telemetry_pipe_number: view.telemetry_pipe_number().read(),
        };

        if config.rf_channel > RADIO_MAX_RF_CHANNEL
            || config.retry_delay > RADIO_MAX_RETRY_SETTING
            || config.max_retries > RADIO_MAX_RETRY_SETTING
            || !valid_pipe_mask(config.data_pipe_mask)
            || !valid_pipe_mask(config.telemetry_pipe_mask)
        {
            return Err(DeserializationError::ValueOutOfRange);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use crate::radio::{DeserializationError, RadioLinkConfig, RADIO_CONFIG_SIZE};

    #[test]
    fn test_default_addresses() {
        let config = RadioLinkConfig::default();

        assert_eq!(config.data_pipe_address(), [0x01, 0xF0, 0xF0, 0xF0, 0xF0]);
        assert_eq!(
            config.telemetry_pipe_address(),
            [0x02, 0xF1, 0xF1, 0xF1, 0xF1]
        );
    }

    #[test]
    fn test_retry_settings() {
        let config = RadioLinkConfig::default();

        assert_eq!(config.retry_delay_micros(), 4000);
        assert_eq!(config.setup_retr().into_bytes(), [0xFF]);

        let config = RadioLinkConfig {
            retry_delay: 5,
            max_retries: 3,
            ..Default::default()
        };
        assert_eq!(config.retry_delay_micros(), 1500);
        assert_eq!(config.setup_retr().into_bytes(), [0x53]);
    }

    #[test]
    fn test_serialized_layout() {
        let bytes = RadioLinkConfig::default().serialize();

        assert_eq!(&bytes[..5], &[0x4C, 15, 15, 1, 2]);
        assert_eq!(&bytes[5..13], &[0x00, 0xF0, 0xF0, 0xF0, 0xF0, 0, 0, 0]);
        assert_eq!(
            RadioLinkConfig::deserialize(&bytes).unwrap(),
            RadioLinkConfig::default()
        );
    }

    #[test]
    fn test_deserialize_failure() {
        let mut bytes = RadioLinkConfig::default().serialize();

        assert!(matches!(
            RadioLinkConfig::deserialize(&bytes[..RADIO_CONFIG_SIZE - 1]),
            Err(DeserializationError::BufferTooSmall)
        ));

        bytes[0] = 200;
        assert!(matches!(
            RadioLinkConfig::deserialize(&bytes),
            Err(DeserializationError::ValueOutOfRange)
        ));

        bytes[0] = 0x4C;
        bytes[2] = 16;
        assert!(matches!(
            RadioLinkConfig::deserialize(&bytes),
            Err(DeserializationError::ValueOutOfRange)
        ));
    }

    #[test]
    fn test_deserialize_rejects_bad_pipe_masks() {
        let mut bytes = RadioLinkConfig::default().serialize();

        // pipe number bits set in the data pipe mask
        bytes[5] = 0x01;
        assert!(matches!(
            RadioLinkConfig::deserialize(&bytes),
            Err(DeserializationError::ValueOutOfRange)
        ));

        // telemetry pipe mask wider than five bytes
        bytes[5] = 0x00;
        bytes[19] = 0x01;
        assert!(matches!(
            RadioLinkConfig::deserialize(&bytes),
            Err(DeserializationError::ValueOutOfRange)
        ));

        bytes[19] = 0x00;
        assert_eq!(
            RadioLinkConfig::deserialize(&bytes).unwrap(),
            RadioLinkConfig::default()
        );
    }
}
