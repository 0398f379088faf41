binary_layout::binary_layout!(radio_config_layout, LittleEndian, {
    rf_channel: u8,
    retry_delay: u8,
    max_retries: u8,
    data_pipe_number: u8,
    telemetry_pipe_number: u8,
    data_pipe_mask: u64,
    telemetry_pipe_mask: u64,
});
