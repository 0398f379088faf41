//! Rust library for sending and receiving DMX512 (ANSI E1.11) with a bare UART, driven entirely
//! by its interrupts. It does not allocate and runs on `no_std` targets, the `std` feature only
//! adds [std::error::Error] implementations.
//!
//! A UART can't generate or detect a DMX break on its own. The transmitter sends a single zero
//! byte at 100k baud with 8E1 framing, which keeps the line low for 100us followed by a 10us
//! mark, then switches to 250k baud 8N2 for the start code and the channel data. The receiver
//! runs at 250k baud all the time and sees the break as a framing error.
//!
//! Please refer to the [official specifications](https://tsp.esta.org/) published by the ESTA.
//!
//! # Usage
//!
//! The hardware is accessed through [hal::DmxSerialHal]. [avr::AvrUsart] implements it for the
//! USART of the ATmega devices, other platforms implement the trait themselves.
//!
//! ## Transmitter
//!
//! ```ignore
//! use dmx_isr::avr::{AvrUsart, MmioUsart, UsartAddresses};
//! use dmx_isr::driver::{DmxMode, DmxSerial, DmxSerialConfig};
//! use dmx_isr::shared::SharedDmx;
//!
//! static DMX: SharedDmx<AvrUsart<MmioUsart>, DirectionPin, Millis> = SharedDmx::new();
//!
//! let usart = AvrUsart::new(unsafe { MmioUsart::new(UsartAddresses::ATMEGA328P_USART0) }, 16_000_000);
//! let mut dmx = DmxSerial::new(usart, direction_pin, Millis, DmxSerialConfig::default());
//! dmx.init(DmxMode::Transmitter).unwrap();
//! DMX.install(dmx);
//!
//! loop {
//!     let level = read_fader();
//!     // writing channel 40 makes every frame 40 channels long
//!     DMX.with(|dmx| dmx.write(40, level));
//! }
//!
//! #[avr_device::interrupt(atmega328p)]
//! fn USART_TX() {
//!     DMX.on_transmit_complete_interrupt();
//! }
//!
//! #[avr_device::interrupt(atmega328p)]
//! fn USART_UDRE() {
//!     DMX.on_transmit_ready_interrupt();
//! }
//! ```
//!
//! ## Receiver
//!
//! ```ignore
//! use dmx_isr::consts::LINK_LOSS_MILLIS;
//! use dmx_isr::driver::DmxMode;
//!
//! DMX.with(|dmx| dmx.init(DmxMode::Receiver)).unwrap().unwrap();
//!
//! loop {
//!     let (lost, level) = DMX
//!         .with(|dmx| (dmx.no_data_since() > LINK_LOSS_MILLIS, dmx.read(1)))
//!         .unwrap();
//!
//!     set_led(if lost { 0 } else { level });
//! }
//!
//! #[avr_device::interrupt(atmega328p)]
//! fn USART_RX() {
//!     DMX.on_receive_interrupt();
//! }
//! ```
//!
//! RDM and other alternate start codes are not supported, such frames are dropped.

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[macro_use]
mod fmt;

/// ATmega USART implementation of [hal::DmxSerialHal].
pub mod avr;
pub mod consts;
/// The DMX driver: channel buffer, mode setup and interrupt entry points.
pub mod driver;
/// Traits that abstract the UART and the millisecond clock.
pub mod hal;
mod layouts;
/// Configuration of the wireless link that forwards DMX between boards.
pub mod radio;
pub mod receiver;
/// Access to a single driver from main loop and interrupts.
pub mod shared;
pub mod transmitter;

#[cfg(test)]
mod mock;

pub use driver::{DmxFrame, DmxMode, DmxSerial, DmxSerialConfig, DmxSerialError};
