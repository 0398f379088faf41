use crate::hal::{DmxSerialHal, FrameFormat, ReceiveStatus, SerialEnables};
use modular_bitfield::prelude::*;

/// The registers of one ATmega USART channel.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UsartRegister {
    /// Control and status register A.
    Ucsra,
    /// Control register B, feature and interrupt enables.
    Ucsrb,
    /// Control register C, frame format.
    Ucsrc,
    Ubrrl,
    Ubrrh,
    /// Data register.
    Udr,
}

/// Raw byte access to a USART register block.
pub trait UsartRegisters {
    fn read(&mut self, register: UsartRegister) -> u8;
    fn write(&mut self, register: UsartRegister, value: u8);

    /// True if `UCSRC` and `UBRRH` share one address, as on the ATmega8/16/32.
    /// Writes to `UCSRC` then need the register select bit set.
    fn ucsrc_shares_ubrrh(&self) -> bool {
        false
    }
}

/// Set in a value written to the shared `UCSRC`/`UBRRH` address to select `UCSRC`.
pub const URSEL: u8 = 0x80;

/// Layout of `UCSRnA`, the status register.
#[bitfield]
#[derive(Copy, Clone, Debug)]
pub struct Ucsra {
    pub multi_processor_mode: bool,
    pub double_speed: bool,
    pub parity_error: bool,
    pub data_overrun: bool,
    pub frame_error: bool,
    pub data_register_empty: bool,
    pub transmit_complete: bool,
    pub receive_complete: bool,
}

/// Layout of `UCSRnB`, the enable register.
#[bitfield]
#[derive(Copy, Clone, Debug)]
pub struct Ucsrb {
    pub transmit_bit_8: bool,
    pub receive_bit_8: bool,
    pub character_size_2: bool,
    pub transmitter_enable: bool,
    pub receiver_enable: bool,
    pub data_register_empty_interrupt: bool,
    pub transmit_complete_interrupt: bool,
    pub receive_complete_interrupt: bool,
}

/// Data space addresses of a USART register block.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct UsartAddresses {
    pub ucsra: usize,
    pub ucsrb: usize,
    pub ucsrc: usize,
    pub ubrrl: usize,
    pub ubrrh: usize,
    pub udr: usize,
    /// `ucsrc` and `ubrrh` are the same address.
    pub shared_ucsrc: bool,
}

impl UsartAddresses {
    /// The USART of the ATmega8.
    pub const ATMEGA8: Self = Self {
        ucsra: 0x2B,
        ucsrb: 0x2A,
        ucsrc: 0x40,
        ubrrl: 0x29,
        ubrrh: 0x40,
        udr: 0x2C,
        shared_ucsrc: true,
    };

    /// USART0 of the ATmega48/88/168/328 family (Arduino Uno and friends).
    pub const ATMEGA328P_USART0: Self = Self {
        ucsra: 0xC0,
        ucsrb: 0xC1,
        ucsrc: 0xC2,
        ubrrl: 0xC4,
        ubrrh: 0xC5,
        udr: 0xC6,
        shared_ucsrc: false,
    };

    /// USART0 of the ATmega1280/2560.
    pub const ATMEGA2560_USART0: Self = Self::ATMEGA328P_USART0;

    /// USART1 of the ATmega1280/2560 and the only USART of the ATmega32U4.
    pub const ATMEGA2560_USART1: Self = Self {
        ucsra: 0xC8,
        ucsrb: 0xC9,
        ucsrc: 0xCA,
        ubrrl: 0xCC,
        ubrrh: 0xCD,
        udr: 0xCE,
        shared_ucsrc: false,
    };

    fn address_of(&self, register: UsartRegister) -> usize {
        match register {
            UsartRegister::Ucsra => self.ucsra,
            UsartRegister::Ucsrb => self.ucsrb,
            UsartRegister::Ucsrc => self.ucsrc,
            UsartRegister::Ubrrl => self.ubrrl,
            UsartRegister::Ubrrh => self.ubrrh,
            UsartRegister::Udr => self.udr,
        }
    }
}

/// Memory mapped register block accessed with volatile reads and writes.
#[derive(Debug)]
pub struct MmioUsart {
    addresses: UsartAddresses,
}

impl MmioUsart {
    /// # Safety
    /// The addresses have to point at the registers of a USART of the running
    /// device, and no other code may access that USART while this object lives.
    pub const unsafe fn new(addresses: UsartAddresses) -> Self {
        Self { addresses }
    }
}

impl UsartRegisters for MmioUsart {
    fn read(&mut self, register: UsartRegister) -> u8 {
        let address = self.addresses.address_of(register) as *const u8;
        // Safety: guaranteed by the contract of MmioUsart::new.
        unsafe { core::ptr::read_volatile(address) }
    }

    fn write(&mut self, register: UsartRegister, value: u8) {
        let address = self.addresses.address_of(register) as *mut u8;
        // Safety: guaranteed by the contract of MmioUsart::new.
        unsafe { core::ptr::write_volatile(address, value) }
    }

    fn ucsrc_shares_ubrrh(&self) -> bool {
        self.addresses.shared_ucsrc
    }
}

/// Rounded `UBRRn` value for normal speed mode: `cpu_hz / 16 / baud - 1`.
pub const fn baud_divisor(cpu_hz: u32, baud_rate: u32) -> u16 {
    (((cpu_hz / 8) / baud_rate).saturating_sub(1) / 2) as u16
}

/// [DmxSerialHal] for the USART found on AVR ATmega devices.
#[derive(Debug)]
pub struct AvrUsart<R: UsartRegisters> {
    registers: R,
    cpu_hz: u32,
}

impl<R: UsartRegisters> AvrUsart<R> {
    pub fn new(registers: R, cpu_hz: u32) -> Self {
        Self { registers, cpu_hz }
    }

    pub fn release(self) -> R {
        self.registers
    }
}

impl<R: UsartRegisters> DmxSerialHal for AvrUsart<R> {
    fn set_baud_rate(&mut self, baud_rate: u32) {
        let divisor = baud_divisor(self.cpu_hz, baud_rate);

        // leave double speed mode, the divisor is calculated for normal speed
        self.registers.write(UsartRegister::Ucsra, 0);
        self.registers
            .write(UsartRegister::Ubrrh, (divisor >> 8) as u8);
        self.registers.write(UsartRegister::Ubrrl, divisor as u8);
    }

    fn set_frame_format(&mut self, format: FrameFormat) {
        let mut ucsrc = format.into_bytes()[0];
        if self.registers.ucsrc_shares_ubrrh() {
            ucsrc |= URSEL;
        }

        self.registers.write(UsartRegister::Ucsrc, ucsrc);
    }

    fn set_enables(&mut self, enables: SerialEnables) {
        let ucsrb = Ucsrb::new()
            .with_transmitter_enable(enables.transmitter())
            .with_receiver_enable(enables.receiver())
            .with_receive_complete_interrupt(enables.receive_complete())
            .with_transmit_complete_interrupt(enables.transmit_complete())
            .with_data_register_empty_interrupt(enables.transmit_ready());

        self.registers
            .write(UsartRegister::Ucsrb, ucsrb.into_bytes()[0]);
    }

    fn write_byte(&mut self, byte: u8) {
        self.registers.write(UsartRegister::Udr, byte);
    }

    fn read_byte(&mut self) -> u8 {
        self.registers.read(UsartRegister::Udr)
    }

    fn read_status(&mut self) -> ReceiveStatus {
        let ucsra = Ucsra::from_bytes([self.registers.read(UsartRegister::Ucsra)]);

        ReceiveStatus {
            framing_error: ucsra.frame_error(),
            overrun: ucsra.data_overrun(),
            parity_error: ucsra.parity_error(),
        }
    }
}
