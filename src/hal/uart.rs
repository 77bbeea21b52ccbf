use avr_device::atmega328p::USART0;
use core::convert::Infallible;

use crate::config::UBRR;

// UCSR0A
const RXC0: u8 = 7;
const UDRE0: u8 = 5;
// UCSR0B
const RXEN0: u8 = 4;
const TXEN0: u8 = 3;
// UCSR0C, 8 data bits, no parity, 1 stop bit
const FRAME_8N1: u8 = 0x06;

/// Polled USART0 driver.
pub struct Uart {
    _private: (),
}

impl Uart {
    pub fn new() -> Self {
        unsafe {
            let p = &*USART0::ptr();
            p.ubrr0.write(|w| w.bits(UBRR));
            p.ucsr0c.write(|w| w.bits(FRAME_8N1));
            p.ucsr0b.write(|w| w.bits((1 << RXEN0) | (1 << TXEN0)));
        }
        Self { _private: () }
    }

    #[inline]
    fn regs(&self) -> &avr_device::atmega328p::usart0::RegisterBlock {
        unsafe { &*USART0::ptr() }
    }
}

impl Default for Uart {
    fn default() -> Self {
        Self::new()
    }
}

impl embedded_hal::serial::Write<u8> for Uart {
    type Error = Infallible;

    fn write(&mut self, byte: u8) -> nb::Result<(), Self::Error> {
        if self.regs().ucsr0a.read().bits() & (1 << UDRE0) == 0 {
            return Err(nb::Error::WouldBlock);
        }
        unsafe {
            self.regs().udr0.write(|w| w.bits(byte));
        }
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        if self.regs().ucsr0a.read().bits() & (1 << UDRE0) == 0 {
            Err(nb::Error::WouldBlock)
        } else {
            Ok(())
        }
    }
}

impl embedded_hal::serial::Read<u8> for Uart {
    type Error = Infallible;

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        if self.regs().ucsr0a.read().bits() & (1 << RXC0) == 0 {
            return Err(nb::Error::WouldBlock);
        }
        Ok(self.regs().udr0.read().bits())
    }
}
