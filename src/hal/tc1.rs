use avr_device::atmega328p::TC1;

use super::timer1::{CompareChannel, CompareTimer, Prescaler};

// TIMSK1 / TIFR1 bit positions
const OCIE1A: u8 = 1;
const OCIE1B: u8 = 2;
const OCF1A: u8 = 1;
const OCF1B: u8 = 2;

/// Timer/Counter1 of the ATmega328P.
pub struct Tc1 {
    _private: (),
}

impl Tc1 {
    /// The caller must be the sole user of TC1.
    pub const fn new() -> Self {
        Self { _private: () }
    }

    #[inline]
    fn regs(&self) -> &avr_device::atmega328p::tc1::RegisterBlock {
        unsafe { &*TC1::ptr() }
    }
}

impl Default for Tc1 {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
const fn enable_bit(channel: CompareChannel) -> u8 {
    match channel {
        CompareChannel::A => 1 << OCIE1A,
        CompareChannel::B => 1 << OCIE1B,
    }
}

#[inline]
const fn flag_bit(channel: CompareChannel) -> u8 {
    match channel {
        CompareChannel::A => 1 << OCF1A,
        CompareChannel::B => 1 << OCF1B,
    }
}

// TCNT1 and OCR1A/B go through one shared TEMP byte, so every 16-bit
// access runs with interrupts off.
impl CompareTimer for Tc1 {
    #[inline]
    fn counter(&self) -> u16 {
        avr_device::interrupt::free(|_| self.regs().tcnt1.read().bits())
    }

    #[inline]
    fn set_counter(&self, value: u16) {
        avr_device::interrupt::free(|_| unsafe {
            self.regs().tcnt1.write(|w| w.bits(value));
        })
    }

    fn set_compare(&self, channel: CompareChannel, target: u16) {
        avr_device::interrupt::free(|_| unsafe {
            match channel {
                CompareChannel::A => self.regs().ocr1a.write(|w| w.bits(target)),
                CompareChannel::B => self.regs().ocr1b.write(|w| w.bits(target)),
            }
        })
    }

    #[inline]
    fn compare_interrupt_enabled(&self, channel: CompareChannel) -> bool {
        self.regs().timsk1.read().bits() & enable_bit(channel) != 0
    }

    fn set_compare_interrupt(&self, channel: CompareChannel, enabled: bool) {
        let bit = enable_bit(channel);
        unsafe {
            self.regs().timsk1.modify(|r, w| {
                if enabled {
                    w.bits(r.bits() | bit)
                } else {
                    w.bits(r.bits() & !bit)
                }
            });
        }
    }

    fn clear_compare_flag(&self, channel: CompareChannel) {
        // Flags are cleared by writing a one; other bits stay untouched.
        unsafe {
            self.regs().tifr1.write(|w| w.bits(flag_bit(channel)));
        }
    }

    fn select_prescaler(&self, prescaler: Prescaler) {
        unsafe {
            self.regs().tccr1b.modify(|r, w| {
                w.bits((r.bits() & !Prescaler::MASK) | (prescaler.bits() & Prescaler::MASK))
            });
        }
    }

    fn stop(&self) {
        unsafe {
            self.regs().tccr1a.write(|w| w.bits(0));
            self.regs().tccr1b.write(|w| w.bits(0));
        }
    }

    #[inline]
    fn interrupt_free<R>(&self, f: impl FnOnce() -> R) -> R {
        avr_device::interrupt::free(|_| f())
    }
}
