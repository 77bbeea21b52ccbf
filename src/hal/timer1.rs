//! Register-level view of the 16-bit Timer/Counter1 with its two output
//! compare units.

/// Clock-select values for TCCR1B (CS12:0).
///
/// `Stop` doubles as "no divider committed yet".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Prescaler {
    #[default]
    Stop = 0,
    Direct = 1,
    Div8 = 2,
    Div64 = 3,
    Div256 = 4,
    Div1024 = 5,
}

impl Prescaler {
    /// Running dividers, smallest first.
    pub const CANDIDATES: [Prescaler; 5] = [
        Prescaler::Direct,
        Prescaler::Div8,
        Prescaler::Div64,
        Prescaler::Div256,
        Prescaler::Div1024,
    ];

    pub const MASK: u8 = 0x07;

    #[inline]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Clock division factor, `0` for a stopped timer.
    pub const fn divisor(self) -> u32 {
        match self {
            Prescaler::Stop => 0,
            Prescaler::Direct => 1,
            Prescaler::Div8 => 8,
            Prescaler::Div64 => 64,
            Prescaler::Div256 => 256,
            Prescaler::Div1024 => 1024,
        }
    }

    /// Longest delay a full counter sweep covers with this divider, in
    /// microseconds. At 16 MHz this runs from 4096 us (`Direct`) to
    /// 4_194_304 us (`Div1024`).
    pub const fn max_delay_us(self, cpu_hz: u32) -> u32 {
        let ticks = self.divisor() as u64 * (u16::MAX as u64 + 1);
        (ticks * 1_000_000 / cpu_hz as u64) as u32
    }
}

/// One of the two output compare units sharing the counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareChannel {
    A,
    B,
}

impl CompareChannel {
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            CompareChannel::A => 0,
            CompareChannel::B => 1,
        }
    }
}

/// Access to a free-running 16-bit counter with two compare units.
///
/// All methods take `&self`: registers are shared with interrupt handlers
/// and are mutated through volatile accesses.
pub trait CompareTimer {
    /// Live counter value (TCNT1).
    fn counter(&self) -> u16;

    fn set_counter(&self, value: u16);

    /// Program the compare target (OCR1A / OCR1B).
    fn set_compare(&self, channel: CompareChannel, target: u16);

    /// Compare-match interrupt enable bit (OCIE1A / OCIE1B).
    fn compare_interrupt_enabled(&self, channel: CompareChannel) -> bool;

    fn set_compare_interrupt(&self, channel: CompareChannel, enabled: bool);

    /// Discard a pending compare-match flag (OCF1A / OCF1B).
    fn clear_compare_flag(&self, channel: CompareChannel);

    /// Apply the clock-select bits, leaving the rest of the control
    /// register alone.
    fn select_prescaler(&self, prescaler: Prescaler);

    /// Clear both control registers, which stops the clock.
    fn stop(&self);

    /// Run `f` with all interrupts masked, restoring the previous state.
    fn interrupt_free<R>(&self, f: impl FnOnce() -> R) -> R;
}

impl<T: CompareTimer> CompareTimer for &T {
    fn counter(&self) -> u16 {
        (**self).counter()
    }

    fn set_counter(&self, value: u16) {
        (**self).set_counter(value)
    }

    fn set_compare(&self, channel: CompareChannel, target: u16) {
        (**self).set_compare(channel, target)
    }

    fn compare_interrupt_enabled(&self, channel: CompareChannel) -> bool {
        (**self).compare_interrupt_enabled(channel)
    }

    fn set_compare_interrupt(&self, channel: CompareChannel, enabled: bool) {
        (**self).set_compare_interrupt(channel, enabled)
    }

    fn clear_compare_flag(&self, channel: CompareChannel) {
        (**self).clear_compare_flag(channel)
    }

    fn select_prescaler(&self, prescaler: Prescaler) {
        (**self).select_prescaler(prescaler)
    }

    fn stop(&self) {
        (**self).stop()
    }

    fn interrupt_free<R>(&self, f: impl FnOnce() -> R) -> R {
        (**self).interrupt_free(f)
    }
}
