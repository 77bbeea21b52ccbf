//! Simulated Timer/Counter1 for running the scheduler off-target.
//!
//! Registers live in `Cell`s. The counter only moves when the test moves it
//! with [`SimTimer1::advance`]; compare matches are latched into the
//! per-channel flag the same way the hardware sets OCF1x.

use core::cell::Cell;

use super::timer1::{CompareChannel, CompareTimer, Prescaler};

#[derive(Debug, Default)]
pub struct SimTimer1 {
    counter: Cell<u16>,
    compare: [Cell<u16>; 2],
    enabled: [Cell<bool>; 2],
    flags: [Cell<bool>; 2],
    /// Whether the last write of each compare register happened masked
    compare_masked: [Cell<bool>; 2],
    prescaler: Cell<Prescaler>,
    interrupts_masked: Cell<bool>,
    register_writes: Cell<u32>,
    critical_sections: Cell<u32>,
}

impl SimTimer1 {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock the counter forward by `ticks`, latching compare matches that
    /// are passed on the way. The counter wraps like the real one.
    pub fn advance(&self, ticks: u32) {
        if self.prescaler.get() == Prescaler::Stop {
            return;
        }
        let start = self.counter.get();
        for channel in [CompareChannel::A, CompareChannel::B] {
            let distance = self.compare[channel.index()].get().wrapping_sub(start);
            let distance = if distance == 0 { 0x1_0000 } else { distance as u32 };
            if ticks >= distance {
                self.flags[channel.index()].set(true);
            }
        }
        self.counter.set(start.wrapping_add(ticks as u16));
    }

    /// Ticks until the next match on `channel`, a full sweep when the
    /// target equals the counter.
    pub fn ticks_to_match(&self, channel: CompareChannel) -> u32 {
        match self.compare[channel.index()].get().wrapping_sub(self.counter.get()) {
            0 => 0x1_0000,
            distance => distance as u32,
        }
    }

    /// A latched match whose interrupt is enabled and not masked, i.e. the
    /// handler would run now.
    pub fn match_pending(&self, channel: CompareChannel) -> bool {
        !self.interrupts_masked.get()
            && self.enabled[channel.index()].get()
            && self.flags[channel.index()].get()
    }

    /// Clear the flag the way entering the vector does on hardware.
    pub fn acknowledge(&self, channel: CompareChannel) {
        self.flags[channel.index()].set(false);
    }

    pub fn compare(&self, channel: CompareChannel) -> u16 {
        self.compare[channel.index()].get()
    }

    pub fn flag(&self, channel: CompareChannel) -> bool {
        self.flags[channel.index()].get()
    }

    pub fn compare_written_masked(&self, channel: CompareChannel) -> bool {
        self.compare_masked[channel.index()].get()
    }

    pub fn prescaler(&self) -> Prescaler {
        self.prescaler.get()
    }

    pub fn interrupts_masked(&self) -> bool {
        self.interrupts_masked.get()
    }

    /// Number of register writes performed through [`CompareTimer`].
    pub fn register_writes(&self) -> u32 {
        self.register_writes.get()
    }

    pub fn critical_sections(&self) -> u32 {
        self.critical_sections.get()
    }

    fn wrote(&self) {
        self.register_writes.set(self.register_writes.get() + 1);
    }
}

impl CompareTimer for SimTimer1 {
    fn counter(&self) -> u16 {
        self.counter.get()
    }

    fn set_counter(&self, value: u16) {
        self.wrote();
        self.counter.set(value);
    }

    fn set_compare(&self, channel: CompareChannel, target: u16) {
        self.wrote();
        self.compare[channel.index()].set(target);
        self.compare_masked[channel.index()].set(self.interrupts_masked.get());
    }

    fn compare_interrupt_enabled(&self, channel: CompareChannel) -> bool {
        self.enabled[channel.index()].get()
    }

    fn set_compare_interrupt(&self, channel: CompareChannel, enabled: bool) {
        self.wrote();
        self.enabled[channel.index()].set(enabled);
    }

    fn clear_compare_flag(&self, channel: CompareChannel) {
        self.wrote();
        self.flags[channel.index()].set(false);
    }

    fn select_prescaler(&self, prescaler: Prescaler) {
        self.wrote();
        self.prescaler.set(prescaler);
    }

    fn stop(&self) {
        self.wrote();
        self.prescaler.set(Prescaler::Stop);
    }

    fn interrupt_free<R>(&self, f: impl FnOnce() -> R) -> R {
        self.critical_sections.set(self.critical_sections.get() + 1);
        let was_masked = self.interrupts_masked.replace(true);
        let r = f();
        self.interrupts_masked.set(was_masked);
        r
    }
}
