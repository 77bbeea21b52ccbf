//! Callback scheduling on the two compare units of Timer1.
//!
//! Both compare channels run off the one free-running counter and therefore
//! share its clock divider. The first request after a [`reset`] commits the
//! divider; later requests on either channel must need the same one or they
//! are refused with [`ScheduleError::IncompatibleABPrescale`].
//!
//! Each channel fires its callback once, a fixed number of times, or until
//! reset. Re-arming adds the channel's compare distance to the live counter
//! with wrapping 16-bit arithmetic, so the counter never has to be stopped or
//! cleared while the other channel is running.
//!
//! Foreground code masks a channel's compare interrupt while it rewrites
//! that channel's state, so the handler only ever sees a complete
//! configuration. [`reset`] masks all interrupts since it also touches the
//! divider and the counter.
//!
//! [`reset`]: Timer1Scheduler::reset

use core::cell::Cell;
use core::sync::atomic::{compiler_fence, Ordering};

mod error;
mod guard;
pub mod rate;

#[cfg(test)]
mod scenarios;

pub use crate::hal::CompareChannel as Channel;
pub use error::ScheduleError;
pub use rate::{compare_setting, CompareSetting};

use crate::config::CPU_FREQ_HZ;
use crate::hal::{CompareTimer, Prescaler};
use guard::CompareGuard;

/// Invoked from the compare-match interrupt with `is_last` set on the final
/// firing of a bounded schedule. Must be short and must not block.
pub type Callback<'a> = &'a dyn Fn(bool);

const IDLE: i16 = 0;
const INDEFINITE: i16 = -1;

struct ChannelState<'a> {
    callback: Cell<Option<Callback<'a>>>,
    /// `> 0` firings left, `< 0` unbounded, `0` idle
    remaining: Cell<i16>,
    compare_distance: Cell<u16>,
}

impl<'a> ChannelState<'a> {
    const fn idle() -> Self {
        Self {
            callback: Cell::new(None),
            remaining: Cell::new(IDLE),
            compare_distance: Cell::new(0),
        }
    }

    fn clear(&self) {
        self.callback.set(None);
        self.remaining.set(IDLE);
        self.compare_distance.set(0);
    }
}

/// Read-only view of one channel's schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelSnapshot {
    pub remaining: i16,
    pub compare_distance: u16,
    /// A callback is held.
    pub armed: bool,
}

impl ChannelSnapshot {
    pub const fn is_idle(&self) -> bool {
        self.remaining == IDLE && !self.armed
    }
}

pub struct Timer1Scheduler<'a, H: CompareTimer> {
    timer: H,
    cpu_hz: u32,
    /// Divider shared by both channels, `Stop` while uncommitted
    prescaler: Cell<Prescaler>,
    channels: [ChannelState<'a>; 2],
}

// SAFETY: AVR is single core. Channel state is written by the foreground
// only while that channel's compare interrupt is masked (or inside a global
// critical section), and otherwise only by that channel's own handler.
#[cfg(target_arch = "avr")]
unsafe impl<H: CompareTimer + Sync> Sync for Timer1Scheduler<'_, H> {}

impl<'a, H: CompareTimer> Timer1Scheduler<'a, H> {
    /// Scheduler clocked at [`CPU_FREQ_HZ`]. Does not touch the hardware;
    /// call [`reset`](Self::reset) before the first schedule.
    pub const fn new(timer: H) -> Self {
        Self::with_clock(timer, CPU_FREQ_HZ)
    }

    pub const fn with_clock(timer: H, cpu_hz: u32) -> Self {
        Self {
            timer,
            cpu_hz,
            prescaler: Cell::new(Prescaler::Stop),
            channels: [ChannelState::idle(), ChannelState::idle()],
        }
    }

    #[inline]
    pub fn timer(&self) -> &H {
        &self.timer
    }

    /// Divider currently committed, `Prescaler::Stop` if none.
    #[inline]
    pub fn prescaler(&self) -> Prescaler {
        self.prescaler.get()
    }

    pub fn channel(&self, channel: Channel) -> ChannelSnapshot {
        let state = self.state(channel);
        ChannelSnapshot {
            remaining: state.remaining.get(),
            compare_distance: state.compare_distance.get(),
            armed: state.callback.get().is_some(),
        }
    }

    /// Fire `callback` once, `delay_ms` from now.
    pub fn schedule_once(
        &self,
        channel: Channel,
        delay_ms: u32,
        callback: Option<Callback<'a>>,
    ) -> Result<(), ScheduleError> {
        self.schedule(channel, delay_ms, 1, callback)
    }

    /// Fire `callback` `count` times, `delay_ms` apart, the first one
    /// `delay_ms` from now.
    pub fn schedule_recurrent(
        &self,
        channel: Channel,
        delay_ms: u32,
        count: i16,
        callback: Option<Callback<'a>>,
    ) -> Result<(), ScheduleError> {
        if count <= 0 {
            return Err(ScheduleError::InvalidRecurrenceValue);
        }
        self.schedule(channel, delay_ms, count, callback)
    }

    /// Fire `callback` every `delay_ms` until the channel is reset.
    pub fn schedule_indefinitely(
        &self,
        channel: Channel,
        delay_ms: u32,
        callback: Option<Callback<'a>>,
    ) -> Result<(), ScheduleError> {
        self.schedule(channel, delay_ms, INDEFINITE, callback)
    }

    fn schedule(
        &self,
        channel: Channel,
        delay_ms: u32,
        remaining: i16,
        callback: Option<Callback<'a>>,
    ) -> Result<(), ScheduleError> {
        let callback = callback.ok_or(ScheduleError::NullCallback)?;

        // On error the guard puts the enable bit back as it was.
        let guard = CompareGuard::acquire(&self.timer, channel);
        self.setup_channel(delay_ms, channel)?;

        let state = self.state(channel);
        state.remaining.set(remaining);
        state.callback.set(Some(callback));
        guard.arm();
        Ok(())
    }

    /// Commit the divider and program the compare target. Leaves the
    /// interrupt enable bit alone.
    fn setup_channel(&self, delay_ms: u32, channel: Channel) -> Result<(), ScheduleError> {
        let setting = compare_setting(delay_ms, self.cpu_hz)?;

        let committed = self.prescaler.get();
        if committed != Prescaler::Stop && committed != setting.prescaler {
            return Err(ScheduleError::IncompatibleABPrescale);
        }
        self.prescaler.set(setting.prescaler);

        self.state(channel).compare_distance.set(setting.distance);
        // The other channel's handler also goes through the 16-bit TEMP
        // latch, so read, add and write back with interrupts off.
        self.timer.interrupt_free(|| {
            let target = self.timer.counter().wrapping_add(setting.distance);
            self.timer.set_compare(channel, target);
            // OCF1x latches on every pass, enabled or not.
            self.timer.clear_compare_flag(channel);
        });
        self.timer.select_prescaler(setting.prescaler);
        Ok(())
    }

    /// Stop the timer, idle both channels and release the divider.
    ///
    /// This is the only way to move to a different divider range once a
    /// channel has been scheduled.
    pub fn reset(&self) {
        self.timer.interrupt_free(|| {
            self.prescaler.set(Prescaler::Stop);
            self.timer.stop();
            self.reset_channel(Channel::A);
            self.reset_channel(Channel::B);
            self.timer.set_counter(0);
        });
    }

    /// Idle one channel. The committed divider is kept even if the other
    /// channel is idle too.
    pub fn reset_channel(&self, channel: Channel) {
        self.timer.set_compare_interrupt(channel, false);
        compiler_fence(Ordering::SeqCst);

        self.state(channel).clear();
        self.timer.set_compare(channel, 0);
        self.timer.clear_compare_flag(channel);
    }

    /// Compare-match handler body for `channel`; call it from the matching
    /// interrupt vector.
    pub fn on_compare_match(&self, channel: Channel) {
        let state = self.state(channel);

        let remaining = state.remaining.get();
        if remaining == IDLE {
            return;
        }
        let Some(callback) = state.callback.get() else {
            return;
        };

        let remaining = if remaining > 0 { remaining - 1 } else { remaining };
        state.remaining.set(remaining);

        if remaining == IDLE {
            self.timer.set_compare_interrupt(channel, false);
            state.callback.set(None);
            state.compare_distance.set(0);
            callback(true);
        } else {
            // Relative to now, not to the previous target: a late handler
            // stretches this period instead of firing twice.
            let target = self.timer.counter().wrapping_add(state.compare_distance.get());
            self.timer.set_compare(channel, target);
            callback(false);
        }
    }

    #[inline]
    fn state(&self, channel: Channel) -> &ChannelState<'a> {
        &self.channels[channel.index()]
    }
}
