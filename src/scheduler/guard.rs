use core::sync::atomic::{compiler_fence, Ordering};

use crate::hal::{CompareChannel, CompareTimer};

/// Keeps one channel's compare interrupt masked while its state is being
/// rewritten.
///
/// On drop the enable bit goes back to what it was before acquisition,
/// unless [`arm`](Self::arm) was called, in which case it ends up set.
pub(crate) struct CompareGuard<'t, H: CompareTimer> {
    timer: &'t H,
    channel: CompareChannel,
    enable_on_exit: bool,
}

impl<'t, H: CompareTimer> CompareGuard<'t, H> {
    pub(crate) fn acquire(timer: &'t H, channel: CompareChannel) -> Self {
        let enable_on_exit = timer.compare_interrupt_enabled(channel);
        timer.set_compare_interrupt(channel, false);
        compiler_fence(Ordering::SeqCst);
        Self {
            timer,
            channel,
            enable_on_exit,
        }
    }

    /// Enable the interrupt on release regardless of its prior state.
    pub(crate) fn arm(mut self) {
        self.enable_on_exit = true;
    }
}

impl<H: CompareTimer> Drop for CompareGuard<'_, H> {
    fn drop(&mut self) {
        compiler_fence(Ordering::SeqCst);
        if self.enable_on_exit {
            self.timer.set_compare_interrupt(self.channel, true);
        }
    }
}
