//! Millisecond delay to (divider, compare distance) conversion.

use super::error::ScheduleError;
use crate::hal::Prescaler;

/// Divider and tick distance for one delay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompareSetting {
    pub prescaler: Prescaler,
    pub distance: u16,
}

/// Pick the smallest divider whose tick count for `delay_ms` fits the
/// 16-bit counter. Finer dividers win over headroom.
pub fn compare_setting(delay_ms: u32, cpu_hz: u32) -> Result<CompareSetting, ScheduleError> {
    let ticks = (cpu_hz / 1000) as u64 * delay_ms as u64;

    for prescaler in Prescaler::CANDIDATES {
        let scaled = ticks / prescaler.divisor() as u64;
        if scaled <= u16::MAX as u64 {
            return Ok(CompareSetting {
                prescaler,
                distance: scaled as u16,
            });
        }
    }
    Err(ScheduleError::PrescalerOutOfBound)
}
