use core::fmt;

/// Reasons a scheduling request is refused. Nothing is committed when one
/// of these is returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i8)]
pub enum ScheduleError {
    /// The delay does not fit the counter even with the largest divider.
    PrescalerOutOfBound = 1,
    /// The other channel holds a different divider; call `reset()` first.
    IncompatibleABPrescale = 2,
    /// Recurrence must be strictly positive.
    InvalidRecurrenceValue = 3,
    NullCallback = 4,
}

impl ScheduleError {
    /// Numeric status code, `0` being reserved for success.
    #[inline]
    pub const fn code(self) -> i8 {
        self as i8
    }

    /// Status code of a whole scheduling result.
    pub fn status(result: &Result<(), ScheduleError>) -> i8 {
        match result {
            Ok(()) => 0,
            Err(e) => e.code(),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ScheduleError::PrescalerOutOfBound => "prescaler out of bound",
            ScheduleError::IncompatibleABPrescale => "incompatible A/B prescale",
            ScheduleError::InvalidRecurrenceValue => "invalid recurrence value",
            ScheduleError::NullCallback => "null callback",
        }
    }
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ufmt::uDisplay for ScheduleError {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        f.write_str(self.as_str())
    }
}
