//! Leveled line logging over a serial port.

use embedded_hal::serial::Write;
use ufmt::uWrite;

use crate::config::LOG_LEVEL;
use crate::scheduler::ScheduleError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl Level {
    const fn tag(self) -> &'static str {
        match self {
            Level::Error => "[ERR] ",
            Level::Warn => "[WRN] ",
            Level::Info => "[INF] ",
            Level::Debug => "[DBG] ",
        }
    }
}

/// Line-oriented console on top of any blocking-capable serial writer.
///
/// Also implements [`uWrite`] so call sites can use `uwriteln!` directly;
/// those writes bypass level filtering.
pub struct Console<S> {
    serial: S,
    max_level: Level,
}

impl<S: Write<u8>> Console<S> {
    pub fn new(serial: S) -> Self {
        Self::with_level(serial, LOG_LEVEL)
    }

    pub fn with_level(serial: S, max_level: Level) -> Self {
        Self { serial, max_level }
    }

    #[inline]
    pub fn enabled(&self, level: Level) -> bool {
        level <= self.max_level
    }

    pub fn write_byte(&mut self, byte: u8) -> Result<(), S::Error> {
        nb::block!(self.serial.write(byte))
    }

    fn put(&mut self, s: &str) -> Result<(), S::Error> {
        for byte in s.bytes() {
            self.write_byte(byte)?;
        }
        Ok(())
    }

    pub fn write_line(&mut self, s: &str) -> Result<(), S::Error> {
        self.put(s)?;
        self.put("\r\n")
    }

    pub fn line(&mut self, level: Level, msg: &str) -> Result<(), S::Error> {
        if !self.enabled(level) {
            return Ok(());
        }
        self.put(level.tag())?;
        self.write_line(msg)
    }

    // Debug helper - print hex value
    pub fn debug_hex(&mut self, msg: &str, val: u8) -> Result<(), S::Error> {
        const HEX_CHARS: [u8; 16] = *b"0123456789ABCDEF";
        if !self.enabled(Level::Debug) {
            return Ok(());
        }
        self.put(Level::Debug.tag())?;
        self.put(msg)?;
        self.put(": 0x")?;
        self.write_byte(HEX_CHARS[(val >> 4) as usize])?;
        self.write_byte(HEX_CHARS[(val & 0xF) as usize])?;
        self.put("\r\n")
    }

    /// Success at debug level, refusals as warnings with their status code.
    pub fn schedule_result(
        &mut self,
        what: &str,
        result: &Result<(), ScheduleError>,
    ) -> Result<(), S::Error> {
        match result {
            Ok(()) if self.enabled(Level::Debug) => {
                ufmt::uwrite!(self, "{}{}: ok\r\n", Level::Debug.tag(), what)
            }
            Ok(()) => Ok(()),
            Err(e) if self.enabled(Level::Warn) => ufmt::uwrite!(
                self,
                "{}{}: {} (code {})\r\n",
                Level::Warn.tag(),
                what,
                e,
                e.code()
            ),
            Err(_) => Ok(()),
        }
    }

    pub fn release(self) -> S {
        self.serial
    }
}

impl<S: Write<u8>> uWrite for Console<S> {
    type Error = S::Error;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        self.put(s)
    }
}
