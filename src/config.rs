//! Configuration constants for the relay remote firmware

use crate::drivers::console::Level;

/// CPU frequency in Hz, taken from `F_CPU` at build time (see `build.rs`)
pub const CPU_FREQ_HZ: u32 = parse_hz(env!("MCU_FREQ_HZ"));

/// UART baud rate
pub const UART_BAUD: u32 = 9600;

/// USART baud rate register value for normal speed mode
pub const UBRR: u16 = (CPU_FREQ_HZ / (16 * UART_BAUD) - 1) as u16;

/// Most verbose level the console will emit
#[cfg(feature = "debug")]
pub const LOG_LEVEL: Level = Level::Debug;
#[cfg(not(feature = "debug"))]
pub const LOG_LEVEL: Level = Level::Info;

/// Heartbeat period of the demo firmware in milliseconds
pub const HEARTBEAT_MS: u32 = 2000;

/// How long a relay stays energized for one actuation, in milliseconds
pub const ACTUATION_MS: u32 = 3000;

const fn parse_hz(s: &str) -> u32 {
    let bytes = s.as_bytes();
    let mut value: u32 = 0;
    let mut i = 0;
    while i < bytes.len() {
        let digit = bytes[i];
        assert!(digit.is_ascii_digit(), "MCU_FREQ_HZ must be decimal");
        value = value * 10 + (digit - b'0') as u32;
        i += 1;
    }
    assert!(value > 0, "MCU_FREQ_HZ must be non-zero");
    value
}
