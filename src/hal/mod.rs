#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod timer1;

#[cfg(target_arch = "avr")]
pub mod tc1;
#[cfg(target_arch = "avr")]
pub mod uart;

// Re-export commonly used types
#[cfg(any(test, feature = "sim"))]
pub use sim::SimTimer1;
pub use timer1::{CompareChannel, CompareTimer, Prescaler};

#[cfg(target_arch = "avr")]
pub use tc1::Tc1;
#[cfg(target_arch = "avr")]
pub use uart::Uart;
