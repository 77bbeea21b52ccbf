#![cfg_attr(target_arch = "avr", no_std)]
#![cfg_attr(target_arch = "avr", no_main)]
#![cfg_attr(target_arch = "avr", feature(abi_avr_interrupt))]

#[cfg(target_arch = "avr")]
mod firmware {
    use core::cell::Cell;

    use avr_device::atmega328p::Peripherals;
    use avr_device::interrupt::{self, Mutex};
    use panic_halt as _;

    use relay_remote_firmware::config::{ACTUATION_MS, HEARTBEAT_MS};
    use relay_remote_firmware::drivers::{Console, Level};
    use relay_remote_firmware::hal::{Tc1, Uart};
    use relay_remote_firmware::relay::WorkState;
    use relay_remote_firmware::{Channel, Timer1Scheduler};

    static SCHEDULER: Timer1Scheduler<'static, Tc1> = Timer1Scheduler::new(Tc1::new());

    static WORK_STATE: Mutex<Cell<WorkState>> = Mutex::new(Cell::new(WorkState::Invalid));
    static HEARTBEATS: Mutex<Cell<u16>> = Mutex::new(Cell::new(0));

    #[avr_device::interrupt(atmega328p)]
    fn TIMER1_COMPA() {
        SCHEDULER.on_compare_match(Channel::A);
    }

    #[avr_device::interrupt(atmega328p)]
    fn TIMER1_COMPB() {
        SCHEDULER.on_compare_match(Channel::B);
    }

    fn heartbeat(_is_last: bool) {
        interrupt::free(|cs| {
            let beats = HEARTBEATS.borrow(cs);
            beats.set(beats.get().wrapping_add(1));
        });
    }

    // End of the actuation window: the relay would be released here.
    fn actuation_done(is_last: bool) {
        if is_last {
            interrupt::free(|cs| WORK_STATE.borrow(cs).set(WorkState::Idle));
        }
    }

    fn work_state() -> WorkState {
        interrupt::free(|cs| WORK_STATE.borrow(cs).get())
    }

    #[avr_device::entry]
    fn main() -> ! {
        // TC1 and USART0 are driven through Tc1 and Uart only.
        let _dp = Peripherals::take().unwrap();

        let mut console = Console::new(Uart::new());
        console.line(Level::Info, "Relay remote firmware v0.1.0").ok();

        SCHEDULER.reset();

        // Enable interrupts globally
        unsafe { avr_device::interrupt::enable() };

        #[cfg(feature = "hil_tests")]
        {
            if !relay_remote_firmware::testing::run_all(&mut console, &SCHEDULER) {
                console.line(Level::Error, "self test failed").ok();
            }
        }

        // Both delays land on the same divider (/1024) so the channels can
        // share the timer.
        let result = SCHEDULER.schedule_indefinitely(Channel::B, HEARTBEAT_MS, Some(&heartbeat));
        console.schedule_result("heartbeat", &result).ok();

        interrupt::free(|cs| WORK_STATE.borrow(cs).set(WorkState::Changing));
        let result = SCHEDULER.schedule_once(Channel::A, ACTUATION_MS, Some(&actuation_done));
        console.schedule_result("actuation window", &result).ok();
        if result.is_ok() {
            interrupt::free(|cs| WORK_STATE.borrow(cs).set(WorkState::Up));
        } else {
            interrupt::free(|cs| WORK_STATE.borrow(cs).set(WorkState::Idle));
        }

        let mut reported = work_state();
        let mut last_beat = 0u16;
        loop {
            let state = work_state();
            if state != reported {
                ufmt::uwriteln!(&mut console, "[INF] state: {} -> {}\r", reported, state).ok();
                reported = state;
            }

            let beats = interrupt::free(|cs| HEARTBEATS.borrow(cs).get());
            if beats != last_beat {
                last_beat = beats;
                console.debug_hex("heartbeat", beats as u8).ok();
            }
        }
    }
}

#[cfg(not(target_arch = "avr"))]
fn main() {
    println!("relay_remote_firmware only runs on AVR targets; use `cargo test` on the host.");
}
