//! On-target self tests for the Timer1 scheduler, reported over the serial
//! console. Built with the `hil_tests` feature.

use core::cell::Cell;

use avr_device::interrupt::Mutex;

use crate::config::CPU_FREQ_HZ;
use crate::drivers::Console;
use crate::hal::{Tc1, Uart};
use crate::scheduler::{Channel, ScheduleError, Timer1Scheduler};

pub type Scheduler = Timer1Scheduler<'static, Tc1>;

pub trait TestCase {
    fn run(&self, scheduler: &'static Scheduler) -> TestResult;
    fn name(&self) -> &'static str;
}

#[derive(PartialEq)]
pub enum TestResult {
    Pass,
    Fail(TestError),
}

#[derive(PartialEq)]
pub enum TestError {
    AssertionFailed(&'static str),
    Timeout,
}

impl TestError {
    fn as_str(&self) -> &'static str {
        match self {
            TestError::AssertionFailed(what) => *what,
            TestError::Timeout => "timeout",
        }
    }
}

pub struct TestRunner<'c> {
    console: &'c mut Console<Uart>,
    total_tests: u32,
    passed_tests: u32,
}

impl<'c> TestRunner<'c> {
    pub fn new(console: &'c mut Console<Uart>) -> Self {
        Self {
            console,
            total_tests: 0,
            passed_tests: 0,
        }
    }

    pub fn run_suite(
        &mut self,
        name: &'static str,
        scheduler: &'static Scheduler,
        tests: &[&dyn TestCase],
    ) -> bool {
        ufmt::uwriteln!(self.console, "\r\n=== Test Suite: {} ===\r", name).ok();

        for test in tests {
            self.total_tests += 1;
            scheduler.reset();
            reset_firings();

            let result = test.run(scheduler);
            match result {
                TestResult::Pass => {
                    self.passed_tests += 1;
                    ufmt::uwriteln!(self.console, "{}: PASS\r", test.name()).ok();
                }
                TestResult::Fail(err) => {
                    ufmt::uwriteln!(self.console, "{}: FAIL - {}\r", test.name(), err.as_str()).ok();
                }
            }
        }
        scheduler.reset();

        ufmt::uwriteln!(
            self.console,
            "Passed: {}/{}\r",
            self.passed_tests,
            self.total_tests
        )
        .ok();
        self.passed_tests == self.total_tests
    }
}

macro_rules! check {
    ($cond:expr) => {
        if !$cond {
            return TestResult::Fail(TestError::AssertionFailed(stringify!($cond)));
        }
    };
}

macro_rules! check_timeout {
    ($cond:expr, $timeout_ms:expr) => {
        let mut timeout: u32 = $timeout_ms;
        while !$cond {
            if timeout == 0 {
                return TestResult::Fail(TestError::Timeout);
            }
            timeout -= 1;
            spin_ms(1);
        }
    };
}

static FIRED: Mutex<Cell<u8>> = Mutex::new(Cell::new(0));
static LAST_SEEN: Mutex<Cell<bool>> = Mutex::new(Cell::new(false));

fn record_firing(is_last: bool) {
    avr_device::interrupt::free(|cs| {
        let fired = FIRED.borrow(cs);
        fired.set(fired.get().wrapping_add(1));
        LAST_SEEN.borrow(cs).set(is_last);
    });
}

fn reset_firings() {
    avr_device::interrupt::free(|cs| {
        FIRED.borrow(cs).set(0);
        LAST_SEEN.borrow(cs).set(false);
    });
}

fn fired() -> u8 {
    avr_device::interrupt::free(|cs| FIRED.borrow(cs).get())
}

fn last_seen() -> bool {
    avr_device::interrupt::free(|cs| LAST_SEEN.borrow(cs).get())
}

// Busy wait, roughly four cycles per iteration.
fn spin_ms(ms: u32) {
    for _ in 0..ms * (CPU_FREQ_HZ / 4_000) {
        avr_device::asm::nop();
    }
}

pub struct OneShotFires;
impl TestCase for OneShotFires {
    fn name(&self) -> &'static str {
        "One-shot callback"
    }

    fn run(&self, scheduler: &'static Scheduler) -> TestResult {
        check!(scheduler.schedule_once(Channel::A, 10, Some(&record_firing)).is_ok());
        check_timeout!(fired() == 1, 100);
        check!(last_seen());
        check!(scheduler.channel(Channel::A).is_idle());
        spin_ms(30);
        check!(fired() == 1);
        TestResult::Pass
    }
}

pub struct RecurrentCountsDown;
impl TestCase for RecurrentCountsDown {
    fn name(&self) -> &'static str {
        "Recurrent callback"
    }

    fn run(&self, scheduler: &'static Scheduler) -> TestResult {
        check!(scheduler.schedule_recurrent(Channel::B, 5, 3, Some(&record_firing)).is_ok());
        check_timeout!(fired() == 3, 200);
        check!(last_seen());
        check!(scheduler.channel(Channel::B).is_idle());
        TestResult::Pass
    }
}

pub struct SharedPrescalerEnforced;
impl TestCase for SharedPrescalerEnforced {
    fn name(&self) -> &'static str {
        "Shared prescaler"
    }

    fn run(&self, scheduler: &'static Scheduler) -> TestResult {
        check!(scheduler.schedule_indefinitely(Channel::A, 2, Some(&record_firing)).is_ok());
        check!(
            scheduler.schedule_once(Channel::B, 2000, Some(&record_firing))
                == Err(ScheduleError::IncompatibleABPrescale)
        );
        check_timeout!(fired() >= 5, 100);
        check!(!last_seen());
        TestResult::Pass
    }
}

pub fn run_all(console: &mut Console<Uart>, scheduler: &'static Scheduler) -> bool {
    let mut runner = TestRunner::new(console);
    runner.run_suite(
        "Timer1 scheduler",
        scheduler,
        &[&OneShotFires, &RecurrentCountsDown, &SharedPrescalerEnforced],
    )
}
