//! End-to-end schedules driven through the simulated timer.

use std::cell::{Cell, RefCell};

use super::{Channel, ChannelSnapshot, ScheduleError, Timer1Scheduler};
use crate::hal::{CompareTimer, Prescaler, SimTimer1};

const F_CPU: u32 = 16_000_000;

type Scheduler<'a> = Timer1Scheduler<'a, SimTimer1>;

fn scheduler<'a>() -> Scheduler<'a> {
    let s = Timer1Scheduler::with_clock(SimTimer1::new(), F_CPU);
    s.reset();
    s
}

/// Let the counter run up to the next match on `channel` and enter the
/// handler if the hardware would. Returns whether the handler ran.
fn fire(s: &Scheduler<'_>, channel: Channel) -> bool {
    let sim = s.timer();
    sim.advance(sim.ticks_to_match(channel));
    if !sim.match_pending(channel) {
        return false;
    }
    sim.acknowledge(channel);
    s.on_compare_match(channel);
    true
}

const IDLE: ChannelSnapshot = ChannelSnapshot {
    remaining: 0,
    compare_distance: 0,
    armed: false,
};

#[test]
fn recurrent_fires_exactly_count_times() {
    let log = RefCell::new(Vec::new());
    let record = |last: bool| log.borrow_mut().push(last);
    let s = scheduler();

    s.schedule_recurrent(Channel::A, 100, 5, Some(&record)).unwrap();
    for _ in 0..5 {
        assert!(fire(&s, Channel::A));
    }
    assert_eq!(*log.borrow(), [false, false, false, false, true]);
    assert_eq!(s.channel(Channel::A), IDLE);
    assert!(!s.timer().compare_interrupt_enabled(Channel::A));

    assert!(!fire(&s, Channel::A));
    assert_eq!(log.borrow().len(), 5);
}

#[test]
fn once_fires_single_last_call() {
    let log = RefCell::new(Vec::new());
    let record = |last: bool| log.borrow_mut().push(last);
    let s = scheduler();

    s.schedule_once(Channel::B, 3000, Some(&record)).unwrap();
    assert_eq!(s.prescaler(), Prescaler::Div1024);
    assert!(fire(&s, Channel::B));
    assert!(!fire(&s, Channel::B));
    assert_eq!(*log.borrow(), [true]);
    assert!(s.channel(Channel::B).is_idle());
}

#[test]
fn indefinite_fires_until_channel_reset() {
    let count = Cell::new(0u32);
    let any_last = Cell::new(false);
    let tick = |last: bool| {
        count.set(count.get() + 1);
        any_last.set(any_last.get() | last);
    };
    let s = scheduler();

    s.schedule_indefinitely(Channel::A, 20, Some(&tick)).unwrap();
    for _ in 0..1000 {
        assert!(fire(&s, Channel::A));
    }
    assert_eq!(count.get(), 1000);
    assert!(!any_last.get());
    assert_eq!(s.channel(Channel::A).remaining, -1);

    s.reset_channel(Channel::A);
    assert!(!fire(&s, Channel::A));
    assert_eq!(count.get(), 1000);
}

#[test]
fn indefinite_stopped_by_global_reset() {
    let count = Cell::new(0u32);
    let tick = |_: bool| count.set(count.get() + 1);
    let s = scheduler();

    s.schedule_indefinitely(Channel::B, 1, Some(&tick)).unwrap();
    assert!(fire(&s, Channel::B));
    s.reset();
    assert!(!fire(&s, Channel::B));
    assert_eq!(count.get(), 1);
    assert_eq!(s.channel(Channel::B), IDLE);
}

#[test]
fn incompatible_prescale_leaves_other_channel_untouched() {
    let noop = |_: bool| {};
    let s = scheduler();

    // 10 ms needs /8, 500 ms needs /256
    s.schedule_recurrent(Channel::A, 10, 3, Some(&noop)).unwrap();
    let a_before = s.channel(Channel::A);
    let a_target = s.timer().compare(Channel::A);

    assert_eq!(
        s.schedule_once(Channel::B, 500, Some(&noop)),
        Err(ScheduleError::IncompatibleABPrescale)
    );
    assert_eq!(s.channel(Channel::A), a_before);
    assert_eq!(s.timer().compare(Channel::A), a_target);
    assert!(s.timer().compare_interrupt_enabled(Channel::A));
    assert_eq!(s.prescaler(), Prescaler::Div8);
    assert_eq!(s.channel(Channel::B), IDLE);
    assert!(!s.timer().compare_interrupt_enabled(Channel::B));
}

#[test]
fn channels_share_compatible_prescale() {
    let log = RefCell::new(Vec::new());
    let on_a = |last: bool| log.borrow_mut().push(('A', last));
    let on_b = |last: bool| log.borrow_mut().push(('B', last));
    let s = scheduler();

    s.schedule_recurrent(Channel::A, 10, 2, Some(&on_a)).unwrap();
    s.schedule_once(Channel::B, 30, Some(&on_b)).unwrap();
    assert_eq!(s.prescaler(), Prescaler::Div8);

    assert!(fire(&s, Channel::A));
    assert!(fire(&s, Channel::B));
    assert!(fire(&s, Channel::A));
    assert_eq!(*log.borrow(), [('A', false), ('B', true), ('A', true)]);
}

#[test]
fn non_positive_recurrence_is_rejected_without_side_effects() {
    let noop = |_: bool| {};
    let s = scheduler();
    let writes = s.timer().register_writes();

    for count in [0, -5, i16::MIN] {
        assert_eq!(
            s.schedule_recurrent(Channel::A, 10, count, Some(&noop)),
            Err(ScheduleError::InvalidRecurrenceValue)
        );
    }
    assert_eq!(s.timer().register_writes(), writes);
    assert_eq!(s.channel(Channel::A), IDLE);
    assert_eq!(s.prescaler(), Prescaler::Stop);
}

#[test]
fn recurrence_checked_before_callback() {
    let s = scheduler();
    assert_eq!(
        s.schedule_recurrent(Channel::B, 10, 0, None),
        Err(ScheduleError::InvalidRecurrenceValue)
    );
}

#[test]
fn missing_callback_is_rejected_without_side_effects() {
    let noop = |_: bool| {};
    let s = scheduler();
    s.schedule_indefinitely(Channel::A, 10, Some(&noop)).unwrap();
    let armed = s.channel(Channel::A);
    let writes = s.timer().register_writes();

    for channel in [Channel::A, Channel::B] {
        assert_eq!(s.schedule_once(channel, 10, None), Err(ScheduleError::NullCallback));
        assert_eq!(
            s.schedule_recurrent(channel, 10, 4, None),
            Err(ScheduleError::NullCallback)
        );
        assert_eq!(
            s.schedule_indefinitely(channel, 2000, None),
            Err(ScheduleError::NullCallback)
        );
    }
    assert_eq!(s.timer().register_writes(), writes);
    assert_eq!(s.channel(Channel::A), armed);
    assert_eq!(s.channel(Channel::B), IDLE);
}

#[test]
fn too_long_delay_is_rejected_without_side_effects() {
    let noop = |_: bool| {};
    let s = scheduler();
    s.schedule_indefinitely(Channel::B, 4000, Some(&noop)).unwrap();
    let b_before = s.channel(Channel::B);

    assert_eq!(
        s.schedule_once(Channel::A, 4195, Some(&noop)),
        Err(ScheduleError::PrescalerOutOfBound)
    );
    assert_eq!(s.channel(Channel::A), IDLE);
    assert_eq!(s.channel(Channel::B), b_before);
    assert_eq!(s.prescaler(), Prescaler::Div1024);
    assert!(!s.timer().compare_interrupt_enabled(Channel::A));
}

#[test]
fn reset_releases_prescale_lock() {
    let noop = |_: bool| {};
    let s = scheduler();

    s.schedule_indefinitely(Channel::A, 10, Some(&noop)).unwrap();
    assert_eq!(
        s.schedule_once(Channel::B, 2000, Some(&noop)),
        Err(ScheduleError::IncompatibleABPrescale)
    );

    s.reset();
    assert_eq!(s.prescaler(), Prescaler::Stop);
    s.schedule_once(Channel::A, 2000, Some(&noop)).unwrap();
    assert_eq!(s.prescaler(), Prescaler::Div1024);
    assert_eq!(s.timer().prescaler(), Prescaler::Div1024);
}

// reset_channel keeps the committed divider even when nothing is left
// running, so the other channel still cannot switch range without reset().
#[test]
fn reset_channel_keeps_prescale_lock() {
    let noop = |_: bool| {};
    let s = scheduler();

    s.schedule_once(Channel::A, 10, Some(&noop)).unwrap();
    s.reset_channel(Channel::A);
    assert_eq!(s.channel(Channel::A), IDLE);
    assert_eq!(s.prescaler(), Prescaler::Div8);

    assert_eq!(
        s.schedule_once(Channel::B, 2000, Some(&noop)),
        Err(ScheduleError::IncompatibleABPrescale)
    );
    s.schedule_once(Channel::B, 20, Some(&noop)).unwrap();
}

#[test]
fn reset_channel_is_idempotent() {
    let noop = |_: bool| {};
    let s = scheduler();
    s.schedule_recurrent(Channel::A, 50, 7, Some(&noop)).unwrap();
    s.timer().advance(1000);

    s.reset_channel(Channel::A);
    let once = (
        s.channel(Channel::A),
        s.timer().compare(Channel::A),
        s.timer().flag(Channel::A),
        s.timer().compare_interrupt_enabled(Channel::A),
        s.prescaler(),
    );
    s.reset_channel(Channel::A);
    let twice = (
        s.channel(Channel::A),
        s.timer().compare(Channel::A),
        s.timer().flag(Channel::A),
        s.timer().compare_interrupt_enabled(Channel::A),
        s.prescaler(),
    );
    assert_eq!(once, twice);
    assert_eq!(once.0, IDLE);
    assert_eq!(once.1, 0);
    assert!(!once.2);
}

#[test]
fn reset_channel_leaves_other_channel_running() {
    let count = Cell::new(0u32);
    let tick = |_: bool| count.set(count.get() + 1);
    let noop = |_: bool| {};
    let s = scheduler();

    s.schedule_indefinitely(Channel::A, 40, Some(&noop)).unwrap();
    s.schedule_indefinitely(Channel::B, 40, Some(&tick)).unwrap();
    s.reset_channel(Channel::A);

    assert!(fire(&s, Channel::B));
    assert!(fire(&s, Channel::B));
    assert_eq!(count.get(), 2);
    assert_eq!(s.channel(Channel::B).remaining, -1);
}

#[test]
fn stray_interrupt_on_idle_channel_is_ignored() {
    let count = Cell::new(0u32);
    let tick = |_: bool| count.set(count.get() + 1);
    let s = scheduler();
    s.schedule_indefinitely(Channel::B, 40, Some(&tick)).unwrap();
    let writes = s.timer().register_writes();

    s.on_compare_match(Channel::A);
    assert_eq!(count.get(), 0);
    assert_eq!(s.timer().register_writes(), writes);
    assert_eq!(s.channel(Channel::A), IDLE);
}

#[test]
fn late_handler_rearms_from_live_counter() {
    let noop = |_: bool| {};
    let s = scheduler();
    s.schedule_indefinitely(Channel::A, 4, Some(&noop)).unwrap();
    let distance = s.channel(Channel::A).compare_distance;
    assert_eq!(distance, 64_000);

    // Handler entered 300 ticks after the match.
    s.timer().advance(s.timer().ticks_to_match(Channel::A) + 300);
    let now = s.timer().counter();
    s.on_compare_match(Channel::A);
    assert_eq!(s.timer().compare(Channel::A), now.wrapping_add(distance));
}

#[test]
fn reset_restarts_counter_and_stops_clock() {
    let noop = |_: bool| {};
    let s = scheduler();
    s.schedule_indefinitely(Channel::A, 100, Some(&noop)).unwrap();
    s.schedule_recurrent(Channel::B, 100, 2, Some(&noop)).unwrap();
    s.timer().advance(777);

    s.reset();
    assert_eq!(s.channel(Channel::A), IDLE);
    assert_eq!(s.channel(Channel::B), IDLE);
    assert_eq!(s.timer().counter(), 0);
    assert_eq!(s.timer().prescaler(), Prescaler::Stop);
    assert!(!s.timer().interrupts_masked());
}

#[test]
fn idle_channel_ignores_flag_latched_before_arming() {
    let log = RefCell::new(Vec::new());
    let record = |last: bool| log.borrow_mut().push(last);
    let noop = |_: bool| {};
    let s = scheduler();

    // B keeps the counter running past A's idle target.
    s.schedule_indefinitely(Channel::B, 2000, Some(&noop)).unwrap();
    s.timer().advance(70_000);
    assert!(s.timer().flag(Channel::A));

    s.schedule_once(Channel::A, 3000, Some(&record)).unwrap();
    assert!(!s.timer().flag(Channel::A));
    assert!(!s.timer().match_pending(Channel::A));
    assert_eq!(s.timer().ticks_to_match(Channel::A), 46_875);
    assert!(log.borrow().is_empty());

    assert!(fire(&s, Channel::A));
    assert_eq!(*log.borrow(), [true]);
}

#[test]
fn rearming_after_last_firing_waits_full_delay() {
    let count = Cell::new(0u32);
    let tick = |_: bool| count.set(count.get() + 1);
    let noop = |_: bool| {};
    let s = scheduler();

    s.schedule_indefinitely(Channel::B, 1000, Some(&noop)).unwrap();
    s.schedule_once(Channel::A, 1000, Some(&tick)).unwrap();
    assert!(fire(&s, Channel::A));

    // A is disabled now but its target keeps matching.
    s.timer().advance(70_000);
    assert!(s.timer().flag(Channel::A));

    s.schedule_once(Channel::A, 1000, Some(&tick)).unwrap();
    assert!(!s.timer().match_pending(Channel::A));
    assert_eq!(s.timer().ticks_to_match(Channel::A), 62_500);
    assert_eq!(count.get(), 1);

    assert!(fire(&s, Channel::A));
    assert_eq!(count.get(), 2);
}
