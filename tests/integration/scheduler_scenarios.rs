//! Timed-event scheduler driven tick by tick against recording pins.

use aurix::config::IndicatorTimings;
use aurix::drivers::button::ButtonId;
use aurix::scheduler::{BuzzerPhase, Indicator, Scheduler};

use crate::mock_hw::{MockPins, at};

const STEP_MS: usize = 10;

fn fresh() -> (Scheduler, MockPins) {
    let mut scheduler = Scheduler::new(IndicatorTimings::default());
    let mut pins = MockPins::new();
    scheduler.reset_outputs(&mut pins);
    pins.indicator_calls.clear();
    (scheduler, pins)
}

/// First instant in `(from, to]` at which `indicator` reads `level`.
fn first_time_at(
    scheduler: &mut Scheduler,
    pins: &mut MockPins,
    from: u64,
    to: u64,
    indicator: Indicator,
    level: bool,
) -> Option<u64> {
    let mut found = None;
    for t in (from + STEP_MS as u64..=to).step_by(STEP_MS) {
        scheduler.advance(at(t), pins);
        if found.is_none() && scheduler.level(indicator) == level {
            found = Some(t);
        }
    }
    found
}

#[test]
fn panic_lights_led_a_for_one_second() {
    let (mut s, mut pins) = fresh();
    s.trigger(ButtonId::Panic, at(0), &mut pins);
    assert!(s.level(Indicator::LedA));

    let off = first_time_at(&mut s, &mut pins, 0, 2_000, Indicator::LedA, false);
    assert_eq!(off, Some(1_000));
    assert_eq!(pins.writes_to(Indicator::LedA), 2);
}

#[test]
fn panic_blinks_led_d_ten_times() {
    let (mut s, mut pins) = fresh();
    s.trigger(ButtonId::Panic, at(0), &mut pins);
    assert!(!s.level(Indicator::LedD));

    for t in (STEP_MS as u64..=12_000).step_by(STEP_MS) {
        s.advance(at(t), &mut pins);
        match t {
            500..=999 => assert!(s.level(Indicator::LedD), "HIGH at {t}"),
            1_000..=1_499 => assert!(!s.level(Indicator::LedD), "LOW at {t}"),
            9_500..=9_999 => assert!(s.level(Indicator::LedD), "last blink at {t}"),
            10_000.. => assert!(!s.level(Indicator::LedD), "done at {t}"),
            _ => {}
        }
    }

    assert_eq!(pins.writes_to(Indicator::LedD), 20);
    assert_eq!(s.blink_run().toggles(), 20);
    assert_eq!(pins.last_level(Indicator::LedD), Some(false));
    assert!(s.is_quiescent());
}

#[test]
fn press_chirp_is_short() {
    let (mut s, mut pins) = fresh();
    s.trigger(ButtonId::Defence, at(0), &mut pins);
    assert!(s.level(Indicator::Buzzer));
    assert!(s.level(Indicator::LedB));

    let off = first_time_at(&mut s, &mut pins, 0, 200, Indicator::Buzzer, false);
    assert_eq!(off, Some(50));
    assert!(s.level(Indicator::LedB));
}

#[test]
fn safe_sequence_waits_then_runs_led_c_and_buzzer() {
    let (mut s, mut pins) = fresh();
    s.trigger(ButtonId::Safe, at(0), &mut pins);
    assert!(s.is_safe_sequence_armed());

    for t in (STEP_MS as u64..=11_000).step_by(STEP_MS) {
        s.advance(at(t), &mut pins);
        match t {
            0..=3_999 => {
                assert!(!s.level(Indicator::LedC), "LED C early at {t}");
                assert!(!s.level(Indicator::Buzzer), "buzzer early at {t}");
                assert_eq!(s.buzzer_phase(), BuzzerPhase::Idle);
            }
            4_000..=4_499 => {
                assert!(s.level(Indicator::LedC));
                assert!(!s.level(Indicator::Buzzer), "first beep is silent first half");
            }
            4_500..=4_999 => assert!(s.level(Indicator::Buzzer)),
            5_000..=5_499 => {
                assert!(!s.level(Indicator::LedC), "LED C off at {t}");
                assert_eq!(s.buzzer_phase(), BuzzerPhase::Beeping(1));
            }
            8_000..=9_999 => {
                assert_eq!(s.buzzer_phase(), BuzzerPhase::Sustained);
                assert!(s.level(Indicator::Buzzer));
            }
            10_000.. => {
                assert!(!s.level(Indicator::Buzzer));
                assert!(!s.is_safe_sequence_armed());
            }
            _ => {}
        }
    }

    // Four beeps on/off, the fourth beep's on merges into the sustained tone.
    assert_eq!(pins.writes_to(Indicator::Buzzer), 8);
    assert_eq!(pins.writes_to(Indicator::LedC), 2);
    assert!(s.is_quiescent());
}

#[test]
fn second_safe_press_while_waiting_is_ignored() {
    let (mut s, mut pins) = fresh();
    s.trigger(ButtonId::Safe, at(0), &mut pins);
    s.advance(at(2_000), &mut pins);
    s.trigger(ButtonId::Safe, at(2_000), &mut pins);

    let on = first_time_at(&mut s, &mut pins, 2_000, 6_000, Indicator::LedC, true);
    assert_eq!(on, Some(4_000));
}

#[test]
fn safe_press_after_completion_rearms() {
    let (mut s, mut pins) = fresh();
    s.trigger(ButtonId::Safe, at(0), &mut pins);
    s.advance(at(10_000), &mut pins);
    assert!(!s.is_safe_sequence_armed());

    s.trigger(ButtonId::Safe, at(10_000), &mut pins);
    assert!(s.is_safe_sequence_armed());
    let on = first_time_at(&mut s, &mut pins, 10_000, 15_000, Indicator::LedC, true);
    assert_eq!(on, Some(14_000));
}

#[test]
fn late_advance_catches_up_every_boundary() {
    let (mut s, mut pins) = fresh();
    s.trigger(ButtonId::Panic, at(0), &mut pins);
    s.trigger(ButtonId::Safe, at(0), &mut pins);

    // One stalled tick spanning everything.
    s.advance(at(30_000), &mut pins);
    assert_eq!(s.blink_run().toggles(), 20);
    assert_eq!(s.buzzer_phase(), BuzzerPhase::Idle);
    assert!(s.is_quiescent());
}

#[test]
fn overlapping_panic_and_safe_share_the_buzzer() {
    let (mut s, mut pins) = fresh();
    s.trigger(ButtonId::Safe, at(0), &mut pins);
    s.advance(at(4_600), &mut pins);
    assert!(s.level(Indicator::Buzzer), "beep sounding");

    // The chirp overlaps a sounding beep; the output stays HIGH.
    s.trigger(ButtonId::Panic, at(4_600), &mut pins);
    s.advance(at(4_700), &mut pins);
    assert!(s.level(Indicator::Buzzer));
    assert!(s.level(Indicator::LedA));
}

#[test]
fn stuck_output_is_rewritten_until_it_takes() {
    let (mut s, mut pins) = fresh();
    pins.stuck = Some(Indicator::LedA);
    s.trigger(ButtonId::Panic, at(0), &mut pins);
    assert!(!s.level(Indicator::LedA));

    s.advance(at(10), &mut pins);
    assert_eq!(pins.writes_to(Indicator::LedA), 2);

    pins.stuck = None;
    s.advance(at(20), &mut pins);
    assert!(s.level(Indicator::LedA));
    assert_eq!(pins.last_level(Indicator::LedA), Some(true));

    // Settled: the window still closes on time.
    let off = first_time_at(&mut s, &mut pins, 20, 2_000, Indicator::LedA, false);
    assert_eq!(off, Some(1_000));
}
