//! Whole-day sweeps over the built-in lineup: resolution must produce a
//! usable show for every minute of every day template, and the upcoming
//! strip must stay sorted, capped, and strictly in the future.

use chrono::NaiveTime;
use radio47_core::schedule::{
    current_show, parse_window, upcoming_shows, Schedule, UPCOMING_COUNT,
};

fn at_minute(minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(minute / 60, minute % 60, 0).unwrap()
}

#[test]
fn weekday_template_resolves_every_minute() {
    let schedule = Schedule::builtin();

    for minute in 0..24 * 60 {
        let show = current_show(&schedule.weekday, at_minute(minute));
        assert!(!show.name.is_empty());

        // The only unscheduled weekday hour is 19:00-20:00; everywhere else
        // a declared window (including the explicit overnight slot) matches.
        if show.time == "24/7" {
            assert!(
                (19 * 60..20 * 60).contains(&minute),
                "unexpected schedule gap at minute {minute}"
            );
        }
    }
}

#[test]
fn weekday_overnight_slot_matches_both_sides_of_midnight() {
    let schedule = Schedule::builtin();

    for minute in [23 * 60, 23 * 60 + 59, 0, 2 * 60 + 30, 3 * 60 + 59] {
        let show = current_show(&schedule.weekday, at_minute(minute));
        assert_eq!(show.name, "Off Studio");
        assert_eq!(show.time, "23:00 - 04:00", "minute {minute}");
    }

    // 04:00 sharp belongs to the morning show
    assert_eq!(
        current_show(&schedule.weekday, at_minute(4 * 60)).name,
        "Nuru 47"
    );
}

#[test]
fn weekend_gaps_fall_back_to_synthesized_show() {
    let schedule = Schedule::builtin();

    // Saturday 06:00-07:00 is unscheduled
    let show = current_show(&schedule.saturday, at_minute(6 * 60 + 30));
    assert_eq!(show.name, "Off Studio");
    assert_eq!(show.time, "24/7");

    // Sunday overnight is unscheduled
    let show = current_show(&schedule.sunday, at_minute(60));
    assert_eq!(show.time, "24/7");
}

#[test]
fn upcoming_is_capped_sorted_and_strictly_future_all_day() {
    let schedule = Schedule::builtin();

    for minute in (0..24 * 60).step_by(7) {
        let upcoming = upcoming_shows(&schedule.weekday, at_minute(minute), UPCOMING_COUNT);
        assert!(upcoming.len() <= UPCOMING_COUNT);

        let mut last_start = -1i32;
        for show in &upcoming {
            let (raw_window, day_offset) = match show.time.strip_prefix("Tomorrow ") {
                Some(rest) => (rest, 24 * 60),
                None => (show.time.as_str(), 0),
            };
            let (start, _) = parse_window(raw_window).expect("display label keeps raw window");
            let absolute = start as i32 + day_offset;

            assert!(absolute > minute as i32, "entry not strictly in the future");
            assert!(absolute >= last_start, "entries out of order");
            last_start = absolute;
        }
    }
}

#[test]
fn builtin_templates_have_no_overlapping_windows() {
    let schedule = Schedule::builtin();

    for shows in [&schedule.weekday, &schedule.saturday, &schedule.sunday] {
        let mut windows: Vec<(u32, u32)> = shows
            .iter()
            .map(|s| {
                let (start, end) = parse_window(&s.time).expect("builtin windows parse");
                (start, if end <= start { end + 24 * 60 } else { end })
            })
            .collect();
        windows.sort();
        for pair in windows.windows(2) {
            assert!(pair[0].1 <= pair[1].0, "overlapping windows: {pair:?}");
        }
    }
}
