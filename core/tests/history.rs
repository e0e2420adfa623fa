//! Vessel histories and simulated-time formatting.

use bargeflow_core::{
    clock::{days, format_duration, format_time, synchronize},
    error::SimError,
    event::History,
    vessel::VesselState,
};

#[test]
fn same_minute_replaces_previous_record() {
    let mut h = History::new();
    h.record("B", 0, VesselState::GoingUnload, "draft 3.6").unwrap();
    h.record("B", 0, VesselState::Waiting, "waiting for tug").unwrap();
    assert_eq!(h.len(), 1);
    assert_eq!(h.last().unwrap().state, VesselState::Waiting);
}

#[test]
fn earlier_record_is_a_defect() {
    let mut h = History::new();
    h.record("B", 100, VesselState::Loading, "").unwrap();
    let err = h.record("B", 99, VesselState::Waiting, "").unwrap_err();
    assert!(matches!(err, SimError::HistoryOutOfOrder { last: 100, at: 99, .. }));
}

#[test]
fn time_matching_sums_until_next_record() {
    let mut h = History::new();
    h.record("B", 0, VesselState::Waiting, "low tide 1.2").unwrap();
    h.record("B", 40, VesselState::RiefPassed, "tide 3.9").unwrap();
    h.record("B", 60, VesselState::Waiting, "low tide 2.0").unwrap();
    h.record("B", 75, VesselState::RiefPassed, "tide 3.7").unwrap();
    assert_eq!(h.time_matching("low tide"), 55);
    assert_eq!(h.time_matching("RIEF_PASSED"), 20);
    assert_eq!(h.time_matching("nothing"), 0);
}

#[test]
fn comment_query_keeps_loader_and_unloader_apart() {
    let mut h = History::new();
    h.record("B", 0, VesselState::Waiting, "loader busy").unwrap();
    h.record("B", 30, VesselState::Loading, "docking at loader").unwrap();
    h.record("B", 300, VesselState::Waiting, "unloader busy").unwrap();
    h.record("B", 400, VesselState::Unloading, "docking at Unloader #1").unwrap();
    assert_eq!(h.time_with_comment("loader busy"), 30);
    assert_eq!(h.time_with_comment("unloader busy"), 100);
    // A substring query counts both.
    assert_eq!(h.time_matching("loader busy"), 130);
}

#[test]
fn time_in_state_does_not_confuse_loading_with_unloading() {
    let mut h = History::new();
    h.record("B", 0, VesselState::Loading, "docking at loader").unwrap();
    h.record("B", 100, VesselState::GoingUnload, "draft 3.6").unwrap();
    h.record("B", 300, VesselState::Unloading, "docking at Unloader #1").unwrap();
    h.record("B", 350, VesselState::GoingLoad, "draft 1.5").unwrap();
    assert_eq!(h.time_in_state(VesselState::Loading), 100);
    assert_eq!(h.time_in_state(VesselState::Unloading), 50);
    assert_eq!(h.time_matching("LOADING"), 150);
}

#[test]
fn render_lists_every_record() {
    let mut h = History::new();
    h.record("B", 0, VesselState::Loading, "docking at loader").unwrap();
    h.record("B", 45, VesselState::Loading, "loaded 5000 on 2000/h").unwrap();
    let text = h.render("BARGE #1");
    assert!(text.contains("Log of \"BARGE #1\""));
    assert!(text.contains("w1, d1, 00:45\tLOADING...\tloaded 5000 on 2000/h"));
}

#[test]
fn synchronize_takes_the_later_clock() {
    assert_eq!(synchronize(10, 25), 25);
    assert_eq!(synchronize(25, 10), 25);
    assert_eq!(synchronize(7, 7), 7);
}

#[test]
fn time_is_rendered_with_week_and_day() {
    assert_eq!(format_time(0), "w1, d1, 00:00");
    assert_eq!(format_time(61), "w1, d1, 01:01");
    assert_eq!(format_time(days(8) + 9 * 60 + 5), "w2, d2, 09:05");
}

#[test]
fn durations_drop_empty_day_part() {
    assert_eq!(format_duration(45), "00:45");
    assert_eq!(format_duration(days(2) + 90), "2 day(s), 01:30");
}
