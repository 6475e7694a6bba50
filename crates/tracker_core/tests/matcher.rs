use tracker_core::{first_match, matches, CandidateEntry, TimeOfDay, TimeWindow};

fn t(text: &str) -> TimeOfDay {
    TimeOfDay::parse(text).unwrap()
}

fn entry(time: &str, label: &str) -> CandidateEntry {
    CandidateEntry::new(t(time), label)
}

fn afternoon() -> TimeWindow {
    TimeWindow::new(t("02:00 PM"), t("06:00 PM")).unwrap()
}

#[test]
fn sub_filter_is_case_insensitive_substring() {
    let e = entry("03:00 PM", "PVR Gold IMAX Laser");
    assert!(matches(&e, &afternoon(), Some("imax")));
    assert!(matches(&e, &afternoon(), Some("GOLD")));
    assert!(!matches(&e, &afternoon(), Some("4DX")));
}

#[test]
fn empty_or_missing_sub_filter_matches_any_label() {
    let e = entry("03:00 PM", "");
    assert!(matches(&e, &afternoon(), None));
    assert!(matches(&e, &afternoon(), Some("")));
    assert!(matches(&e, &afternoon(), Some("  ")));
}

#[test]
fn outside_window_never_matches() {
    let e = entry("07:00 PM", "IMAX");
    assert!(!matches(&e, &afternoon(), None));
}

#[test]
fn first_match_follows_document_order_not_chronology() {
    let entries = vec![
        entry("01:00 PM", "IMAX"),
        entry("05:00 PM", "IMAX 3D"),
        entry("03:00 PM", "IMAX Laser"),
    ];
    let found = first_match(&entries, &afternoon(), Some("imax")).unwrap();
    assert_eq!(found, &entries[1]);
}

#[test]
fn first_match_returns_none_when_nothing_qualifies() {
    let entries = vec![entry("01:00 PM", "Standard"), entry("07:00 PM", "IMAX Laser")];
    assert!(first_match(&entries, &afternoon(), Some("IMAX")).is_none());
    assert!(first_match(&[], &afternoon(), None).is_none());
}
