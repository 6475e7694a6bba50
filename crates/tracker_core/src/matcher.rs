use crate::{CandidateEntry, TimeWindow};

/// True when the entry falls inside the window and its label contains the
/// sub-filter (case-insensitive). A missing or blank sub-filter matches any label.
pub fn matches(entry: &CandidateEntry, window: &TimeWindow, sub_filter: Option<&str>) -> bool {
    if !window.contains(entry.time) {
        return false;
    }
    match sub_filter.map(str::trim).filter(|f| !f.is_empty()) {
        None => true,
        Some(filter) => entry
            .label
            .to_lowercase()
            .contains(&filter.to_lowercase()),
    }
}

/// First satisfying entry in extraction (document) order.
///
/// Document order is not necessarily chronological; an earlier show listed
/// later on the page loses to the first qualifying one.
pub fn first_match<'a>(
    entries: &'a [CandidateEntry],
    window: &TimeWindow,
    sub_filter: Option<&str>,
) -> Option<&'a CandidateEntry> {
    entries
        .iter()
        .find(|entry| matches(entry, window, sub_filter))
}
