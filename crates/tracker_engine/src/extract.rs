use scraper::{ElementRef, Html, Selector};
use tracker_core::{CandidateEntry, TimeOfDay};
use tracker_logging::tracker_debug;

/// CSS selectors locating showtime and screen labels on a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowSelectors {
    pub time: String,
    pub label: String,
}

impl Default for ShowSelectors {
    fn default() -> Self {
        Self {
            time: ".sc-yr56qh-1".to_string(),
            label: ".sc-yr56qh-2".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid selector {selector:?}: {message}")]
pub struct SelectorError {
    pub selector: String,
    pub message: String,
}

pub trait ShowExtractor: Send + Sync {
    /// Candidate entries in document order. Never fails; elements that do not
    /// carry a readable time are skipped.
    fn extract(&self, html: &str) -> Vec<CandidateEntry>;
}

/// Pairs each time element with the first label element that follows it in
/// document order, in a single pass over both selectors.
#[derive(Debug, Clone)]
pub struct SelectorShowExtractor {
    time: Selector,
    any: Selector,
}

impl SelectorShowExtractor {
    pub fn new(selectors: &ShowSelectors) -> Result<Self, SelectorError> {
        let time = parse_selector(&selectors.time)?;
        parse_selector(&selectors.label)?;
        let any = parse_selector(&format!("{}, {}", selectors.time, selectors.label))?;
        Ok(Self { time, any })
    }
}

impl ShowExtractor for SelectorShowExtractor {
    fn extract(&self, html: &str) -> Vec<CandidateEntry> {
        let doc = Html::parse_document(html);
        let mut entries = Vec::new();
        // Whether the most recent time element is still waiting for a label.
        let mut open: Option<Option<CandidateEntry>> = None;

        for element in doc.select(&self.any) {
            let text = element_text(element);
            if self.time.matches(&element) {
                if let Some(Some(entry)) = open.take() {
                    entries.push(entry);
                }
                match TimeOfDay::parse(&text) {
                    Ok(time) => open = Some(Some(CandidateEntry::new(time, ""))),
                    Err(err) => {
                        tracker_debug!("Skipping showtime element: {}", err);
                        open = Some(None);
                    }
                }
            } else if let Some(pending) = open.take() {
                if let Some(mut entry) = pending {
                    entry.label = text;
                    entries.push(entry);
                }
            }
        }
        if let Some(Some(entry)) = open {
            entries.push(entry);
        }
        entries
    }
}

fn parse_selector(raw: &str) -> Result<Selector, SelectorError> {
    Selector::parse(raw).map_err(|err| SelectorError {
        selector: raw.to_string(),
        message: err.to_string(),
    })
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
