use thiserror::Error;
use url::Url;

use crate::{TimeOfDay, TimeParseError, TimeWindow};

/// Reasons a request is rejected before any page is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error(transparent)]
    InvalidTime(#[from] TimeParseError),
    #[error("window start {from} is after window end {to}")]
    InvertedWindow { from: TimeOfDay, to: TimeOfDay },
    #[error("invalid page url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("invalid recipient address {0:?}")]
    InvalidRecipient(String),
}

/// What to watch for and who to tell, exactly as submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingRequest {
    pub page_url: String,
    pub item_name: String,
    pub from_time: String,
    pub to_time: String,
    pub sub_filter: Option<String>,
    pub recipient: String,
}

impl TrackingRequest {
    /// Checks every field and returns the parsed window.
    pub fn validate(&self) -> Result<TimeWindow, RequestError> {
        if self.item_name.trim().is_empty() {
            return Err(RequestError::MissingField { field: "item name" });
        }
        let recipient = self.recipient.trim();
        if recipient.is_empty() {
            return Err(RequestError::MissingField { field: "recipient" });
        }
        if !recipient.contains('@') {
            return Err(RequestError::InvalidRecipient(recipient.to_string()));
        }
        self.parse_url()?;

        let from = TimeOfDay::parse(&self.from_time)?;
        let to = TimeOfDay::parse(&self.to_time)?;
        TimeWindow::new(from, to).ok_or(RequestError::InvertedWindow { from, to })
    }

    fn parse_url(&self) -> Result<Url, RequestError> {
        let raw = self.page_url.trim();
        if raw.is_empty() {
            return Err(RequestError::MissingField { field: "page url" });
        }
        let url = Url::parse(raw).map_err(|err| RequestError::InvalidUrl {
            url: raw.to_string(),
            reason: err.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(RequestError::InvalidUrl {
                url: raw.to_string(),
                reason: format!("unsupported scheme {other}"),
            }),
        }
    }

    pub fn page_url(&self) -> &str {
        self.page_url.trim()
    }

    pub fn item_name(&self) -> &str {
        self.item_name.trim()
    }

    pub fn recipient(&self) -> &str {
        self.recipient.trim()
    }

    /// The sub-filter, or `None` when absent or blank.
    pub fn sub_filter(&self) -> Option<&str> {
        self.sub_filter
            .as_deref()
            .map(str::trim)
            .filter(|filter| !filter.is_empty())
    }

    /// Case-insensitive containment of the item name in rendered content.
    pub fn item_appears_in(&self, content: &str) -> bool {
        content
            .to_lowercase()
            .contains(&self.item_name().to_lowercase())
    }

    /// Requests sharing this key watch for the same thing on behalf of the
    /// same person; a newer one supersedes an older one.
    pub fn supersede_key(&self) -> (String, String, String) {
        (
            self.recipient().to_lowercase(),
            self.page_url().to_string(),
            self.item_name().to_lowercase(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> TrackingRequest {
        TrackingRequest {
            page_url: " https://in.bookmyshow.com/buytickets/x ".into(),
            item_name: " Baahubali: The Epic ".into(),
            from_time: "02:00 PM".into(),
            to_time: "06:00 PM".into(),
            sub_filter: Some("   ".into()),
            recipient: "you@example.com".into(),
        }
    }

    #[test]
    fn blank_sub_filter_is_none() {
        assert_eq!(request().sub_filter(), None);
    }

    #[test]
    fn item_presence_ignores_case_and_padding() {
        assert!(request().item_appears_in("<h1>BAAHUBALI: THE EPIC</h1>"));
        assert!(!request().item_appears_in("<h1>Something else</h1>"));
    }

    #[test]
    fn rejects_non_http_scheme() {
        let mut req = request();
        req.page_url = "ftp://example.com/show".into();
        assert!(matches!(
            req.validate(),
            Err(RequestError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn rejects_recipient_without_at_sign() {
        let mut req = request();
        req.recipient = "nobody".into();
        assert_eq!(
            req.validate(),
            Err(RequestError::InvalidRecipient("nobody".into()))
        );
    }
}
