use crate::{CandidateEntry, TrackingRequest};

/// A rendered message ready for a notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
}

impl Notification {
    pub fn for_match(request: &TrackingRequest, entry: &CandidateEntry) -> Self {
        let item = escape_html(request.item_name());
        let label = escape_html(&entry.label);
        let url = escape_html(request.page_url());
        Self {
            recipient: request.recipient().to_string(),
            subject: format!("{} - Show Available!", request.item_name()),
            html_body: format!(
                "<h3>Show found for {item}</h3>\
                 <p>Time: {time}<br>Screen: {label}<br><a href='{url}'>Book Now</a></p>",
                time = entry.time,
            ),
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TimeOfDay;

    #[test]
    fn body_carries_time_label_and_link() {
        let request = TrackingRequest {
            page_url: "https://example.com/show?a=1&b=2".into(),
            item_name: "Dune <Part Two>".into(),
            from_time: "02:00 PM".into(),
            to_time: "06:00 PM".into(),
            sub_filter: None,
            recipient: " you@example.com ".into(),
        };
        let entry = CandidateEntry::new(TimeOfDay::from_hm(15, 0).unwrap(), "IMAX Laser");
        let note = Notification::for_match(&request, &entry);

        assert_eq!(note.recipient, "you@example.com");
        assert_eq!(note.subject, "Dune <Part Two> - Show Available!");
        assert!(note.html_body.contains("Show found for Dune &lt;Part Two&gt;"));
        assert!(note.html_body.contains("Time: 03:00 PM"));
        assert!(note.html_body.contains("Screen: IMAX Laser"));
        assert!(note
            .html_body
            .contains("<a href='https://example.com/show?a=1&amp;b=2'>Book Now</a>"));
    }
}
