use std::time::Duration;

use tracker_engine::{FailureKind, FetchSettings, Fetcher, ReqwestFetcher};
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn fetcher_returns_decoded_html() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/shows"))
        .and(header_exists("user-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "<html><div class=\"sc-yr56qh-1\">03:00 PM</div></html>",
            "text/html; charset=utf-8",
        ))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let url = format!("{}/shows", server.uri());

    let content = fetcher.fetch(&url, TIMEOUT).await.expect("fetch ok");
    assert_eq!(content.final_url, url);
    assert_eq!(content.redirect_count, 0);
    assert!(content.content_type.unwrap().starts_with("text/html"));
    assert!(content.html.contains("03:00 PM"));
}

#[tokio::test]
async fn fetcher_follows_redirects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/new"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>moved</p>", "text/html"))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let content = fetcher
        .fetch(&format!("{}/old", server.uri()), TIMEOUT)
        .await
        .expect("fetch ok");
    assert_eq!(content.final_url, format!("{}/new", server.uri()));
    assert_eq!(content.redirect_count, 1);
    assert_eq!(content.html, "<p>moved</p>");
}

#[tokio::test]
async fn malformed_bytes_do_not_fail_the_fetch() {
    let server = MockServer::start().await;
    let mut body = b"<h1>Dune</h1><div class=\"sc-yr56qh-1\">03:00 PM</div>".to_vec();
    body.push(0xff);
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8"))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let content = fetcher
        .fetch(&format!("{}/broken", server.uri()), TIMEOUT)
        .await
        .expect("lossy decode");
    assert!(content.html.contains("03:00 PM"));
    assert!(content.html.ends_with('\u{FFFD}'));
}

#[tokio::test]
async fn fetcher_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let url = format!("{}/missing", server.uri());

    let err = fetcher.fetch(&url, TIMEOUT).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
}

#[tokio::test]
async fn fetcher_times_out_on_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_string("slow"),
        )
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let url = format!("{}/slow", server.uri());

    let err = fetcher
        .fetch(&url, Duration::from_millis(50))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn fetcher_rejects_non_html_content() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let err = fetcher
        .fetch(&format!("{}/feed", server.uri()), TIMEOUT)
        .await
        .unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::UnsupportedContentType {
            content_type: "application/json".to_string()
        }
    );
}

#[tokio::test]
async fn fetcher_rejects_too_large_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/large"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/html")
                .set_body_string("01234567890"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        max_bytes: 10,
        ..FetchSettings::default()
    };
    let fetcher = ReqwestFetcher::new(settings);
    let url = format!("{}/large", server.uri());

    let err = fetcher.fetch(&url, TIMEOUT).await.unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::TooLarge {
            max_bytes: 10,
            actual: Some(11)
        }
    );
}

#[tokio::test]
async fn fetcher_rejects_invalid_url() {
    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let err = fetcher.fetch("not a url", TIMEOUT).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
