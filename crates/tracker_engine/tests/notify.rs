use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tracker_core::Notification;
use tracker_engine::{
    deliver_with_retry, DeliveryOutcome, MailSettings, NotifyError, NotifyPolicy, Notifier,
    SmtpNotifier, SmtpSecurity,
};

fn message() -> Notification {
    Notification {
        recipient: "you@example.com".to_string(),
        subject: "Dune - Show Available!".to_string(),
        html_body: "<h3>Show found for Dune</h3>".to_string(),
    }
}

/// Settings pointing at a local port nothing listens on.
fn unreachable_settings() -> MailSettings {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    MailSettings {
        smtp_host: "127.0.0.1".to_string(),
        smtp_port: port,
        security: SmtpSecurity::Plain,
        sender: Some("alerts@example.com".to_string()),
        password: Some("app-password".to_string()),
        timeout: Some(Duration::from_secs(5)),
    }
}

#[tokio::test]
async fn missing_credentials_fail_without_network() {
    let notifier = SmtpNotifier::new(MailSettings {
        password: None,
        ..unreachable_settings()
    });
    let err = notifier.send(&message()).await.unwrap_err();
    assert_eq!(err, NotifyError::MissingCredentials);
}

#[tokio::test]
async fn unreachable_server_is_a_retryable_failure() {
    let notifier = SmtpNotifier::new(unreachable_settings());
    let err = notifier.send(&message()).await.unwrap_err();
    assert!(matches!(err, NotifyError::Transport(_)), "{err:?}");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn invalid_recipient_is_not_sent() {
    let notifier = SmtpNotifier::new(unreachable_settings());
    let mut bad = message();
    bad.recipient = "nobody".to_string();
    let err = notifier.send(&bad).await.unwrap_err();
    assert!(matches!(err, NotifyError::InvalidAddress { .. }), "{err:?}");
}

struct FlakyNotifier {
    failures_before_success: u32,
    calls: AtomicU32,
}

#[async_trait::async_trait]
impl Notifier for FlakyNotifier {
    async fn send(&self, _message: &Notification) -> Result<(), NotifyError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures_before_success {
            Err(NotifyError::Transport("connection reset".to_string()))
        } else {
            Ok(())
        }
    }
}

#[tokio::test(start_paused = true)]
async fn retries_transient_failures_until_delivered() {
    let notifier = FlakyNotifier {
        failures_before_success: 2,
        calls: AtomicU32::new(0),
    };
    let outcome = deliver_with_retry(&notifier, &message(), &NotifyPolicy::default()).await;
    assert_eq!(outcome, DeliveryOutcome::Delivered { attempts: 3 });
}

#[tokio::test(start_paused = true)]
async fn gives_up_after_max_attempts() {
    let notifier = FlakyNotifier {
        failures_before_success: u32::MAX,
        calls: AtomicU32::new(0),
    };
    let policy = NotifyPolicy {
        max_attempts: 2,
        retry_delay: Duration::from_secs(10),
    };
    let started = tokio::time::Instant::now();
    let outcome = deliver_with_retry(&notifier, &message(), &policy).await;

    assert_eq!(
        outcome,
        DeliveryOutcome::DeliveryFailed {
            attempts: 2,
            reason: "mail server unreachable: connection reset".to_string()
        }
    );
    assert_eq!(notifier.calls.load(Ordering::SeqCst), 2);
    assert!(started.elapsed() >= Duration::from_secs(10));
}

#[tokio::test]
async fn does_not_retry_configuration_errors() {
    let notifier = SmtpNotifier::new(MailSettings::default());
    let outcome = deliver_with_retry(&notifier, &message(), &NotifyPolicy::default()).await;
    assert_eq!(
        outcome,
        DeliveryOutcome::DeliveryFailed {
            attempts: 1,
            reason: "mail sender credentials are not configured".to_string()
        }
    );
}
