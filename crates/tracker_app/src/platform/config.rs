use std::path::PathBuf;
use std::time::Duration;

use anyhow::{ensure, Context};
use serde::{de::DeserializeOwned, Deserialize};
use tracker_engine::{
    EngineConfig, MailSettings, SmtpSecurity, DEFAULT_RETAINED_FINISHED_JOBS,
};

/// Settings read from the environment (and an optional `.env` file).
#[derive(Debug, Deserialize)]
pub struct AppEnv {
    pub sender_email: Option<String>,
    pub sender_password: Option<String>,
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_security: SmtpSecurity,
    #[serde(default = "default_check_interval")]
    pub check_interval_seconds: u64,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_seconds: u64,
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
    #[serde(default = "default_queue_capacity")]
    pub job_queue_capacity: usize,
    #[serde(default = "default_retained_finished_jobs")]
    pub retained_finished_jobs: usize,
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    465
}

fn default_check_interval() -> u64 {
    180
}

fn default_fetch_timeout() -> u64 {
    60
}

fn default_max_concurrent_jobs() -> usize {
    16
}

fn default_queue_capacity() -> usize {
    64
}

fn default_retained_finished_jobs() -> usize {
    DEFAULT_RETAINED_FINISHED_JOBS
}

fn default_log_file() -> PathBuf {
    PathBuf::from("tracker.log")
}

fn default_port() -> u16 {
    8080
}

impl AppEnv {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.check_interval_seconds > 0,
            "CHECK_INTERVAL_SECONDS must be positive"
        );
        ensure!(
            self.fetch_timeout_seconds > 0,
            "FETCH_TIMEOUT_SECONDS must be positive"
        );
        ensure!(self.max_concurrent_jobs > 0, "MAX_CONCURRENT_JOBS must be positive");
        ensure!(self.job_queue_capacity > 0, "JOB_QUEUE_CAPACITY must be positive");
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            poll_interval: Duration::from_secs(self.check_interval_seconds),
            fetch_timeout: Duration::from_secs(self.fetch_timeout_seconds),
            max_concurrent_jobs: self.max_concurrent_jobs,
            queue_capacity: self.job_queue_capacity,
            retained_finished_jobs: self.retained_finished_jobs,
            ..EngineConfig::default()
        }
    }

    pub fn mail_settings(&self) -> MailSettings {
        MailSettings {
            smtp_host: self.smtp_host.clone(),
            smtp_port: self.smtp_port,
            security: self.smtp_security,
            sender: self.sender_email.clone(),
            password: self.sender_password.clone(),
            timeout: Some(Duration::from_secs(30)),
        }
    }

    pub fn has_mail_credentials(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        filled(&self.sender_email) && filled(&self.sender_password)
    }
}

// Extension trait.
pub trait LoadFromEnv: DeserializeOwned {
    fn load_from_env() -> anyhow::Result<Self> {
        // Don't throw an error if .env file doesn't exist.
        let _ = dotenvy::dotenv();
        let config =
            envy::from_env::<Self>().context("failed to load env variables into config struct")?;
        Ok(config)
    }
}

impl<T: DeserializeOwned> LoadFromEnv for T {}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> AppEnv {
        envy::from_iter(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        )
        .unwrap()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let env = from_pairs(&[]);
        assert_eq!(env.check_interval_seconds, 180);
        assert_eq!(env.port, 8080);
        assert_eq!(env.log_file, PathBuf::from("tracker.log"));
        assert!(!env.has_mail_credentials());

        let engine = env.engine_config();
        assert_eq!(engine.poll_interval, Duration::from_secs(180));
        assert_eq!(engine.fetch_timeout, Duration::from_secs(60));
    }

    #[test]
    fn overrides_are_read() {
        let env = from_pairs(&[
            ("SENDER_EMAIL", "alerts@example.com"),
            ("SENDER_PASSWORD", "app-password"),
            ("CHECK_INTERVAL_SECONDS", "45"),
            ("MAX_CONCURRENT_JOBS", "2"),
        ]);
        assert!(env.has_mail_credentials());
        let engine = env.engine_config();
        assert_eq!(engine.poll_interval, Duration::from_secs(45));
        assert_eq!(engine.max_concurrent_jobs, 2);
        let mail = env.mail_settings();
        assert_eq!(mail.sender.as_deref(), Some("alerts@example.com"));
        assert_eq!(mail.smtp_host, "smtp.gmail.com");
        assert_eq!(mail.smtp_port, 465);
        assert_eq!(mail.security, SmtpSecurity::Tls);
    }

    #[test]
    fn smtp_server_can_be_overridden() {
        let env = from_pairs(&[
            ("SMTP_HOST", "mail.example.com"),
            ("SMTP_PORT", "587"),
            ("SMTP_SECURITY", "starttls"),
            ("RETAINED_FINISHED_JOBS", "10"),
        ]);
        let mail = env.mail_settings();
        assert_eq!(mail.smtp_host, "mail.example.com");
        assert_eq!(mail.smtp_port, 587);
        assert_eq!(mail.security, SmtpSecurity::StartTls);
        assert_eq!(env.engine_config().retained_finished_jobs, 10);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let env = from_pairs(&[("CHECK_INTERVAL_SECONDS", "0")]);
        assert!(env.validate().is_err());
    }

    #[test]
    fn non_numeric_interval_fails_to_load() {
        let result = envy::from_iter::<_, AppEnv>(vec![(
            "CHECK_INTERVAL_SECONDS".to_string(),
            "soon".to_string(),
        )]);
        assert!(result.is_err());
    }
}
