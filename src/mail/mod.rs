//! Outbox delivery
//!
//! Services only ever write mail into the `outbox` table. The
//! [`OutboxDispatcher`] drains it through a [`Mailer`], retrying each message
//! a bounded number of times before marking it FAILED.

pub mod templates;

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;

use crate::core::config::{Config, MailTransport};
use crate::store::{OutboxMessage, Store};

pub use templates::{InviteMail, MailTemplates, TemplateError};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Failed to write mail: {0}")]
    Io(#[from] std::io::Error),

    #[error("Mail rejected: {0}")]
    Rejected(String),
}

/// A delivery transport
pub trait Mailer {
    fn send(&self, sender: &str, message: &OutboxMessage) -> Result<(), MailError>;
}

/// Logs deliveries instead of sending them
#[derive(Debug, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, sender: &str, message: &OutboxMessage) -> Result<(), MailError> {
        tracing::info!(
            id = message.id,
            from = sender,
            to = %message.recipient,
            subject = %message.subject,
            "mail delivered to log"
        );
        Ok(())
    }
}

/// Writes each message as an `.eml` file
#[derive(Debug)]
pub struct SpoolMailer {
    dir: PathBuf,
}

impl SpoolMailer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, message: &OutboxMessage) -> PathBuf {
        self.dir.join(format!("{:06}.eml", message.id))
    }
}

impl Mailer for SpoolMailer {
    fn send(&self, sender: &str, message: &OutboxMessage) -> Result<(), MailError> {
        if message.recipient.trim().is_empty() {
            return Err(MailError::Rejected("empty recipient".to_string()));
        }
        std::fs::create_dir_all(&self.dir)?;

        let mut eml = String::new();
        eml.push_str(&format!("From: {}\r\n", sender));
        eml.push_str(&format!("To: {}\r\n", message.recipient));
        eml.push_str(&format!("Subject: {}\r\n", message.subject));
        eml.push_str(&format!("Date: {}\r\n", message.created_at.to_rfc2822()));
        eml.push_str("MIME-Version: 1.0\r\n");
        eml.push_str("Content-Type: text/html; charset=utf-8\r\n\r\n");
        eml.push_str(&message.html);

        std::fs::write(self.path_for(message), eml)?;
        Ok(())
    }
}

/// Transport selected by `mail.transport`
pub fn mailer_for(config: &Config) -> Box<dyn Mailer> {
    match config.mail.transport {
        MailTransport::Log => Box::new(LogMailer),
        MailTransport::Spool => Box::new(SpoolMailer::new(config.spool_dir())),
    }
}

/// Outcome of one dispatch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct DeliveryReport {
    pub sent: usize,
    pub failed: usize,
}

pub struct OutboxDispatcher<'a> {
    store: &'a Store,
    mailer: &'a dyn Mailer,
    sender: String,
    max_attempts: u32,
    retry_delay: Duration,
}

impl<'a> OutboxDispatcher<'a> {
    pub fn new(store: &'a Store, mailer: &'a dyn Mailer, config: &Config) -> Self {
        Self {
            store,
            mailer,
            sender: config.mail.sender.clone(),
            max_attempts: config.mail.max_attempts.max(1),
            retry_delay: Duration::from_millis(config.mail.retry_delay_ms),
        }
    }

    pub fn with_retry(mut self, max_attempts: u32, retry_delay: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_delay = retry_delay;
        self
    }

    /// Deliver up to `batch` pending messages
    pub fn dispatch(&self, batch: i64) -> rusqlite::Result<DeliveryReport> {
        let mut report = DeliveryReport::default();

        for message in self.store.pending_outbox(batch)? {
            match self.deliver(&message) {
                Ok(attempts) => {
                    self.store
                        .mark_outbox_sent(message.id, message.attempts + attempts, Utc::now())?;
                    report.sent += 1;
                }
                Err((attempts, e)) => {
                    tracing::warn!(
                        id = message.id,
                        to = %message.recipient,
                        attempts,
                        "mail delivery failed: {}",
                        e
                    );
                    self.store.mark_outbox_failed(
                        message.id,
                        message.attempts + attempts,
                        &e.to_string(),
                        Utc::now(),
                    )?;
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Try until success or attempts run out; returns attempts used
    fn deliver(&self, message: &OutboxMessage) -> Result<u32, (u32, MailError)> {
        let mut attempt = 1;
        loop {
            match self.mailer.send(&self.sender, message) {
                Ok(()) => return Ok(attempt),
                Err(e) if attempt >= self.max_attempts => return Err((attempt, e)),
                Err(e) => {
                    tracing::debug!(id = message.id, attempt, "retrying mail: {}", e);
                    std::thread::sleep(self.retry_delay);
                    attempt += 1;
                }
            }
        }
    }
}
