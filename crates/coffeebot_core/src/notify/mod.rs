//! Notification delivery seam.
//!
//! # Responsibility
//! - Define the message shape handed to delivery.
//! - Provide the `Notifier` trait plus outbox-backed and log-only senders.
//!
//! # Invariants
//! - A notifier either accepts a message or returns an error; it never retries.
//! - Actual mail transport lives outside core; the outbox is the handoff.

use crate::pairing::key::encode_key;
use crate::repo::outbox_repo::OutboxRepository;
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// A composed message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Display name of the sender.
    pub sender_name: String,
    /// Recipient emails in canonical order.
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Delivery error.
#[derive(Debug)]
pub enum NotifyError {
    /// The message has no recipients.
    NoRecipients,
    /// The outbox could not store the message.
    Outbox(RepoError),
    /// A transport-specific failure.
    Transport(String),
}

impl Display for NotifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoRecipients => write!(f, "message has no recipients"),
            Self::Outbox(err) => write!(f, "outbox write failed: {err}"),
            Self::Transport(message) => write!(f, "delivery failed: {message}"),
        }
    }
}

impl Error for NotifyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Outbox(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NotifyError {
    fn from(value: RepoError) -> Self {
        Self::Outbox(value)
    }
}

/// Fire-and-forget message delivery.
pub trait Notifier {
    fn send(&self, message: &OutgoingMessage) -> Result<(), NotifyError>;
}

/// Notifier that queues messages in the SQLite outbox.
pub struct OutboxNotifier<O: OutboxRepository> {
    outbox: O,
}

impl<O: OutboxRepository> OutboxNotifier<O> {
    pub fn new(outbox: O) -> Self {
        Self { outbox }
    }
}

impl<O: OutboxRepository> Notifier for OutboxNotifier<O> {
    fn send(&self, message: &OutgoingMessage) -> Result<(), NotifyError> {
        if message.recipients.is_empty() {
            return Err(NotifyError::NoRecipients);
        }
        let id = self.outbox.enqueue(message)?;
        info!(
            "event=notify_send module=notify status=queued outbox_id={id} recipients={}",
            message.recipients.len()
        );
        Ok(())
    }
}

/// Notifier that only logs, for dry runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, message: &OutgoingMessage) -> Result<(), NotifyError> {
        if message.recipients.is_empty() {
            return Err(NotifyError::NoRecipients);
        }
        info!(
            "event=notify_send module=notify status=logged recipients={} subject_chars={}",
            encode_key(&message.recipients),
            message.subject.chars().count()
        );
        Ok(())
    }
}
