//! Forecast requests that arrive by mail.
//!
//! A request is answered at most once: after a reply goes out it is
//! written to the [`RequestRegistry`] and moved out of the inbox, and a
//! message that is already registered is archived without a second reply.

use chrono::{DateTime, FixedOffset, Utc};
use sha2::{Digest, Sha256};

use crate::Error;

mod registry;

pub use registry::RequestRegistry;

/// RFC 2822 `Date:` header layout.
const DATE_HEADER_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// A message as the mailbox hands it over, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboxMessage {
    pub uid: u32,
    /// `From:` header.
    pub from: Option<String>,
    /// `Date:` header.
    pub date: Option<String>,
    /// First `text/plain` part, if any.
    pub body: Option<String>,
}

/// A request for a forecast, identified by its mail metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastRequest {
    pub uid: u32,
    pub email_address: String,
    pub request_time: DateTime<FixedOffset>,
    pub body: String,
}

impl ForecastRequest {
    /// Identity of the request across restarts.
    ///
    /// Two deliveries of the same message hash the same; a resend with a
    /// new uid or date does not.
    pub fn get_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.uid.to_string().as_bytes());
        hasher.update(self.request_time.to_rfc3339().as_bytes());
        hasher.update(self.body.as_bytes());
        hasher.update(self.email_address.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// The registry line for this request, without a trailing newline.
    pub fn registry_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}",
            self.get_hash(),
            self.uid,
            self.email_address,
            self.request_time.format("%Y%m%d %H:%M:%S")
        )
    }
}

/// Incoming and outgoing mail.
///
/// Implementations own their sessions; reconnecting a long-lived IMAP
/// login is their concern, not the caller's.
#[async_trait::async_trait]
pub trait Mailbox: Send + Sync {
    /// Every message currently in the inbox.
    async fn inbox_messages(&self) -> Result<Vec<InboxMessage>, Error>;

    /// Move a message out of the inbox.
    async fn archive(&self, uid: u32) -> Result<(), Error>;

    async fn send_response(&self, to: &str, body: &str) -> Result<(), Error>;
}

/// Turn raw messages into requests that still need a reply.
///
/// Messages without `From:` or `Date:` are left in the inbox. An
/// unparseable date falls back to `now`. Requests already in the registry
/// are archived and dropped.
pub async fn process_inbox_messages(
    messages: Vec<InboxMessage>, mailbox: &dyn Mailbox, registry: &RequestRegistry, now: DateTime<FixedOffset>,
) -> Result<Vec<ForecastRequest>, Error> {
    let mut requests = Vec::new();

    for message in messages {
        let (Some(from), Some(date)) = (message.from, message.date) else {
            tracing::warn!(uid = message.uid, "message has no Date or From header");
            continue;
        };

        let request_time = DateTime::parse_from_str(&date, DATE_HEADER_FORMAT).unwrap_or_else(|e| {
            tracing::warn!(uid = message.uid, date = %date, error = %e, "could not parse Date header");
            now
        });

        let request = ForecastRequest {
            uid: message.uid,
            email_address: from,
            request_time,
            body: message.body.unwrap_or_default(),
        };

        if registry.check(&request) {
            tracing::debug!(uid = request.uid, "request already answered, archiving");
            mailbox.archive(request.uid).await?;
            continue;
        }

        requests.push(request);
    }

    Ok(requests)
}

/// Reply to each request, then register and archive it.
///
/// The registry entry is written before the message is archived so a
/// failed archive never causes a second reply.
pub async fn process_forecast_requests<F>(
    requests: &[ForecastRequest], mailbox: &dyn Mailbox, registry: &mut RequestRegistry, reply: F,
) -> Result<(), Error>
where
    F: Fn(&ForecastRequest) -> String + Send + Sync,
{
    for request in requests {
        mailbox.send_response(&request.email_address, &reply(request)).await?;
        registry.add_entry(request).await?;
        mailbox.archive(request.uid).await?;
        tracing::info!(uid = request.uid, to = %request.email_address, "answered forecast request");
    }
    Ok(())
}

/// One pass over the inbox. Returns the number of requests answered.
pub async fn poll_once<F>(mailbox: &dyn Mailbox, registry: &mut RequestRegistry, reply: F) -> Result<usize, Error>
where
    F: Fn(&ForecastRequest) -> String + Send + Sync,
{
    let messages = mailbox.inbox_messages().await?;
    tracing::debug!(count = messages.len(), "inbox messages on poll");
    if messages.is_empty() {
        return Ok(0);
    }

    let requests = process_inbox_messages(messages, mailbox, registry, Utc::now().fixed_offset()).await?;
    tracing::info!(count = requests.len(), "processing new forecast requests");
    process_forecast_requests(&requests, mailbox, registry, reply).await?;
    Ok(requests.len())
}
