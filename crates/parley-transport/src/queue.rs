//! Long-poll event queue.
//!
//! The server keeps a per-client event queue. A client registers once,
//! receiving a `queue_id` and the id of the last event already in the queue,
//! and then repeatedly asks for everything newer than the last id it saw.
//! Each request blocks on the server until events arrive or a heartbeat is
//! due.
//!
//! [`EventQueue`] turns that protocol into an [`EventFeed`]:
//!
//! - heartbeats are swallowed,
//! - events that fail to decode are logged and skipped, without failing
//!   the rest of their batch,
//! - an expired queue (`BAD_EVENT_QUEUE_ID`) is re-registered transparently,
//! - transient network failures are retried after `retry_delay`,
//! - anything else is returned to the caller.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parley_core::{ApiResult, Event, EventFeed};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::wire::{self, RegisterResponse, WireEvent};

/// Default pause before retrying after a transient failure.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// The two endpoints behind an event queue.
#[async_trait]
pub trait QueueApi: Send + Sync {
    /// Registers a new queue for message events.
    async fn register_queue(&self) -> ApiResult<RegisterResponse>;

    /// Fetches events newer than `last_event_id`, blocking until there are
    /// some. Entries are returned undecoded.
    async fn poll_events(&self, queue_id: &str, last_event_id: i64) -> ApiResult<Vec<Value>>;
}

#[async_trait]
impl<A: QueueApi + ?Sized> QueueApi for Arc<A> {
    async fn register_queue(&self) -> ApiResult<RegisterResponse> {
        (**self).register_queue().await
    }

    async fn poll_events(&self, queue_id: &str, last_event_id: i64) -> ApiResult<Vec<Value>> {
        (**self).poll_events(queue_id, last_event_id).await
    }
}

/// [`EventFeed`] over a registered server-side event queue.
pub struct EventQueue<A> {
    api: A,
    registration: Option<RegisterResponse>,
    pending: VecDeque<Event>,
    retry_delay: Duration,
}

impl<A: QueueApi> EventQueue<A> {
    /// Creates a queue; registration happens on the first `next_event`.
    pub fn new(api: A) -> Self {
        Self {
            api,
            registration: None,
            pending: VecDeque::new(),
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Sets the pause before retrying after a transient failure.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Id of the registered queue, if any.
    pub fn queue_id(&self) -> Option<&str> {
        self.registration.as_ref().map(|r| r.queue_id.as_str())
    }

    async fn ensure_registered(&mut self) -> ApiResult<RegisterResponse> {
        if let Some(registration) = &self.registration {
            return Ok(registration.clone());
        }
        loop {
            match self.api.register_queue().await {
                Ok(registration) => {
                    info!(
                        queue_id = %registration.queue_id,
                        last_event_id = registration.last_event_id,
                        "Registered event queue"
                    );
                    self.registration = Some(registration.clone());
                    return Ok(registration);
                }
                Err(e) if e.is_transient() => {
                    warn!(error = %e, delay = ?self.retry_delay, "Queue registration failed, retrying");
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn accept(&mut self, events: Vec<Value>) {
        for raw in events {
            let id = wire::raw_event_id(&raw);
            if let (Some(id), Some(registration)) = (id, &mut self.registration) {
                registration.last_event_id = registration.last_event_id.max(id);
            }
            let decoded = WireEvent::from_value(raw).and_then(|wire| {
                if wire.is_heartbeat() {
                    Ok(None)
                } else {
                    Event::try_from(wire).map(Some)
                }
            });
            match decoded {
                Ok(Some(event)) => self.pending.push_back(event),
                Ok(None) => {}
                Err(e) => warn!(event_id = ?id, error = %e, "Skipping malformed event"),
            }
        }
    }
}

#[async_trait]
impl<A: QueueApi> EventFeed for EventQueue<A> {
    async fn next_event(&mut self) -> ApiResult<Option<Event>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }

            let registration = self.ensure_registered().await?;
            match self
                .api
                .poll_events(&registration.queue_id, registration.last_event_id)
                .await
            {
                Ok(events) => {
                    debug!(count = events.len(), "Received events");
                    self.accept(events);
                }
                Err(e) if e.is_bad_event_queue() => {
                    warn!(queue_id = %registration.queue_id, "Event queue expired, re-registering");
                    self.registration = None;
                }
                Err(e) if e.is_transient() => {
                    warn!(error = %e, delay = ?self.retry_delay, "Polling events failed, retrying");
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
