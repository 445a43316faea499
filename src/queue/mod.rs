//! Serialized, throttled dispatch of outbound requests.
//!
//! Every request goes through one worker task. The worker sends exactly one
//! request at a time, in submission order, and waits `min_interval` after each
//! completion before it starts the next. Capacity counts pending plus
//! in-flight requests; `add` never blocks and fails with `QueueFull` instead.

mod descriptor;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError, mpsc, oneshot};
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::errors::Error;
use crate::transport::Transport;

pub use descriptor::{RawResponse, RequestDescriptor};

struct Job {
    id: Uuid,
    descriptor: RequestDescriptor,
    reply: oneshot::Sender<Result<RawResponse, Error>>,
    // Held until the transport call resolves.
    slot: OwnedSemaphorePermit,
}

#[derive(Clone)]
pub struct RequestQueue {
    sender: mpsc::UnboundedSender<Job>,
    slots: Arc<Semaphore>,
    capacity: usize,
}

impl RequestQueue {
    /// Starts the dispatch worker on the current tokio runtime.
    pub fn spawn<T: Transport>(
        transport: T,
        capacity: usize,
        min_interval: Duration,
    ) -> Result<Self, Error> {
        if capacity == 0 {
            return Err(Error::Config("queue capacity must be at least 1".into()));
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            Error::Config("request queue must be created inside a tokio runtime".into())
        })?;
        let (sender, receiver) = mpsc::unbounded_channel();
        runtime.spawn(dispatch_loop(transport, receiver, min_interval));
        Ok(Self {
            sender,
            slots: Arc::new(Semaphore::new(capacity)),
            capacity,
        })
    }

    /// Appends a descriptor to the tail of the queue.
    pub fn add(&self, descriptor: RequestDescriptor) -> Result<Completion, Error> {
        let slot = Arc::clone(&self.slots)
            .try_acquire_owned()
            .map_err(|err| match err {
                TryAcquireError::NoPermits => Error::QueueFull {
                    capacity: self.capacity,
                },
                TryAcquireError::Closed => Error::QueueClosed,
            })?;
        let (reply, receiver) = oneshot::channel();
        let id = Uuid::new_v4();
        self.sender
            .send(Job {
                id,
                descriptor,
                reply,
                slot,
            })
            .map_err(|_| Error::QueueClosed)?;
        Ok(Completion { receiver })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pending plus in-flight requests.
    pub fn len(&self) -> usize {
        self.capacity - self.slots.available_permits()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolves once the queued request has been sent and answered.
pub struct Completion {
    receiver: oneshot::Receiver<Result<RawResponse, Error>>,
}

impl Completion {
    pub async fn wait(self) -> Result<RawResponse, Error> {
        self.receiver.await.map_err(|_| Error::QueueClosed)?
    }
}

async fn dispatch_loop<T: Transport>(
    transport: T,
    mut receiver: mpsc::UnboundedReceiver<Job>,
    min_interval: Duration,
) {
    let mut last_completed: Option<Instant> = None;
    while let Some(job) = receiver.recv().await {
        if let Some(completed) = last_completed
            && !min_interval.is_zero()
        {
            tokio::time::sleep_until(completed + min_interval).await;
        }

        let Job {
            id,
            descriptor,
            reply,
            slot,
        } = job;
        debug!(
            request_id = %id,
            method = %descriptor.method,
            url = %descriptor.url,
            "queue.dispatch"
        );
        let result = transport.send(descriptor).await;
        last_completed = Some(Instant::now());

        // Free the slot first so the caller can enqueue again from its completion.
        drop(slot);
        if reply.send(result).is_err() {
            debug!(request_id = %id, "queue.discarded");
        }
    }
    debug!("queue.closed");
}
