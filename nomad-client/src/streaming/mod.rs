//! Stream handles for long-lived feeds.
//!
//! A producer task pushes decoded items into an unbounded channel; the update
//! loop pulls exactly one item per `read_next` call and decides whether to
//! read again. Dropping every clone of a handle drops the receiver, which the
//! producer observes as a failed send and exits on. No cancellation token is
//! involved.
//!
//! ```text
//!  socket ──► producer task ──► mpsc ──► StreamHandle::read_next ──► Msg
//!                  ▲                                                  │
//!                  └──────────── ExecHandle::input ◄── keystrokes ────┘
//! ```

pub mod events;
pub mod exec;
pub mod logs;

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use tokio::sync::{mpsc, Mutex};

use crate::error::SourceError;

static NEXT_STREAM_ID: AtomicU64 = AtomicU64::new(1);

/// Result of one read from a stream.
#[derive(Debug)]
pub enum StreamRead<T> {
    Item(T),
    /// The producer finished or the remote side closed normally.
    Closed,
    Error(SourceError),
}

/// Consumer side of a stream. Cheap to clone; all clones share one receiver.
pub struct StreamHandle<T: Send + 'static> {
    id: u64,
    topic: Arc<str>,
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<Result<T, SourceError>>>>,
    is_active: Arc<AtomicBool>,
}

impl<T: Send + 'static> Clone for StreamHandle<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            topic: self.topic.clone(),
            receiver: self.receiver.clone(),
            is_active: self.is_active.clone(),
        }
    }
}

impl<T: Send + 'static> std::fmt::Debug for StreamHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .finish()
    }
}

/// Producer side of a stream.
pub struct StreamSender<T: Send + 'static> {
    sender: mpsc::UnboundedSender<Result<T, SourceError>>,
    is_active: Arc<AtomicBool>,
}

impl<T: Send + 'static> Clone for StreamSender<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            is_active: self.is_active.clone(),
        }
    }
}

/// Creates a connected producer/consumer pair.
pub fn stream_channel<T: Send + 'static>(topic: impl Into<String>) -> (StreamSender<T>, StreamHandle<T>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let is_active = Arc::new(AtomicBool::new(true));
    let topic: String = topic.into();
    (
        StreamSender {
            sender,
            is_active: is_active.clone(),
        },
        StreamHandle {
            id: NEXT_STREAM_ID.fetch_add(1, Ordering::Relaxed),
            topic: topic.into(),
            receiver: Arc::new(Mutex::new(receiver)),
            is_active,
        },
    )
}

impl<T: Send + 'static> StreamHandle<T> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Waits for the next item. Errors matching a normal-closure signature read as `Closed`.
    pub async fn read_next(&self) -> StreamRead<T> {
        let mut receiver = self.receiver.lock().await;
        match receiver.recv().await {
            Some(Ok(item)) => StreamRead::Item(item),
            Some(Err(e)) if e.is_expected_closure() => {
                tracing::debug!(stream = self.id, topic = %self.topic, "stream closed: {e}");
                StreamRead::Closed
            }
            Some(Err(e)) => StreamRead::Error(e),
            None => StreamRead::Closed,
        }
    }

    /// Asks the producer to stop at its next send.
    pub fn close(&self) {
        self.is_active.store(false, Ordering::Release);
    }

    pub fn is_open(&self) -> bool {
        self.is_active.load(Ordering::Acquire)
    }
}

impl<T: Send + 'static> StreamSender<T> {
    /// Delivers an item. Returns `false` once the consumer is gone or closed the stream.
    pub fn send(&self, item: T) -> bool {
        self.is_active() && self.sender.send(Ok(item)).is_ok()
    }

    /// Delivers a terminal error.
    pub fn fail(&self, error: SourceError) {
        let _ = self.sender.send(Err(error));
    }

    pub fn is_active(&self) -> bool {
        self.is_active.load(Ordering::Acquire) && !self.sender.is_closed()
    }

    /// Resolves once every consumer handle has been dropped.
    pub async fn closed(&self) {
        self.sender.closed().await
    }
}

/// Exec session: an output stream plus an input channel to the socket writer.
#[derive(Debug, Clone)]
pub struct ExecHandle {
    pub output: StreamHandle<exec::ExecEvent>,
    input: mpsc::UnboundedSender<exec::ExecFrame>,
}

impl ExecHandle {
    pub fn new(output: StreamHandle<exec::ExecEvent>, input: mpsc::UnboundedSender<exec::ExecFrame>) -> Self {
        Self { output, input }
    }

    /// Queues an outbound frame. Returns `false` when the writer has gone away.
    pub fn send(&self, frame: exec::ExecFrame) -> bool {
        self.input.send(frame).is_ok()
    }

    pub fn close(&self) {
        self.output.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_next_in_order_then_closed() {
        let (tx, handle) = stream_channel::<u32>("test");
        assert!(tx.send(1));
        assert!(tx.send(2));
        drop(tx);
        assert!(matches!(handle.read_next().await, StreamRead::Item(1)));
        assert!(matches!(handle.read_next().await, StreamRead::Item(2)));
        assert!(matches!(handle.read_next().await, StreamRead::Closed));
    }

    #[tokio::test]
    async fn test_expected_closure_reads_as_closed() {
        let (tx, handle) = stream_channel::<u32>("test");
        tx.fail(SourceError::Transport("connection closed normally".into()));
        assert!(matches!(handle.read_next().await, StreamRead::Closed));

        let (tx, handle) = stream_channel::<u32>("test");
        tx.fail(SourceError::Decode("bad frame".into()));
        assert!(matches!(handle.read_next().await, StreamRead::Error(SourceError::Decode(_))));
    }

    #[test]
    fn test_dropping_handle_stops_producer() {
        let (tx, handle) = stream_channel::<u32>("test");
        let clone = handle.clone();
        drop(handle);
        assert!(tx.is_active());
        drop(clone);
        assert!(!tx.is_active());
        assert!(!tx.send(3));
    }

    #[test]
    fn test_close_stops_producer() {
        let (tx, handle) = stream_channel::<u32>("test");
        handle.close();
        assert!(!tx.send(1));
        assert!(!handle.is_open());
    }

    #[test]
    fn test_ids_are_unique() {
        let (_a, a) = stream_channel::<u32>("a");
        let (_b, b) = stream_channel::<u32>("b");
        assert_ne!(a.id(), b.id());
        assert_eq!(b.topic(), "b");
    }
}
