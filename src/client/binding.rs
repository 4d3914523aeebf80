//! Binds a [`ResilientStream`] to a consumer's lifecycle.
//!
//! A UI-style consumer mounts once, refreshes whenever its inputs change
//! and unmounts at the end. [`StreamBinding`] maps those steps onto a
//! stream without leaking observers or transports:
//!
//! - mounting calls the factory exactly once;
//! - refreshing with a different factory (by `Arc` identity) closes the old
//!   stream and builds a new one;
//! - refreshing with a different callback detaches the previous callback
//!   before attaching the new one, so no payload is delivered twice;
//! - unmounting (or dropping) detaches the callback and closes the stream.
//!
//! Status observers are tagged with the generation of the stream they were
//! attached to. Replacing the stream retires that generation, so a late
//! event from the old stream cannot overwrite the new stream's status.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

use super::observer::{EventCallback, MessageCallback};
use super::stream::ResilientStream;
use crate::domain::Channel;

/// Zero-argument factory producing a fresh stream.
pub type StreamFactory<C> = Arc<dyn Fn() -> ResilientStream<C> + Send + Sync>;

/// A stream bound to one consumer, with reactive connection status.
pub struct StreamBinding<C: Channel> {
    factory: StreamFactory<C>,
    stream: ResilientStream<C>,
    callback: Option<MessageCallback<C::Incoming>>,
    status: Arc<StatusCell>,
}

/// Reactive connection status shared with the stream's observers.
#[derive(Debug)]
struct StatusCell {
    tx: watch::Sender<bool>,
    generation: AtomicU64,
}

impl StatusCell {
    fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            tx,
            generation: AtomicU64::new(0),
        }
    }

    fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Silences every observer of the current generation and returns the
    /// next one.
    fn retire(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Publishes `connected()` for `generation`. Stale generations and
    /// unchanged values do not wake receivers. `connected` is evaluated
    /// under the channel lock.
    fn publish(&self, generation: u64, connected: impl FnOnce() -> bool) {
        self.tx.send_if_modified(|current| {
            if self.current_generation() != generation {
                return false;
            }
            let connected = connected();
            std::mem::replace(current, connected) != connected
        });
    }
}

impl<C: Channel> StreamBinding<C> {
    /// Creates the stream and attaches `callback`, if any.
    #[must_use]
    pub fn mount(
        factory: StreamFactory<C>,
        callback: Option<MessageCallback<C::Incoming>>,
    ) -> Self {
        let status = Arc::new(StatusCell::new());
        let stream = open_stream(&factory, &status);
        let mut binding = Self {
            factory,
            stream,
            callback: None,
            status,
        };
        binding.attach(callback);
        binding
    }

    /// Re-applies the consumer's inputs.
    ///
    /// The stream is rebuilt only when `factory` is a different `Arc` from
    /// the one currently bound; a changed callback alone just swaps the
    /// message observer.
    pub fn refresh(
        &mut self,
        factory: &StreamFactory<C>,
        callback: Option<MessageCallback<C::Incoming>>,
    ) {
        if !Arc::ptr_eq(&self.factory, factory) {
            tracing::debug!(endpoint = %C::ENDPOINT, "factory changed; resetting stream");
            self.detach();
            self.status.retire();
            self.stream.close();
            self.factory = Arc::clone(factory);
            self.stream = open_stream(&self.factory, &self.status);
            self.attach(callback);
        } else if !same_callback(self.callback.as_ref(), callback.as_ref()) {
            self.detach();
            self.attach(callback);
        }
    }

    /// Last known connection status.
    #[must_use]
    pub fn connected(&self) -> bool {
        *self.status.tx.borrow()
    }

    /// A receiver that observes every status change.
    #[must_use]
    pub fn status(&self) -> watch::Receiver<bool> {
        self.status.tx.subscribe()
    }

    /// The live stream, for outbound sends.
    #[must_use]
    pub const fn stream(&self) -> &ResilientStream<C> {
        &self.stream
    }

    /// Detaches the callback and closes the stream.
    pub fn unmount(self) {
        drop(self);
    }

    fn attach(&mut self, callback: Option<MessageCallback<C::Incoming>>) {
        if let Some(callback) = &callback {
            self.stream.on_message(Arc::clone(callback));
        }
        self.callback = callback;
    }

    fn detach(&mut self) {
        if let Some(callback) = self.callback.take() {
            self.stream.off_message(&callback);
        }
    }
}

impl<C: Channel> Drop for StreamBinding<C> {
    fn drop(&mut self) {
        self.detach();
        self.stream.close();
    }
}

impl<C: Channel> fmt::Debug for StreamBinding<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamBinding")
            .field("stream", &self.stream)
            .field("connected", &self.connected())
            .field("has_callback", &self.callback.is_some())
            .finish_non_exhaustive()
    }
}

/// Builds a stream and wires its open/close events into `status` under the
/// current generation.
fn open_stream<C: Channel>(
    factory: &StreamFactory<C>,
    status: &Arc<StatusCell>,
) -> ResilientStream<C> {
    let stream = factory();
    let generation = status.current_generation();

    let on_open = Arc::clone(status);
    let open: EventCallback = Arc::new(move || on_open.publish(generation, || true));
    let on_close = Arc::clone(status);
    let close: EventCallback = Arc::new(move || on_close.publish(generation, || false));
    stream.on_open(open);
    stream.on_close(close);

    // The stream may have opened before the observers were attached. The
    // watch lock is held while reading, so a concurrent event lands after.
    status.publish(generation, || stream.connected());
    stream
}

fn same_callback<P>(a: Option<&MessageCallback<P>>, b: Option<&MessageCallback<P>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        _ => false,
    }
}
