//! Self-healing typed stream over a WebSocket.
//!
//! A [`ResilientStream`] keeps itself connected to one endpoint until it is
//! explicitly closed. Connection status is an explicit state machine:
//!
//! ```text
//! Disconnected ──liveness tick──▶ Connecting(n) ──handshake ok──▶ Connected(n)
//!      ▲                               │                              │
//!      └────────── failure ────────────┴──────── drop/error ──────────┘
//!
//! any state ──close()──▶ Closed
//! ```
//!
//! Only `Disconnected` starts a new attempt, so a slow handshake is never
//! abandoned and duplicated. Every attempt carries its own id; events from
//! a transport whose id no longer matches the stored state are ignored,
//! which makes anything arriving after `close()` a no-op.
//!
//! Observers run under a reentrant dispatch lock that `close()` also takes,
//! and the attempt id is re-checked before each observer. Once `close()`
//! returns, no observer of an earlier transport fires again, even when an
//! observer itself closed the stream halfway through a notification.
//!
//! Retries run at a constant interval with no backoff.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, ReentrantMutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::observer::{EventCallback, MessageCallback, ObserverRegistry};
use super::transport::{self, Incoming};
use crate::config::StreamConfig;
use crate::domain::{Channel, Endpoint, PausedChannel, PoseChannel};
use crate::error::StreamError;

/// Observable connection state of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No transport; the next liveness tick starts an attempt.
    Disconnected,
    /// Handshake in flight.
    Connecting {
        /// Attempt id.
        attempt: u64,
    },
    /// Transport open.
    Connected {
        /// Attempt id of the open transport.
        attempt: u64,
    },
    /// Closed by the owner. Terminal.
    Closed,
}

/// Internal state; `Connected` owns the outbound queue of the open transport.
enum Link {
    Disconnected,
    Connecting {
        attempt: u64,
    },
    Connected {
        attempt: u64,
        outbound: mpsc::UnboundedSender<String>,
    },
    Closed,
}

impl Link {
    const fn state(&self) -> LinkState {
        match self {
            Self::Disconnected => LinkState::Disconnected,
            Self::Connecting { attempt } => LinkState::Connecting { attempt: *attempt },
            Self::Connected { attempt, .. } => LinkState::Connected { attempt: *attempt },
            Self::Closed => LinkState::Closed,
        }
    }

    const fn is_attempt(&self, id: u64) -> bool {
        match self {
            Self::Connecting { attempt } | Self::Connected { attempt, .. } => *attempt == id,
            Self::Disconnected | Self::Closed => false,
        }
    }
}

struct Inner<C: Channel> {
    url: String,
    connect_timeout: Duration,
    link: Mutex<Link>,
    /// Held while observers run and while `close()` swaps the state.
    /// Always taken before `link`, never after.
    dispatch: ReentrantMutex<()>,
    next_attempt: AtomicU64,
    liveness: Mutex<Option<JoinHandle<()>>>,
    on_message: ObserverRegistry<dyn Fn(&C::Incoming) + Send + Sync>,
    on_open: ObserverRegistry<dyn Fn() + Send + Sync>,
    on_close: ObserverRegistry<dyn Fn() + Send + Sync>,
}

impl<C: Channel> Inner<C> {
    /// Starts a connection attempt if, and only if, the stream is
    /// `Disconnected`.
    fn check_liveness(self: &Arc<Self>) {
        let attempt = {
            let mut link = self.link.lock();
            if !matches!(*link, Link::Disconnected) {
                return;
            }
            let attempt = self.next_attempt.fetch_add(1, Ordering::Relaxed);
            *link = Link::Connecting { attempt };
            attempt
        };

        tracing::debug!(endpoint = %C::ENDPOINT, url = %self.url, attempt, "opening transport");
        tokio::spawn(Arc::clone(self).drive(attempt));
    }

    /// Owns one transport from handshake to teardown.
    async fn drive(self: Arc<Self>, attempt: u64) {
        let opened = tokio::time::timeout(self.connect_timeout, transport::open(&self.url)).await;
        let (mut writer, mut reader) = match opened {
            Ok(Ok(halves)) => halves,
            Ok(Err(e)) => {
                tracing::debug!(endpoint = %C::ENDPOINT, attempt, error = %e, "connection attempt failed");
                self.transport_closed(attempt);
                return;
            }
            Err(_) => {
                tracing::warn!(endpoint = %C::ENDPOINT, attempt, "connection attempt timed out");
                self.transport_closed(attempt);
                return;
            }
        };

        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<String>();
        let adopted = {
            let mut link = self.link.lock();
            if matches!(*link, Link::Connecting { attempt: current } if current == attempt) {
                *link = Link::Connected { attempt, outbound };
                true
            } else {
                false
            }
        };
        if !adopted {
            // Closed while the handshake was in flight.
            let _ = writer.close().await;
            return;
        }

        tracing::info!(endpoint = %C::ENDPOINT, url = %self.url, attempt, "stream connected");
        self.notify_current(attempt, &self.on_open, |callback| callback());

        loop {
            tokio::select! {
                biased;

                outgoing = outbound_rx.recv() => {
                    let Some(text) = outgoing else {
                        // The link dropped our queue: the stream was closed.
                        let _ = writer.close().await;
                        return;
                    };
                    if let Err(e) = writer.send_text(text).await {
                        tracing::warn!(endpoint = %C::ENDPOINT, attempt, error = %e, "transport write failed");
                        break;
                    }
                }
                incoming = reader.recv() => {
                    match incoming {
                        Some(Ok(Incoming::Text(text))) => self.dispatch(attempt, &text),
                        Some(Ok(Incoming::Close { code, reason })) => {
                            tracing::info!(endpoint = %C::ENDPOINT, attempt, code, %reason, "transport closed by peer");
                            break;
                        }
                        Some(Err(e)) => {
                            tracing::warn!(endpoint = %C::ENDPOINT, attempt, error = %e, "transport error");
                            break;
                        }
                        None => {
                            tracing::info!(endpoint = %C::ENDPOINT, attempt, "transport ended");
                            break;
                        }
                    }
                }
            }
        }

        self.transport_closed(attempt);
    }

    /// Parses a frame and hands it to every message observer. Malformed
    /// frames are logged and dropped without touching the connection.
    fn dispatch(&self, attempt: u64, text: &str) {
        if !self.link.lock().is_attempt(attempt) {
            return;
        }
        match serde_json::from_str::<C::Incoming>(text) {
            Ok(payload) => {
                self.notify_current(attempt, &self.on_message, |callback| callback(&payload));
            }
            Err(e) => {
                tracing::warn!(endpoint = %C::ENDPOINT, attempt, error = %e, "error parsing payload; frame dropped");
            }
        }
    }

    /// Moves the stream back to `Disconnected` if `attempt` is still the
    /// current one, then fires close observers.
    fn transport_closed(&self, attempt: u64) {
        let _dispatch = self.dispatch.lock();
        let current = {
            let mut link = self.link.lock();
            let current = link.is_attempt(attempt);
            if current {
                *link = Link::Disconnected;
            }
            current
        };
        if current {
            self.on_close.for_each_while(
                || !matches!(*self.link.lock(), Link::Closed),
                |callback| callback(),
            );
        }
    }

    /// Fires `registry` while `attempt` is still the live transport.
    fn notify_current<F: ?Sized>(
        &self,
        attempt: u64,
        registry: &ObserverRegistry<F>,
        call: impl FnMut(&F),
    ) {
        let _dispatch = self.dispatch.lock();
        registry.for_each_while(|| self.link.lock().is_attempt(attempt), call);
    }

    fn close(&self) {
        if let Some(liveness) = self.liveness.lock().take() {
            liveness.abort();
        }

        let _dispatch = self.dispatch.lock();
        let previous = std::mem::replace(&mut *self.link.lock(), Link::Closed).state();
        match previous {
            LinkState::Closed => {}
            LinkState::Connected { .. } => {
                // The replaced link held the outbound queue; dropping it
                // tells the writer to send a normal close.
                tracing::info!(endpoint = %C::ENDPOINT, url = %self.url, "stream closed");
                self.on_close.for_each(|callback| callback());
            }
            LinkState::Disconnected | LinkState::Connecting { .. } => {
                tracing::debug!(endpoint = %C::ENDPOINT, url = %self.url, "stream closed while offline");
            }
        }
    }
}

/// A typed stream to one endpoint that keeps itself connected until closed.
///
/// Each instance owns its own transport, even when several instances
/// address the same endpoint. Dropping the handle closes the stream.
pub struct ResilientStream<C: Channel> {
    inner: Arc<Inner<C>>,
}

impl<C: Channel> ResilientStream<C> {
    /// Connects to `C::ENDPOINT` on `config.base_url`.
    ///
    /// Starts the first attempt and the liveness timer right away and
    /// returns without waiting for the handshake. Must be called from
    /// within a tokio runtime.
    #[must_use]
    pub fn connect(config: &StreamConfig) -> Self {
        Self::connect_to(C::ENDPOINT.url(&config.base_url), config)
    }

    /// Connects to an explicit URL. `config.base_url` is ignored.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn connect_to(url: impl Into<String>, config: &StreamConfig) -> Self {
        let inner = Arc::new(Inner {
            url: url.into(),
            connect_timeout: config.connect_timeout,
            link: Mutex::new(Link::Disconnected),
            dispatch: ReentrantMutex::new(()),
            next_attempt: AtomicU64::new(1),
            liveness: Mutex::new(None),
            on_message: ObserverRegistry::new(),
            on_open: ObserverRegistry::new(),
            on_close: ObserverRegistry::new(),
        });

        inner.check_liveness();
        let handle = tokio::spawn(liveness_loop(Arc::downgrade(&inner), config.check_interval));
        *inner.liveness.lock() = Some(handle);

        Self { inner }
    }

    /// Serializes `payload` and queues it on the open transport.
    ///
    /// While the stream is not connected the message is dropped: nothing
    /// is buffered and nothing is replayed after a reconnect.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Serialize`] if the payload cannot be
    /// serialized and [`StreamError::TransportGone`] if the open transport
    /// stopped accepting writes.
    pub fn send(&self, payload: &C::Outgoing) -> Result<(), StreamError> {
        let text = serde_json::to_string(payload)?;
        let link = self.inner.link.lock();
        match &*link {
            Link::Connected { outbound, .. } => outbound
                .send(text)
                .map_err(|_| StreamError::TransportGone {
                    endpoint: C::ENDPOINT,
                }),
            _ => {
                tracing::debug!(endpoint = %C::ENDPOINT, "not connected; dropping outgoing message");
                Ok(())
            }
        }
    }

    /// Closes the stream for good: stops the liveness timer and closes the
    /// transport. Close observers fire if the stream was connected.
    /// Calling it again does nothing.
    pub fn close(&self) {
        self.inner.close();
    }

    /// Returns `true` while a transport is held and open.
    #[must_use]
    pub fn connected(&self) -> bool {
        matches!(*self.inner.link.lock(), Link::Connected { .. })
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> LinkState {
        self.inner.link.lock().state()
    }

    /// Runs one liveness check now instead of waiting for the timer.
    pub fn check_liveness(&self) {
        self.inner.check_liveness();
    }

    /// Endpoint this stream talks to.
    #[must_use]
    pub const fn endpoint(&self) -> Endpoint {
        C::ENDPOINT
    }

    /// Resolved URL of the endpoint.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Registers a message observer.
    pub fn on_message(&self, callback: MessageCallback<C::Incoming>) {
        self.inner.on_message.add(callback);
    }

    /// Removes every registration of `callback`.
    pub fn off_message(&self, callback: &MessageCallback<C::Incoming>) {
        self.inner.on_message.remove(callback);
    }

    /// Registers an open observer.
    pub fn on_open(&self, callback: EventCallback) {
        self.inner.on_open.add(callback);
    }

    /// Removes every registration of `callback`.
    pub fn off_open(&self, callback: &EventCallback) {
        self.inner.on_open.remove(callback);
    }

    /// Registers a close observer.
    pub fn on_close(&self, callback: EventCallback) {
        self.inner.on_close.add(callback);
    }

    /// Removes every registration of `callback`.
    pub fn off_close(&self, callback: &EventCallback) {
        self.inner.on_close.remove(callback);
    }
}

impl<C: Channel> Drop for ResilientStream<C> {
    fn drop(&mut self) {
        self.inner.close();
    }
}

impl<C: Channel> fmt::Debug for ResilientStream<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResilientStream")
            .field("endpoint", &C::ENDPOINT)
            .field("url", &self.inner.url)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

async fn liveness_loop<C: Channel>(inner: Weak<Inner<C>>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; the constructor already tried.
    interval.tick().await;

    loop {
        interval.tick().await;
        let Some(stream) = inner.upgrade() else {
            break;
        };
        stream.check_liveness();
    }
}

/// Returns a stream for the pose endpoint.
#[must_use]
pub fn pose_stream(config: &StreamConfig) -> ResilientStream<PoseChannel> {
    ResilientStream::connect(config)
}

/// Returns a stream for the paused endpoint.
#[must_use]
pub fn paused_stream(config: &StreamConfig) -> ResilientStream<PausedChannel> {
    ResilientStream::connect(config)
}


#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use futures_util::{SinkExt, StreamExt};
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::Message;

    use super::*;
    use crate::domain::{Pose, PoseUpdate};

    const POSE_FRAME: &str = r#"{"x":1.0,"y":2.0,"angle":3.0}"#;

    fn fast_config() -> StreamConfig {
        StreamConfig::default()
            .with_check_interval(Duration::from_millis(50))
            .with_connect_timeout(Duration::from_secs(2))
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        for _ in 0..100 {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        condition()
    }

    async fn local_listener() -> (TcpListener, String) {
        let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind loopback");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("listener has an address");
        };
        (listener, format!("ws://{addr}/api/pose"))
    }

    fn counting(hits: &Arc<AtomicUsize>) -> EventCallback {
        let hits = Arc::clone(hits);
        Arc::new(move || {
            hits.fetch_add(1, Ordering::SeqCst);
        })
    }

    /// Accepts a single WebSocket after `delay` and keeps it open without
    /// sending.
    fn serve_idle_once(listener: TcpListener, delay: Duration) {
        tokio::spawn(async move {
            let Ok((tcp, _)) = listener.accept().await else {
                return;
            };
            tokio::time::sleep(delay).await;
            let Ok(mut ws) = tokio_tungstenite::accept_async(tcp).await else {
                return;
            };
            while ws.next().await.is_some() {}
        });
    }

    #[tokio::test]
    async fn send_while_disconnected_is_dropped_silently() {
        // Nothing listens on port 9 of the loopback interface.
        let stream = ResilientStream::<PoseChannel>::connect_to(
            "ws://127.0.0.1:9/api/pose",
            &fast_config(),
        );
        assert!(!stream.connected());
        tokio_test::assert_ok!(stream.send(&PoseUpdate::x(1.0)));
    }

    #[tokio::test]
    async fn close_is_terminal_and_idempotent() {
        let stream = ResilientStream::<PoseChannel>::connect_to(
            "ws://127.0.0.1:9/api/pose",
            &fast_config(),
        );
        stream.close();
        stream.close();
        assert_eq!(stream.state(), LinkState::Closed);

        stream.check_liveness();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(stream.state(), LinkState::Closed);
        assert!(!stream.connected());
    }

    #[tokio::test]
    async fn malformed_frame_keeps_connection() {
        let (listener, url) = local_listener().await;
        let accepts = Arc::new(AtomicUsize::new(0));
        let accepted = Arc::clone(&accepts);
        tokio::spawn(async move {
            while let Ok((tcp, _)) = listener.accept().await {
                accepted.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    let Ok(mut ws) = tokio_tungstenite::accept_async(tcp).await else {
                        return;
                    };
                    if ws.send(Message::text("not json")).await.is_err()
                        || ws.send(Message::text(POSE_FRAME)).await.is_err()
                    {
                        return;
                    }
                    while ws.next().await.is_some() {}
                });
            }
        });

        let received = Arc::new(Mutex::new(Vec::<Pose>::new()));
        let sink = Arc::clone(&received);
        let stream = ResilientStream::<PoseChannel>::connect_to(url, &fast_config());
        stream.on_message(Arc::new(move |pose: &Pose| sink.lock().push(*pose)));

        assert!(wait_until(|| !received.lock().is_empty()).await);
        assert_eq!(received.lock().as_slice(), &[Pose::new(1.0, 2.0, 3.0)]);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(stream.connected());
        assert_eq!(accepts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn slow_handshake_is_not_duplicated() {
        let (listener, url) = local_listener().await;
        let accepts = Arc::new(AtomicUsize::new(0));
        let accepted = Arc::clone(&accepts);
        tokio::spawn(async move {
            while let Ok((tcp, _)) = listener.accept().await {
                accepted.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    // Hold the handshake across several liveness ticks.
                    tokio::time::sleep(Duration::from_millis(300)).await;
                    let Ok(mut ws) = tokio_tungstenite::accept_async(tcp).await else {
                        return;
                    };
                    while ws.next().await.is_some() {}
                });
            }
        });

        let stream = ResilientStream::<PoseChannel>::connect_to(url, &fast_config());
        for _ in 0..5 {
            stream.check_liveness();
        }
        assert!(matches!(stream.state(), LinkState::Connecting { .. }));

        assert!(wait_until(|| stream.connected()).await);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(accepts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn handshake_timeout_counts_as_failed_attempt() {
        let (listener, url) = local_listener().await;
        let accepts = Arc::new(AtomicUsize::new(0));
        let accepted = Arc::clone(&accepts);
        tokio::spawn(async move {
            // Accept TCP but never answer the upgrade request.
            let mut held = Vec::new();
            while let Ok((tcp, _)) = listener.accept().await {
                accepted.fetch_add(1, Ordering::SeqCst);
                held.push(tcp);
            }
        });

        let config = StreamConfig::default()
            .with_check_interval(Duration::from_millis(400))
            .with_connect_timeout(Duration::from_millis(100));
        let closes = Arc::new(AtomicUsize::new(0));
        let stream = ResilientStream::<PoseChannel>::connect_to(url, &config);
        stream.on_close(counting(&closes));
        assert!(matches!(stream.state(), LinkState::Connecting { .. }));

        assert!(wait_until(|| closes.load(Ordering::SeqCst) >= 1).await);
        assert_eq!(stream.state(), LinkState::Disconnected);
        assert_eq!(accepts.load(Ordering::SeqCst), 1);

        // The next liveness tick starts a fresh attempt.
        assert!(wait_until(|| accepts.load(Ordering::SeqCst) >= 2).await);
        assert!(!stream.connected());
    }

    #[tokio::test]
    async fn reconnects_after_server_drop() {
        let (listener, url) = local_listener().await;
        let accepts = Arc::new(AtomicUsize::new(0));
        let accepted = Arc::clone(&accepts);
        tokio::spawn(async move {
            while let Ok((tcp, _)) = listener.accept().await {
                let n = accepted.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    let Ok(mut ws) = tokio_tungstenite::accept_async(tcp).await else {
                        return;
                    };
                    if n == 0 {
                        // Drop the first connection shortly after it opens.
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        let _ = ws.close(None).await;
                        return;
                    }
                    while ws.next().await.is_some() {}
                });
            }
        });

        let opens = Arc::new(AtomicUsize::new(0));
        let closes = Arc::new(AtomicUsize::new(0));
        let stream = ResilientStream::<PoseChannel>::connect_to(url, &fast_config());
        stream.on_open(counting(&opens));
        stream.on_close(counting(&closes));

        assert!(wait_until(|| accepts.load(Ordering::SeqCst) >= 2 && stream.connected()).await);
        assert!(closes.load(Ordering::SeqCst) >= 1);
        assert!(opens.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn off_message_stops_delivery() {
        let (listener, url) = local_listener().await;
        tokio::spawn(async move {
            let Ok((tcp, _)) = listener.accept().await else {
                return;
            };
            let Ok(mut ws) = tokio_tungstenite::accept_async(tcp).await else {
                return;
            };
            while ws.send(Message::text(POSE_FRAME)).await.is_ok() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        });

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let callback: MessageCallback<Pose> = Arc::new(move |_: &Pose| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let stream = ResilientStream::<PoseChannel>::connect_to(url, &fast_config());
        stream.on_message(Arc::clone(&callback));
        stream.on_message(Arc::clone(&callback));
        assert!(wait_until(|| hits.load(Ordering::SeqCst) >= 4).await);

        stream.off_message(&callback);
        let after_removal = hits.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        // A dispatch already in progress may still finish.
        assert!(hits.load(Ordering::SeqCst) <= after_removal + 2);
        let settled = hits.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(hits.load(Ordering::SeqCst), settled);
    }

    #[tokio::test]
    async fn dropping_stream_from_open_observer_silences_the_rest() {
        let (listener, url) = local_listener().await;
        serve_idle_once(listener, Duration::ZERO);

        let slot: Arc<Mutex<Option<ResilientStream<PoseChannel>>>> = Arc::new(Mutex::new(None));
        let late_opens = Arc::new(AtomicUsize::new(0));
        let closes = Arc::new(AtomicUsize::new(0));

        let stream = ResilientStream::<PoseChannel>::connect_to(url, &fast_config());
        let owner = Arc::clone(&slot);
        stream.on_open(Arc::new(move || {
            let last_handle = owner.lock().take();
            drop(last_handle);
        }));
        stream.on_open(counting(&late_opens));
        stream.on_close(counting(&closes));
        *slot.lock() = Some(stream);

        assert!(wait_until(|| slot.lock().is_none()).await);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert_eq!(late_opens.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn close_waits_for_in_flight_observers() {
        let (listener, url) = local_listener().await;
        // Slow enough that the observers below are registered first.
        serve_idle_once(listener, Duration::from_millis(100));

        let events: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
        let stream = ResilientStream::<PoseChannel>::connect_to(url, &fast_config());
        let first = Arc::clone(&events);
        stream.on_open(Arc::new(move || {
            first.lock().push("open");
            std::thread::sleep(Duration::from_millis(200));
        }));
        let second = Arc::clone(&events);
        stream.on_open(Arc::new(move || second.lock().push("open")));
        let closed = Arc::clone(&events);
        stream.on_close(Arc::new(move || closed.lock().push("close")));

        assert!(wait_until(|| !events.lock().is_empty()).await);
        stream.close();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(events.lock().as_slice(), &["open", "open", "close"]);
    }
}
