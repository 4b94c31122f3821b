use crate::base::neterror::{NetError, TransportError};
use crate::http::streamfactory::{HttpStream, Transport};
use crate::socket::connectjob::ConnectJob;
use crate::socket::tls::TlsConfig;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Idle-connection lifetimes for a pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// How long a connection that carried at least one exchange may sit idle.
    pub used_idle_timeout: Duration,
    /// How long a connection that never carried an exchange may sit idle.
    pub unused_idle_timeout: Duration,
    /// Period of the background cleanup task.
    pub cleanup_interval: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        // Chromium defaults
        Self {
            used_idle_timeout: Duration::from_secs(300),
            unused_idle_timeout: Duration::from_secs(10),
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

/// Identifies a connection group (host, port). The scheme is implied by the
/// pool the group lives in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GroupId {
    host: String,
    port: u16,
}

impl GroupId {
    fn from_url(url: &Url) -> Option<Self> {
        Some(GroupId {
            host: url.host_str()?.to_ascii_lowercase(),
            port: url.port_or_known_default()?,
        })
    }
}

/// Idle stream with metadata for timeout tracking.
struct IdleStream {
    stream: HttpStream,
    /// When this stream was returned to the pool
    start_time: Instant,
}

impl IdleStream {
    fn is_expired(&self, now: Instant, config: &PoolConfig) -> bool {
        let timeout = if self.stream.was_used() {
            config.used_idle_timeout
        } else {
            config.unused_idle_timeout
        };
        now.duration_since(self.start_time) >= timeout
    }
}

/// Per-group state tracking.
#[derive(Default)]
struct Group {
    idle_streams: VecDeque<IdleStream>,
    active_count: usize,
}

/// Releases a counted slot if the connect fails or its future is dropped.
struct PendingSlot<'a> {
    pool: &'a ClientSocketPool,
    group_id: &'a GroupId,
    armed: bool,
}

impl PendingSlot<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.pool.decrement_active(self.group_id);
        }
    }
}

/// A pool of keep-alive HTTP/1.1 connections for one transport.
///
/// Unlike Chromium's pool there is no per-group or total cap and no pending
/// queue: a request that finds no usable idle connection always opens a new
/// one.
pub struct ClientSocketPool {
    transport: Transport,
    tls: Option<TlsConfig>,
    config: PoolConfig,

    // State
    groups: Arc<DashMap<GroupId, Group>>,
    total_active: Arc<AtomicUsize>,
    cleanup_started: AtomicBool,
}

impl std::fmt::Debug for ClientSocketPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSocketPool")
            .field("transport", &self.transport)
            .field("total_active", &self.total_active.load(Ordering::Relaxed))
            .field("idle", &self.idle_stream_count())
            .finish()
    }
}

impl ClientSocketPool {
    pub fn new(transport: Transport, tls: Option<TlsConfig>, config: PoolConfig) -> Self {
        let tls = match transport {
            Transport::Secure => Some(tls.unwrap_or_default()),
            Transport::Plain => None,
        };
        Self {
            transport,
            tls,
            config,
            groups: Arc::new(DashMap::new()),
            total_active: Arc::new(AtomicUsize::new(0)),
            cleanup_started: AtomicBool::new(false),
        }
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    /// Request a stream for the URL's origin. Returns the stream and whether
    /// it was reused from the idle list.
    pub async fn request_stream(&self, url: &Url) -> Result<(HttpStream, bool), TransportError> {
        let group_id = GroupId::from_url(url).ok_or(NetError::InvalidUrl)?;

        if let Some(stream) = self.take_idle(&group_id) {
            tracing::debug!(host = %group_id.host, port = group_id.port, "reusing pooled connection");
            return Ok((stream, true));
        }

        // Count the slot before the async connect so concurrent callers see it.
        self.groups.entry(group_id.clone()).or_default().active_count += 1;
        self.total_active.fetch_add(1, Ordering::Relaxed);
        let slot = PendingSlot { pool: self, group_id: &group_id, armed: true };

        let connected = match ConnectJob::connect(url, self.tls.as_ref()).await {
            Ok(socket) => HttpStream::handshake(socket).await,
            Err(e) => Err(e),
        };

        // On error the slot guard gives the count back.
        let stream = connected?;
        slot.disarm();
        tracing::debug!(host = %group_id.host, port = group_id.port, "opened new connection");
        Ok((stream, false))
    }

    /// Pop the freshest idle stream that is still open and not expired.
    fn take_idle(&self, group_id: &GroupId) -> Option<HttpStream> {
        let mut group = self.groups.get_mut(group_id)?;
        let now = Instant::now();

        while let Some(idle) = group.idle_streams.pop_back() {
            if idle.stream.is_closed() || idle.is_expired(now, &self.config) {
                // Dead or stale, continue to next
                continue;
            }
            group.active_count += 1;
            self.total_active.fetch_add(1, Ordering::Relaxed);
            return Some(idle.stream);
        }
        None
    }

    /// Release a stream back to the pool after a clean exchange.
    pub fn release_stream(&self, url: &Url, stream: HttpStream) {
        let Some(group_id) = GroupId::from_url(url) else {
            return;
        };

        let mut group = self.groups.entry(group_id).or_default();
        group.active_count = group.active_count.saturating_sub(1);
        self.total_active.fetch_sub(1, Ordering::Relaxed);

        if !stream.is_closed() {
            group.idle_streams.push_back(IdleStream { stream, start_time: Instant::now() });
        }
    }

    /// Discard a stream without returning it to the pool.
    pub fn discard_stream(&self, url: &Url) {
        let Some(group_id) = GroupId::from_url(url) else {
            return;
        };
        tracing::debug!(host = %group_id.host, port = group_id.port, "discarding connection");
        self.decrement_active(&group_id);
    }

    fn decrement_active(&self, group_id: &GroupId) {
        if let Some(mut group) = self.groups.get_mut(group_id) {
            if group.active_count > 0 {
                group.active_count -= 1;
                self.total_active.fetch_sub(1, Ordering::Relaxed);
            }
        }
    }

    /// Get total active stream count.
    pub fn total_active_count(&self) -> usize {
        self.total_active.load(Ordering::Relaxed)
    }

    /// Get total idle stream count across all groups.
    pub fn idle_stream_count(&self) -> usize {
        self.groups.iter().map(|g| g.idle_streams.len()).sum()
    }

    /// Drop idle streams that are closed or past their idle timeout, and
    /// forget groups with nothing left in them.
    pub fn cleanup_idle_streams(&self) {
        let now = Instant::now();
        let mut expired = 0usize;

        for mut entry in self.groups.iter_mut() {
            let group = entry.value_mut();
            let before = group.idle_streams.len();
            group
                .idle_streams
                .retain(|idle| !idle.stream.is_closed() && !idle.is_expired(now, &self.config));
            expired += before - group.idle_streams.len();
        }

        self.groups.retain(|_, group| !group.idle_streams.is_empty() || group.active_count > 0);

        if expired > 0 {
            tracing::debug!(transport = ?self.transport, expired, "expired idle connections");
        }
    }

    /// Start a background task to periodically clean up idle streams.
    /// Only the first call spawns; later calls are no-ops.
    pub fn start_cleanup_task(self: &Arc<Self>) {
        if self.cleanup_started.swap(true, Ordering::AcqRel) {
            return;
        }

        let pool = Arc::downgrade(self);
        let interval = self.config.cleanup_interval;
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                match pool.upgrade() {
                    Some(pool) => pool.cleanup_idle_streams(),
                    None => break,
                }
            }
        });
    }
}
