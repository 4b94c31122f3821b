use crate::socket::pool::PoolConfig;
use crate::socket::tls::TlsConfig;

/// Configuration for an installed [`Runtime`](super::Runtime).
#[derive(Clone, Default)]
pub struct RuntimeConfig {
    /// `User-Agent` added to requests that do not set one.
    pub user_agent: Option<String>,

    /// TLS settings for the secure pool.
    pub tls: TlsConfig,

    /// Idle-connection lifetimes shared by both pools.
    pub pool: PoolConfig,
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn tls(mut self, tls: TlsConfig) -> Self {
        self.tls = tls;
        self
    }

    pub fn pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }
}

impl std::fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("user_agent", &self.user_agent)
            .field("verify_peer", &self.tls.verify_peer)
            .field("pool", &self.pool)
            .finish()
    }
}
