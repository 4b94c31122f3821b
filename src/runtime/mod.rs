//! Process-wide runtime registration.
//!
//! A long-polling protocol engine looks up its environment under a single
//! global name: a request constructor, a timer pair and a console. This
//! module publishes that environment. [`install`] builds a [`Runtime`] and
//! stores it in the slot named [`GLOBAL_NAME`]; [`current`] reads it back.
//!
//! ```rust,no_run
//! # #[tokio::main]
//! # async fn main() {
//! cometnet::runtime::install();
//!
//! let runtime = cometnet::runtime::current().expect("installed above");
//! let xhr = runtime.xml_http_request();
//! runtime.console().info("runtime ready");
//! # let _ = xhr;
//! # }
//! ```

pub mod config;
pub mod console;
pub mod timer;

pub use config::RuntimeConfig;
pub use console::Console;
pub use timer::TimerHandle;

use crate::base::neterror::NetError;
use crate::http::streamfactory::HttpStreamFactory;
use crate::xhr::request::XmlHttpRequest;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};
use std::time::Duration;
use tokio::runtime::Handle;

/// Name of the global slot the protocol engine reads.
pub const GLOBAL_NAME: &str = "cometdRuntime";

static GLOBAL: LazyLock<RwLock<Option<Arc<Runtime>>>> = LazyLock::new(|| RwLock::new(None));

/// Install a runtime with the default configuration.
/// Calling again replaces the previous runtime.
pub fn install() {
    install_with_config(RuntimeConfig::default());
}

/// Install a runtime built from `config`, replacing any previous one.
pub fn install_with_config(config: RuntimeConfig) {
    let runtime = Arc::new(Runtime::new(config));
    tracing::debug!(name = GLOBAL_NAME, config = ?runtime.config, "installing runtime");
    *GLOBAL.write().unwrap_or_else(PoisonError::into_inner) = Some(runtime);
}

/// The installed runtime, if any.
pub fn current() -> Option<Arc<Runtime>> {
    GLOBAL
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// The environment published to the protocol engine: request constructor,
/// timers and console, backed by one pair of connection pools.
pub struct Runtime {
    config: RuntimeConfig,
    factory: Arc<HttpStreamFactory>,
    console: Console,
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("factory", &self.factory)
            .finish()
    }
}

impl Runtime {
    /// Build a runtime. Idle-connection cleanup starts only when called
    /// inside a tokio runtime.
    pub fn new(config: RuntimeConfig) -> Self {
        let factory = Arc::new(HttpStreamFactory::new(
            config.tls.clone(),
            config.pool.clone(),
        ));
        if Handle::try_current().is_ok() {
            factory.start_cleanup_tasks();
        }

        Self {
            config,
            factory,
            console: Console,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn factory(&self) -> &Arc<HttpStreamFactory> {
        &self.factory
    }

    /// A fresh request bound to this runtime's pools.
    pub fn xml_http_request(&self) -> XmlHttpRequest {
        let xhr = XmlHttpRequest::with_factory(self.factory.clone());
        match &self.config.user_agent {
            Some(user_agent) => xhr.with_user_agent(user_agent.clone()),
            None => xhr,
        }
    }

    /// Run `callback` once after `delay`.
    pub fn set_timeout<F>(&self, delay: Duration, callback: F) -> Result<TimerHandle, NetError>
    where
        F: FnOnce() + Send + 'static,
    {
        timer::set_timeout(delay, callback)
    }

    /// Cancel a pending timeout.
    pub fn clear_timeout(&self, handle: &TimerHandle) {
        handle.cancel();
    }

    pub fn console(&self) -> &Console {
        &self.console
    }
}
