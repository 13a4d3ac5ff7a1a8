#![cfg(test)]

//! Scripted collaborators shared by the pool tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};
use crate::identifiers::HostDescription;
use crate::protocol::{AuthenticationMethod, Request, Response};
use crate::transport::{Connection, ConnectionFactory};

/// Header carrying the serving host in mock responses.
pub(crate) const HOST_HEADER: &str = "x-host";

pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub(crate) fn host(name: &str) -> HostDescription {
    HostDescription::new(name, 8529)
}

pub(crate) fn auth() -> AuthenticationMethod {
    AuthenticationMethod::basic("root", "")
}

// ============================================================================
// MockHandle
// ============================================================================

/// Test-side view of a created connection.
#[derive(Clone)]
pub(crate) struct MockHandle {
    pub host: HostDescription,
    connected: Arc<AtomicBool>,
    closes: Arc<AtomicUsize>,
}

impl MockHandle {
    pub(crate) fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    pub(crate) fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

// ============================================================================
// MockConnection
// ============================================================================

pub(crate) struct MockConnection {
    handle: MockHandle,
    execute_error: Option<String>,
}

#[async_trait]
impl Connection for MockConnection {
    async fn execute(&self, _request: Request) -> Result<Response> {
        match &self.execute_error {
            Some(message) => Err(Error::connection(message.clone())),
            None => Ok(Response::new(200).with_header(HOST_HEADER, self.handle.host.to_string())),
        }
    }

    async fn is_connected(&self) -> bool {
        self.handle.connected.load(Ordering::SeqCst)
    }

    async fn close(&self) {
        self.handle.closes.fetch_add(1, Ordering::SeqCst);
        self.handle.connected.store(false, Ordering::SeqCst);
    }
}

// ============================================================================
// MockFactory
// ============================================================================

#[derive(Default)]
struct HostScript {
    unreachable: bool,
    failures: usize,
    delay: Option<Duration>,
    execute_error: Option<String>,
}

#[derive(Default)]
struct MockState {
    scripts: Mutex<FxHashMap<HostDescription, HostScript>>,
    created: Mutex<Vec<MockHandle>>,
    attempts: AtomicUsize,
    closed: AtomicBool,
}

/// Factory whose behavior is scripted per host. Clones share state.
#[derive(Clone, Default)]
pub(crate) struct MockFactory {
    state: Arc<MockState>,
}

impl MockFactory {
    fn script(&self, host: &HostDescription, f: impl FnOnce(&mut HostScript)) {
        f(self.state.scripts.lock().entry(host.clone()).or_default());
    }

    pub(crate) fn set_unreachable(&self, host: &HostDescription) {
        self.script(host, |s| s.unreachable = true);
    }

    /// Makes the next `count` tries against `host` fail.
    pub(crate) fn fail_next(&self, host: &HostDescription, count: usize) {
        self.script(host, |s| s.failures = count);
    }

    pub(crate) fn set_delay(&self, host: &HostDescription, delay: Duration) {
        self.script(host, |s| s.delay = Some(delay));
    }

    pub(crate) fn fail_execute(&self, host: &HostDescription, message: &str) {
        self.script(host, |s| s.execute_error = Some(message.to_string()));
    }

    pub(crate) fn handles(&self, host: &HostDescription) -> Vec<MockHandle> {
        self.state
            .created
            .lock()
            .iter()
            .filter(|h| &h.host == host)
            .cloned()
            .collect()
    }

    pub(crate) fn attempts(&self) -> usize {
        self.state.attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectionFactory for MockFactory {
    type Connection = MockConnection;

    async fn create(
        &self,
        host: &HostDescription,
        _authentication: &AuthenticationMethod,
    ) -> Result<MockConnection> {
        self.state.attempts.fetch_add(1, Ordering::SeqCst);

        let (delay, outcome) = {
            let mut scripts = self.state.scripts.lock();
            let script = scripts.entry(host.clone()).or_default();

            let outcome = if script.unreachable {
                Err(())
            } else if script.failures > 0 {
                script.failures -= 1;
                Err(())
            } else {
                Ok(script.execute_error.clone())
            };

            (script.delay, outcome)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let execute_error = outcome.map_err(|()| Error::connection(format!("{host} unreachable")))?;

        let handle = MockHandle {
            host: host.clone(),
            connected: Arc::new(AtomicBool::new(true)),
            closes: Arc::new(AtomicUsize::new(0)),
        };
        self.state.created.lock().push(handle.clone());

        Ok(MockConnection {
            handle,
            execute_error,
        })
    }

    async fn close(&self) {
        self.state.closed.store(true, Ordering::SeqCst);
    }
}
