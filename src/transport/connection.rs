//! Cookie-bearing connection and its event loop.
//!
//! Each [`HttpConnection`] spawns one tokio task that exclusively owns the
//! [`HttpTransport`] and the connection's [`CookieJar`]. Callers talk to the
//! task over a channel, so the jar never leaves its task.
//!
//! # Event Loop
//!
//! For every `Execute` command the loop:
//!
//! 1. Adds the `Authorization` header
//! 2. Attaches the jar's live cookies
//! 3. Sends the request over the transport
//! 4. Absorbs cookies from the response
//!
//! A `Shutdown` command (or dropping the connection) ends the loop, closes
//! the transport, clears the jar and fails any queued requests.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::{ConnectionId, HostDescription};
use crate::protocol::{AuthenticationMethod, Request, Response};

use super::cookie_jar::CookieJar;
use super::traits::{Connection, ConnectionFactory, HttpConnector, HttpTransport};

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Execute a request and reply on the channel.
    Execute {
        request: Request,
        response_tx: oneshot::Sender<Result<Response>>,
    },
    /// Close the transport, then acknowledge.
    Shutdown(oneshot::Sender<()>),
}

// ============================================================================
// HttpConnection
// ============================================================================

/// Connection over an [`HttpTransport`] with a private cookie jar.
///
/// # Thread Safety
///
/// `HttpConnection` is `Send + Sync`; requests from many tasks are
/// serialized through the event loop.
pub struct HttpConnection {
    /// Identifier used in log lines.
    id: ConnectionId,
    /// Remote host.
    host: HostDescription,
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    /// Cleared on transport failure or shutdown.
    connected: Arc<AtomicBool>,
}

impl fmt::Debug for HttpConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpConnection")
            .field("id", &self.id)
            .field("host", &self.host)
            .field("connected", &self.connected.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl HttpConnection {
    /// Wraps an open transport and spawns its event loop.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new<T: HttpTransport>(
        host: HostDescription,
        transport: T,
        authentication: &AuthenticationMethod,
    ) -> Self {
        let id = ConnectionId::generate();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(true));

        tokio::spawn(Self::run_event_loop(
            id,
            transport,
            authentication.header_value(),
            command_rx,
            Arc::clone(&connected),
        ));

        debug!(connection_id = %id, host = %host, "HttpConnection opened");

        Self {
            id,
            host,
            command_tx,
            connected,
        }
    }

    /// Returns the connection ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns the remote host.
    #[inline]
    #[must_use]
    pub fn host(&self) -> &HostDescription {
        &self.host
    }

    /// Event loop that owns the transport and the cookie jar.
    async fn run_event_loop<T: HttpTransport>(
        id: ConnectionId,
        mut transport: T,
        authorization: String,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        connected: Arc<AtomicBool>,
    ) {
        let mut cookies = CookieJar::new();
        let mut shutdown_ack = None;

        while let Some(command) = command_rx.recv().await {
            match command {
                ConnectionCommand::Execute {
                    request,
                    response_tx,
                } => {
                    let result = Self::handle_execute(
                        &mut transport,
                        &mut cookies,
                        &authorization,
                        request,
                    )
                    .await;

                    if let Err(e) = &result
                        && e.is_connection_error()
                    {
                        warn!(connection_id = %id, error = %e, "Transport failed");
                        connected.store(false, Ordering::Release);
                    }

                    let _ = response_tx.send(result);
                }

                ConnectionCommand::Shutdown(ack) => {
                    debug!(connection_id = %id, "Shutdown command received");
                    shutdown_ack = Some(ack);
                    break;
                }
            }
        }

        connected.store(false, Ordering::Release);
        transport.close().await;
        cookies.clear();

        Self::fail_pending_commands(&mut command_rx);

        if let Some(ack) = shutdown_ack {
            let _ = ack.send(());
        }

        debug!(connection_id = %id, "Event loop terminated");
    }

    /// Sends one request through the jar and the transport.
    async fn handle_execute<T: HttpTransport>(
        transport: &mut T,
        cookies: &mut CookieJar,
        authorization: &str,
        request: Request,
    ) -> Result<Response> {
        let request = cookies.prepare_outgoing(request.with_header("authorization", authorization));

        trace!(method = %request.method, path = %request.path, "Sending request");
        let response = transport.send(request).await?;

        cookies.absorb_incoming(&response);
        Ok(response)
    }

    /// Fails requests queued behind a shutdown.
    fn fail_pending_commands(command_rx: &mut mpsc::UnboundedReceiver<ConnectionCommand>) {
        command_rx.close();

        let mut count = 0usize;
        while let Ok(command) = command_rx.try_recv() {
            match command {
                ConnectionCommand::Execute { response_tx, .. } => {
                    let _ = response_tx.send(Err(Error::ConnectionClosed));
                    count += 1;
                }
                ConnectionCommand::Shutdown(ack) => {
                    let _ = ack.send(());
                }
            }
        }

        if count > 0 {
            debug!(count, "Failed pending requests on shutdown");
        }
    }
}

#[async_trait]
impl Connection for HttpConnection {
    async fn execute(&self, request: Request) -> Result<Response> {
        let (response_tx, response_rx) = oneshot::channel();

        self.command_tx
            .send(ConnectionCommand::Execute {
                request,
                response_tx,
            })
            .map_err(|_| Error::ConnectionClosed)?;

        response_rx.await.map_err(|_| Error::ConnectionClosed)?
    }

    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire) && !self.command_tx.is_closed()
    }

    /// Closes the transport. Safe to call more than once.
    async fn close(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();

        if self.command_tx.send(ConnectionCommand::Shutdown(ack_tx)).is_err() {
            return;
        }

        let _ = ack_rx.await;
        debug!(connection_id = %self.id, host = %self.host, "HttpConnection closed");
    }
}

// ============================================================================
// HttpConnectionFactory
// ============================================================================

/// [`ConnectionFactory`] producing [`HttpConnection`]s from an
/// [`HttpConnector`].
#[derive(Debug, Clone)]
pub struct HttpConnectionFactory<C> {
    connector: C,
}

impl<C: HttpConnector> HttpConnectionFactory<C> {
    /// Creates a factory around `connector`.
    #[inline]
    #[must_use]
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    /// Returns the wrapped connector.
    #[inline]
    #[must_use]
    pub fn connector(&self) -> &C {
        &self.connector
    }
}

#[async_trait]
impl<C: HttpConnector> ConnectionFactory for HttpConnectionFactory<C> {
    type Connection = HttpConnection;

    async fn create(
        &self,
        host: &HostDescription,
        authentication: &AuthenticationMethod,
    ) -> Result<HttpConnection> {
        let transport = self.connector.connect(host).await?;
        Ok(HttpConnection::new(host.clone(), transport, authentication))
    }

    async fn close(&self) {
        self.connector.close().await;
    }
}

// ============================================================================
// Tests
// ============================================================================
