#![deny(rust_2018_idioms)]
//! Serves an [`embsql::QueryEngine`] over tcp or unix sockets.

pub mod auth;
pub mod client;
mod config;
pub mod connection;
mod listener;
pub mod protocol;

use std::io::{self, BufReader};
use std::sync::atomic::{self, AtomicBool, AtomicU64};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use embsql::QueryEngine;
use embsql_core::{Error, Result};

pub use self::auth::{
    AuthError, Authenticator, Credentials, StaticAuthenticator, UserTableAuthenticator,
};
pub use self::config::{Config, Protocol};
pub use self::listener::{LocalAddr, Stream};
use self::listener::Listener;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

pub struct Server {
    listener: Listener,
    local_addr: LocalAddr,
    engine: Arc<dyn QueryEngine>,
    auth: Arc<dyn Authenticator>,
    shutdown: Arc<AtomicBool>,
    next_connection_id: AtomicU64,
}

impl Server {
    /// Validate `config` and bind its address.
    ///
    /// Fails with [`Error::Configuration`] if the protocol is unknown, the authentication policy is
    /// malformed, or the address cannot be bound. The engine is not used until a client connects.
    pub fn new(config: Config, engine: Arc<dyn QueryEngine>) -> Result<Self> {
        let protocol = config.protocol.parse::<Protocol>()?;
        config.auth.validate()?;

        let address = &config.address;
        let listener = Listener::bind(protocol, address).map_err(|err| {
            Error::Configuration(format!("failed to bind {protocol} address `{address}`: {err}"))
        })?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%protocol, address = %local_addr, "server bound");

        Ok(Self {
            listener,
            local_addr,
            engine,
            auth: config.auth,
            shutdown: Default::default(),
            next_connection_id: AtomicU64::new(1),
        })
    }

    #[inline]
    pub fn local_addr(&self) -> &LocalAddr {
        &self.local_addr
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle { flag: Arc::clone(&self.shutdown), addr: self.local_addr.clone() }
    }

    /// Accept connections until shut down through a [`ShutdownHandle`].
    ///
    /// Each connection is served on its own thread. Connections still open at shutdown are
    /// left to finish on their own.
    pub fn start(&self) -> Result<()> {
        tracing::info!(address = %self.local_addr, "server started");
        while !self.shutdown.load(atomic::Ordering::Acquire) {
            let (stream, peer) = match self.listener.accept() {
                Ok(accepted) => accepted,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to accept connection");
                    if let Some(backoff) = accept_backoff(&err) {
                        thread::sleep(backoff);
                    }
                    continue;
                }
            };

            if self.shutdown.load(atomic::Ordering::Acquire) {
                break;
            }

            let id = self.next_connection_id.fetch_add(1, atomic::Ordering::Relaxed);
            tracing::debug!(%peer, connection = id, "accepted connection");
            let engine = Arc::clone(&self.engine);
            let auth = Arc::clone(&self.auth);
            let spawned = thread::Builder::new().name(format!("embsql-conn-{id}")).spawn(
                move || {
                    if let Err(err) = serve_stream(stream, &*engine, &*auth, &peer) {
                        tracing::warn!(%peer, connection = id, error = %err, "connection failed");
                    }
                },
            );

            if let Err(err) = spawned {
                tracing::warn!(connection = id, error = %err, "failed to spawn connection thread");
            }
        }

        tracing::info!(address = %self.local_addr, "server stopped");
        Ok(())
    }
}

/// How long to pause after a failed `accept`. Failures that concern a single peer are retried
/// immediately; anything else (e.g. running out of file descriptors) would otherwise spin.
fn accept_backoff(err: &io::Error) -> Option<Duration> {
    match err.kind() {
        io::ErrorKind::Interrupted
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset => None,
        _ => Some(ACCEPT_BACKOFF),
    }
}

fn serve_stream(
    stream: Stream,
    engine: &dyn QueryEngine,
    auth: &dyn Authenticator,
    peer: &str,
) -> io::Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut writer = stream;
    connection::serve(&mut reader, &mut writer, engine, auth, peer)
}

/// Stops a running [`Server`] from another thread.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    addr: LocalAddr,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        if self.flag.swap(true, atomic::Ordering::AcqRel) {
            return;
        }

        tracing::info!(address = %self.addr, "shutting down");
        // wake the accept loop so it observes the flag
        if let Err(err) = self.addr.connect() {
            tracing::debug!(error = %err, "failed to wake the accept loop");
        }
    }

    #[inline]
    pub fn is_shutdown(&self) -> bool {
        self.flag.load(atomic::Ordering::Acquire)
    }
}
