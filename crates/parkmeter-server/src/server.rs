// Copyright 2025 Parkmeter Contributors
// SPDX-License-Identifier: Apache-2.0

//! Accept loop
//!
//! One thread accepts connections and spawns an independent worker thread for
//! each. Workers only meet at the session store's writer lock and, briefly,
//! the shared pricing lock.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info, warn};

use crate::connection::serve_connection;
use crate::context::ServerContext;
use crate::error::{Result, ServerError};

/// Bound, not yet accepting
pub struct IngestServer {
    ctx: Arc<ServerContext>,
    listener: TcpListener,
    local_addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    connections: Arc<AtomicU64>,
}

impl IngestServer {
    /// Bind to the configured `server.host:server.port`
    pub fn bind(ctx: Arc<ServerContext>) -> Result<Self> {
        let addr = ctx.config().server.bind_address();
        let listener = TcpListener::bind(&addr).map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
        let local_addr = listener.local_addr()?;
        info!("Parking event server listening on {}", local_addr);

        Ok(Self {
            ctx,
            listener,
            local_addr,
            shutdown: Arc::new(AtomicBool::new(false)),
            connections: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn shutdown_trigger(&self) -> ShutdownTrigger {
        ShutdownTrigger {
            flag: Arc::clone(&self.shutdown),
            wake_addr: wake_address(self.local_addr),
        }
    }

    /// Accept until shut down, on the calling thread
    pub fn run(&self) {
        for stream in self.listener.incoming() {
            if self.shutdown.load(Ordering::Acquire) {
                break;
            }
            match stream {
                Ok(stream) => self.dispatch(stream),
                Err(e) => warn!("Accept failed: {}", e),
            }
        }
        info!(
            "Parking event server on {} stopped after {} connections",
            self.local_addr,
            self.connections.load(Ordering::Relaxed)
        );
    }

    /// Run the accept loop on its own thread
    pub fn spawn(self) -> Result<ServerHandle> {
        let local_addr = self.local_addr;
        let trigger = self.shutdown_trigger();
        let connections = Arc::clone(&self.connections);
        let thread = thread::Builder::new()
            .name("parkmeter-accept".to_string())
            .spawn(move || self.run())?;

        Ok(ServerHandle {
            local_addr,
            trigger,
            connections,
            thread: Some(thread),
        })
    }

    fn dispatch(&self, stream: TcpStream) {
        let peer = match stream.peer_addr() {
            Ok(peer) => peer,
            Err(e) => {
                warn!("Dropping connection without peer address: {}", e);
                return;
            }
        };
        let number = self.connections.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("Accepted connection #{} from {}", number, peer);

        let ctx = Arc::clone(&self.ctx);
        let spawned = thread::Builder::new()
            .name(format!("parkmeter-conn-{}", number))
            .spawn(move || {
                serve_connection(&ctx, stream, peer);
            });
        if let Err(e) = spawned {
            error!("Failed to spawn worker for {}: {}", peer, e);
        }
    }
}

/// Stops an accept loop from any thread (signal handlers included)
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    flag: Arc<AtomicBool>,
    wake_addr: SocketAddr,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        if self.flag.swap(true, Ordering::AcqRel) {
            return;
        }
        // Unblock accept() with a throwaway connection
        if let Err(e) = TcpStream::connect(self.wake_addr) {
            debug!("Wake-up connect to {} failed: {}", self.wake_addr, e);
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Running accept loop; stops and joins on drop
///
/// Connection workers already running are left to finish on their own.
pub struct ServerHandle {
    local_addr: SocketAddr,
    trigger: ShutdownTrigger,
    connections: Arc<AtomicU64>,
    thread: Option<JoinHandle<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn shutdown_trigger(&self) -> ShutdownTrigger {
        self.trigger.clone()
    }

    /// Connections accepted so far
    pub fn connections(&self) -> u64 {
        self.connections.load(Ordering::Relaxed)
    }

    /// Block until the accept loop ends (after a trigger elsewhere)
    pub fn join(mut self) {
        self.join_thread();
    }

    /// Stop accepting and wait for the accept thread
    pub fn shutdown(mut self) {
        self.trigger.trigger();
        self.join_thread();
    }

    fn join_thread(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Accept thread for {} panicked", self.local_addr);
            }
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.trigger.trigger();
            self.join_thread();
        }
    }
}

fn wake_address(local_addr: SocketAddr) -> SocketAddr {
    let ip = match local_addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    SocketAddr::new(ip, local_addr.port())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wake_address_for_wildcard_bind() {
        let wildcard: SocketAddr = "0.0.0.0:7000".parse().unwrap();
        assert_eq!(wake_address(wildcard), "127.0.0.1:7000".parse().unwrap());

        let wildcard6: SocketAddr = "[::]:7000".parse().unwrap();
        assert_eq!(wake_address(wildcard6), "[::1]:7000".parse().unwrap());

        let specific: SocketAddr = "10.1.2.3:7000".parse().unwrap();
        assert_eq!(wake_address(specific), specific);
    }
}
