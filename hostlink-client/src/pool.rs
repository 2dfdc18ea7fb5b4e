//! Bounded connection pool.
//!
//! The pool owns every idle [`ConnectionCore`]. `acquire` moves a core out of
//! the idle set into a [`ConnectionHandle`]; the handle gives it back on
//! `close` or drop. A core is never in the idle set and in a handle at the
//! same time.

use crate::config::{ClientConfig, ExhaustedPolicy, PoolConfig};
use crate::connection::ConnectionCore;
use crate::error::ClientError;
use crate::handle::ConnectionHandle;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

/// Creates physical sessions for the pool.
pub trait Connector: Send + Sync {
    fn connect(&self) -> Result<ConnectionCore, ClientError>;
}

/// Connects over TCP (and TLS when configured).
#[derive(Debug, Clone)]
pub struct TcpConnector {
    config: ClientConfig,
}

impl TcpConnector {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

impl Connector for TcpConnector {
    fn connect(&self) -> Result<ConnectionCore, ClientError> {
        ConnectionCore::connect(&self.config)
    }
}

/// Point-in-time pool counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub idle: usize,
    /// Checked out or being opened.
    pub busy: usize,
    pub max: usize,
    pub closed: bool,
}

impl PoolStatus {
    pub fn total(&self) -> usize {
        self.idle + self.busy
    }
}

struct PoolState {
    idle: VecDeque<ConnectionCore>,
    busy: usize,
    closed: bool,
    next_lease: u64,
}

pub(crate) struct PoolShared {
    config: PoolConfig,
    connector: Box<dyn Connector>,
    state: Mutex<PoolState>,
    available: Condvar,
}

impl PoolShared {
    /// Takes a core back from a handle.
    ///
    /// Usable cores are rolled back and returned to the idle set; dropped
    /// cores, or cores whose rollback fails, are discarded.
    pub(crate) fn release(&self, mut core: ConnectionCore) {
        let reusable = core.is_usable()
            && match core.rollback() {
                Ok(_) => true,
                Err(e) => {
                    tracing::warn!("Discarding session {}: rollback failed: {}", core.id(), e);
                    false
                }
            };
        if !core.is_usable() {
            tracing::warn!("Discarding dropped session {}", core.id());
        }
        core.reset_session();

        let discard = {
            let mut state = self.state.lock();
            state.busy -= 1;
            if reusable && !state.closed {
                state.idle.push_back(core);
                None
            } else {
                Some(core)
            }
        };
        self.available.notify_one();

        if let Some(mut core) = discard {
            core.close();
        }
    }
}

/// A bounded pool of host sessions. Cloning shares the pool.
#[derive(Clone)]
pub struct ConnectionPool {
    shared: Arc<PoolShared>,
}

impl ConnectionPool {
    /// Creates a pool that connects with `config`. No session is opened yet.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let pool = config.pool.clone();
        Self::with_connector(pool, TcpConnector::new(config))
    }

    /// Fails with [`ClientError::Config`] when `config` cannot hold a session.
    pub fn with_connector(
        config: PoolConfig,
        connector: impl Connector + 'static,
    ) -> Result<Self, ClientError> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(PoolShared {
                config,
                connector: Box::new(connector),
                state: Mutex::new(PoolState {
                    idle: VecDeque::new(),
                    busy: 0,
                    closed: false,
                    next_lease: 1,
                }),
                available: Condvar::new(),
            }),
        })
    }

    pub fn config(&self) -> &PoolConfig {
        &self.shared.config
    }

    /// Checks out a session.
    ///
    /// Reuses an idle core, else opens a new one below `max_connections`,
    /// else blocks or fails according to the exhausted policy.
    pub fn acquire(&self) -> Result<ConnectionHandle, ClientError> {
        let shared = &self.shared;
        let timeout = shared.config.acquire_timeout();
        let deadline = Instant::now() + timeout;
        let mut state = shared.state.lock();

        loop {
            if state.closed {
                return Err(ClientError::PoolClosed);
            }

            while let Some(core) = state.idle.pop_front() {
                if !core.is_usable() {
                    tracing::warn!("Discarding unusable idle session {}", core.id());
                    continue;
                }
                state.busy += 1;
                let lease = state.next_lease;
                state.next_lease += 1;
                tracing::debug!("Lease {}: reusing session {}", lease, core.id());
                return Ok(ConnectionHandle::new(core, lease, self.shared.clone()));
            }

            if state.busy < shared.config.max_connections {
                // Reserve the slot, then connect without holding the lock
                state.busy += 1;
                let lease = state.next_lease;
                state.next_lease += 1;
                drop(state);

                return match shared.connector.connect() {
                    Ok(core) => {
                        tracing::info!("Lease {}: opened session {}", lease, core.id());
                        Ok(ConnectionHandle::new(core, lease, self.shared.clone()))
                    }
                    Err(e) => {
                        shared.state.lock().busy -= 1;
                        shared.available.notify_one();
                        Err(e)
                    }
                };
            }

            match shared.config.exhausted {
                ExhaustedPolicy::Fail => {
                    return Err(ClientError::PoolExhausted {
                        max: shared.config.max_connections,
                    });
                }
                ExhaustedPolicy::Block => {
                    if shared
                        .available
                        .wait_until(&mut state, deadline)
                        .timed_out()
                    {
                        return Err(ClientError::PoolTimeout(timeout));
                    }
                }
            }
        }
    }

    pub fn status(&self) -> PoolStatus {
        let state = self.shared.state.lock();
        PoolStatus {
            idle: state.idle.len(),
            busy: state.busy,
            max: self.shared.config.max_connections,
            closed: state.closed,
        }
    }

    /// Opens sessions until `min_idle` are idle. Returns how many were opened.
    pub fn warm_up(&self) -> Result<usize, ClientError> {
        let mut opened = 0;
        loop {
            {
                let mut state = self.shared.state.lock();
                if state.closed {
                    return Err(ClientError::PoolClosed);
                }
                let total = state.idle.len() + state.busy;
                if state.idle.len() >= self.shared.config.min_idle
                    || total >= self.shared.config.max_connections
                {
                    return Ok(opened);
                }
                state.busy += 1;
            }

            let result = self.shared.connector.connect();
            let mut state = self.shared.state.lock();
            state.busy -= 1;
            match result {
                Ok(core) => {
                    state.idle.push_back(core);
                    opened += 1;
                    drop(state);
                    self.shared.available.notify_one();
                }
                Err(e) => {
                    drop(state);
                    self.shared.available.notify_one();
                    return Err(e);
                }
            }
        }
    }

    /// Closes idle sessions above `min_idle`. Returns how many were closed.
    pub fn prune_idle(&self) -> usize {
        let surplus: Vec<ConnectionCore> = {
            let mut state = self.shared.state.lock();
            let keep = self.shared.config.min_idle;
            let excess = state.idle.len().saturating_sub(keep);
            state.idle.drain(..excess).collect()
        };
        let count = surplus.len();
        for mut core in surplus {
            core.close();
        }
        if count > 0 {
            tracing::info!("Pruned {} idle sessions", count);
        }
        count
    }

    /// Closes every idle session; later acquires fail with `PoolClosed`.
    ///
    /// Sessions still checked out are closed when their handles release them.
    pub fn shutdown(&self) {
        let idle: Vec<ConnectionCore> = {
            let mut state = self.shared.state.lock();
            state.closed = true;
            state.idle.drain(..).collect()
        };
        self.shared.available.notify_all();
        tracing::info!("Pool shut down, closing {} idle sessions", idle.len());
        for mut core in idle {
            core.close();
        }
    }
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("config", &self.shared.config)
            .field("status", &self.status())
            .finish()
    }
}
