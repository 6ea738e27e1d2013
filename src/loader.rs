use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::task::{AbortHandle, JoinHandle};

use crate::{error::LoadError, routing::HandlerId};

/// LoadedHandler
///
/// The result of fetching a lazily loaded handler: its identity plus whatever the loader
/// produced for it (a bundle name, a chunk URL...). Opaque to navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedHandler {
    pub id: HandlerId,
    pub bundle: String,
}

/// HandlerLoader
///
/// Fetches the code behind a lazy handler. Implementations may take as long as they need:
/// resolution never waits on them, and a superseded load is simply dropped.
#[async_trait]
pub trait HandlerLoader: Send + Sync {
    async fn load(&self, handler: &HandlerId) -> Result<LoadedHandler, LoadError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(LoadedHandler),
    /// A newer navigation started before this load finished; its result was discarded.
    Superseded,
    Failed(LoadError),
}

enum TicketState {
    Ready(LoadedHandler),
    Pending(JoinHandle<Result<LoadedHandler, LoadError>>),
}

/// LoadTicket
///
/// Handle on one load started by [`LazyLoader::begin`].
pub struct LoadTicket {
    handler: HandlerId,
    generation: u64,
    current: Arc<AtomicU64>,
    state: TicketState,
}

impl LoadTicket {
    pub fn handler(&self) -> &HandlerId {
        &self.handler
    }

    /// Whether no newer navigation has superseded this load yet.
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }

    pub async fn wait(self) -> LoadOutcome {
        let result = match self.state {
            TicketState::Ready(loaded) => Ok(loaded),
            TicketState::Pending(task) => match task.await {
                Ok(result) => result,
                Err(join_error) if join_error.is_cancelled() => return LoadOutcome::Superseded,
                Err(_) => Err(LoadError::Panicked(self.handler.to_string())),
            },
        };

        // Checked after completion: a result that lands late is still discarded.
        if self.current.load(Ordering::SeqCst) != self.generation {
            tracing::debug!(handler = %self.handler, "discarding superseded load");
            return LoadOutcome::Superseded;
        }

        match result {
            Ok(loaded) => LoadOutcome::Loaded(loaded),
            Err(error) => {
                tracing::warn!(handler = %self.handler, %error, "lazy load failed");
                LoadOutcome::Failed(error)
            }
        }
    }
}

/// LazyLoader
///
/// Runs lazy handler fetches on the tokio runtime with a last-resolution-wins policy: every
/// call to [`begin`](Self::begin) or [`supersede`](Self::supersede) aborts the load in flight
/// and invalidates its ticket. Completed loads are cached by handler identity.
///
/// `begin` spawns onto the current tokio runtime and must be called from within one.
pub struct LazyLoader {
    loader: Arc<dyn HandlerLoader>,
    cache: Arc<DashMap<HandlerId, LoadedHandler>>,
    generation: Arc<AtomicU64>,
    in_flight: Mutex<Option<AbortHandle>>,
}

impl LazyLoader {
    pub fn new(loader: Arc<dyn HandlerLoader>) -> Self {
        Self {
            loader,
            cache: Arc::new(DashMap::new()),
            generation: Arc::new(AtomicU64::new(0)),
            in_flight: Mutex::new(None),
        }
    }

    pub fn begin(&self, handler: HandlerId) -> LoadTicket {
        // Held until the new task is registered, so a concurrent `begin` always sees it.
        let mut in_flight = self.lock_in_flight();
        let generation = self.advance(&mut in_flight);

        let state = match self.cache.get(&handler) {
            Some(hit) => TicketState::Ready(hit.value().clone()),
            None => {
                let loader = Arc::clone(&self.loader);
                let cache = Arc::clone(&self.cache);
                let id = handler.clone();
                let task = tokio::spawn(async move {
                    let loaded = loader.load(&id).await?;
                    cache.insert(id, loaded.clone());
                    Ok(loaded)
                });
                *in_flight = Some(task.abort_handle());
                TicketState::Pending(task)
            }
        };
        drop(in_flight);

        tracing::debug!(%handler, generation, "lazy load started");
        LoadTicket {
            handler,
            generation,
            current: Arc::clone(&self.generation),
            state,
        }
    }

    /// Invalidates every outstanding ticket and aborts the load in flight. Returns the new
    /// generation.
    pub fn supersede(&self) -> u64 {
        let mut in_flight = self.lock_in_flight();
        self.advance(&mut in_flight)
    }

    pub fn cached(&self, handler: &HandlerId) -> Option<LoadedHandler> {
        self.cache.get(handler).map(|entry| entry.value().clone())
    }

    fn advance(&self, in_flight: &mut Option<AbortHandle>) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(previous) = in_flight.take() {
            previous.abort();
        }
        generation
    }

    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, Option<AbortHandle>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
