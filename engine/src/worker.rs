//! Fire-and-forget handler execution.
//!
//! Matched handlers never run on the dispatching thread. They are handed to
//! a [`WorkerPool`] and the dispatcher returns [`DispatchStatus::Accepted`]
//! straight away. Panics inside handlers are caught by the pool, logged,
//! and otherwise ignored.
//!
//! The pool has no upper bound. Resident rayon workers take handlers while
//! one is idle; once all of them are busy, every further handler gets its
//! own overflow thread, so a blocked handler never delays another one.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use command_tree_core::{CommandContext, Handler};
use tracing::{debug, error};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};

/// Status returned to the grammar engine for every dispatched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStatus {
    /// The handler was submitted; it may still be running.
    Accepted,
}

impl DispatchStatus {
    /// Numeric status code (`1`, a single success).
    pub fn code(self) -> i32 {
        match self {
            Self::Accepted => 1,
        }
    }
}

/// Grow-as-needed thread pool running command handlers.
#[derive(Debug)]
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    busy: Arc<AtomicUsize>,
    overflow: AtomicUsize,
    thread_name: String,
}

impl WorkerPool {
    /// Builds a pool from the engine configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::WorkerPool`] if the threads cannot be spawned.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let prefix = config.thread_name.clone();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_threads)
            .thread_name(move |index| format!("{prefix}-{index}"))
            .panic_handler(log_panic)
            .build()
            .map_err(|e| EngineError::WorkerPool(e.to_string()))?;

        debug!(threads = pool.current_num_threads(), "Worker pool started");
        Ok(Self {
            pool,
            busy: Arc::new(AtomicUsize::new(0)),
            overflow: AtomicUsize::new(0),
            thread_name: config.thread_name.clone(),
        })
    }

    /// Number of resident worker threads.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Number of handlers currently running on resident workers.
    pub fn busy(&self) -> usize {
        self.busy.load(Ordering::Acquire)
    }

    /// Runs `handler` on a worker thread and returns without waiting.
    ///
    /// Uses an idle resident worker when there is one and starts an
    /// overflow thread otherwise.
    pub fn submit(&self, handler: Handler, context: CommandContext) -> DispatchStatus {
        if self.reserve_worker() {
            let slot = WorkerSlot(Arc::clone(&self.busy));
            self.pool.spawn(move || {
                let _slot = slot;
                handler.invoke(&context);
            });
        } else {
            self.spawn_overflow(handler, context);
        }
        DispatchStatus::Accepted
    }

    fn reserve_worker(&self) -> bool {
        let limit = self.threads();
        self.busy
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |busy| {
                (busy < limit).then_some(busy + 1)
            })
            .is_ok()
    }

    fn spawn_overflow(&self, handler: Handler, context: CommandContext) {
        let index = self.overflow.fetch_add(1, Ordering::Relaxed);
        let name = format!("{}-overflow-{index}", self.thread_name);
        debug!(thread = %name, busy = self.busy(), "All workers busy, starting overflow thread");

        let spawned = thread::Builder::new().name(name).spawn(move || {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| handler.invoke(&context))) {
                log_panic(payload);
            }
        });
        if let Err(err) = spawned {
            error!(error = %err, "Failed to start overflow thread; handler dropped");
        }
    }
}

/// Releases a reserved resident worker when the handler finishes or panics.
struct WorkerSlot(Arc<AtomicUsize>);

impl Drop for WorkerSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// A handler bound to a worker pool.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, mpsc};
///
/// use command_tree_core::{CommandContext, Handler, StaticCaller};
/// use command_tree_engine::{DispatchStatus, EngineConfig, Invocable, WorkerPool};
///
/// let pool = Arc::new(WorkerPool::new(&EngineConfig::default()).unwrap());
/// let (tx, rx) = mpsc::channel();
/// let handler = Handler::new(move |ctx: &CommandContext| {
///     tx.send(ctx.input().to_string()).unwrap();
/// });
///
/// let invocable = Invocable::wrap(&pool, handler);
/// let ctx = CommandContext::new(Arc::new(StaticCaller::console()), "ping");
/// assert_eq!(invocable.invoke(ctx), DispatchStatus::Accepted);
/// assert_eq!(rx.recv().unwrap(), "ping");
/// ```
#[derive(Debug, Clone)]
pub struct Invocable {
    pool: Arc<WorkerPool>,
    handler: Handler,
}

impl Invocable {
    pub fn wrap(pool: &Arc<WorkerPool>, handler: Handler) -> Self {
        Self {
            pool: Arc::clone(pool),
            handler,
        }
    }

    pub fn invoke(&self, context: CommandContext) -> DispatchStatus {
        self.pool.submit(self.handler.clone(), context)
    }
}

fn log_panic(payload: Box<dyn Any + Send>) {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    error!(panic = %message, "Command handler panicked");
}
