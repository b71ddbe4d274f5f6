/*!
 # Named timers

 One-shot and repeating tasks keyed by name, backed by tokio. Scheduling a
 name that is already pending replaces it. Cancelling is idempotent.
*/

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::{debug, instrument, trace};
use uuid::Uuid;

use crate::{Error, Result};

/// Source of wall clock time for scheduling decisions
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        *self.now.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Bookkeeping for one pending timer
struct TimerEntry {
    /// Distinguishes this timer from a later one with the same name
    id: Uuid,
    /// Next time the task runs
    deadline: DateTime<Utc>,
    handle: AbortHandle,
}

/// Tokio-backed timers addressed by name
#[derive(Clone)]
pub struct NamedTimers {
    clock: Arc<dyn Clock>,
    timers: Arc<Mutex<HashMap<String, TimerEntry>>>,
}

impl fmt::Debug for NamedTimers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedTimers")
            .field("pending", &self.pending_names())
            .finish()
    }
}

impl NamedTimers {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            timers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    fn runtime() -> Result<Handle> {
        Handle::try_current()
            .map_err(|e| Error::General(format!("timers need a tokio runtime: {e}")))
    }

    /// Runs `task` once at `deadline`, replacing any timer called `name`
    ///
    /// A deadline in the past fires immediately.
    #[instrument(skip(self, task))]
    pub fn schedule_at<F>(&self, name: &str, deadline: DateTime<Utc>, task: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let runtime = Self::runtime()?;
        self.cancel(name);

        let delay = (deadline - self.clock.now())
            .to_std()
            .unwrap_or(Duration::ZERO);
        let id = Uuid::new_v4();
        let timers = Arc::clone(&self.timers);
        let key = name.to_string();

        // Hold the map while spawning so the task cannot look for its entry before it exists
        let mut map = self.timers.lock();
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut map = timers.lock();
                if map.get(&key).is_some_and(|entry| entry.id == id) {
                    map.remove(&key);
                }
            }
            trace!("Timer {} fired", key);
            task.await;
        });
        map.insert(
            name.to_string(),
            TimerEntry {
                id,
                deadline,
                handle: handle.abort_handle(),
            },
        );

        debug!("Scheduled {} at {} (in {:?})", name, deadline, delay);
        Ok(())
    }

    /// Runs `task` after `initial_delay` and then every `period` until cancelled
    #[instrument(skip(self, task))]
    pub fn schedule_repeating<F, Fut>(
        &self,
        name: &str,
        initial_delay: Duration,
        period: Duration,
        task: F,
    ) -> Result<()>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let runtime = Self::runtime()?;
        self.cancel(name);

        let id = Uuid::new_v4();
        let timers = Arc::clone(&self.timers);
        let clock = Arc::clone(&self.clock);
        let key = name.to_string();
        let step = |d: Duration| chrono::Duration::from_std(d).unwrap_or(chrono::Duration::zero());
        let deadline = self.clock.now() + step(initial_delay);

        let mut map = self.timers.lock();
        let handle = runtime.spawn(async move {
            tokio::time::sleep(initial_delay).await;
            loop {
                trace!("Repeating timer {} fired", key);
                task().await;
                if let Some(entry) = timers.lock().get_mut(&key).filter(|e| e.id == id) {
                    entry.deadline = clock.now() + step(period);
                }
                tokio::time::sleep(period).await;
            }
        });
        map.insert(
            name.to_string(),
            TimerEntry {
                id,
                deadline,
                handle: handle.abort_handle(),
            },
        );

        debug!("Scheduled {} every {:?} starting in {:?}", name, period, initial_delay);
        Ok(())
    }

    /// Cancels the timer called `name`. Returns whether one was pending.
    pub fn cancel(&self, name: &str) -> bool {
        match self.timers.lock().remove(name) {
            Some(entry) => {
                entry.handle.abort();
                debug!("Cancelled timer {}", name);
                true
            }
            None => {
                trace!("No timer {} to cancel", name);
                false
            }
        }
    }

    pub fn cancel_all(&self) {
        let drained: Vec<(String, TimerEntry)> = self.timers.lock().drain().collect();
        for (name, entry) in drained {
            entry.handle.abort();
            debug!("Cancelled timer {}", name);
        }
    }

    pub fn is_pending(&self, name: &str) -> bool {
        self.timers.lock().contains_key(name)
    }

    pub fn deadline(&self, name: &str) -> Option<DateTime<Utc>> {
        self.timers.lock().get(name).map(|entry| entry.deadline)
    }

    /// Names of pending timers, sorted
    pub fn pending_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.timers.lock().keys().cloned().collect();
        names.sort();
        names
    }
}
