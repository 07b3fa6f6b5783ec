//! Trailing-edge debouncing of live search requests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Delays a call and lets only the latest call per key proceed.
///
/// Each browser session gets its own key, so one user typing never
/// suppresses another user's search.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    /// Source of generation numbers, unique across keys.
    counter: AtomicU64,
    generations: Mutex<HashMap<String, u64>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            counter: AtomicU64::new(0),
            generations: Mutex::new(HashMap::new()),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    fn bump(&self, key: &str) -> u64 {
        let generation = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        if let Ok(mut generations) = self.generations.lock() {
            generations.insert(key.to_string(), generation);
        }
        generation
    }

    /// Waits out the delay. Returns `false` when a newer call for `key`
    /// arrived in the meantime, in which case the caller skips its work.
    pub async fn settle(&self, key: &str) -> bool {
        let ticket = Ticket {
            debouncer: self,
            key,
            generation: self.bump(key),
        };
        tokio::time::sleep(self.delay).await;
        ticket.is_latest()
    }
}

/// One pending `settle` call. Dropping the newest ticket for a key, whether
/// it finished or was cancelled, removes the key's entry.
struct Ticket<'a> {
    debouncer: &'a Debouncer,
    key: &'a str,
    generation: u64,
}

impl Ticket<'_> {
    fn is_latest(&self) -> bool {
        let Ok(generations) = self.debouncer.generations.lock() else {
            return true;
        };
        generations
            .get(self.key)
            .is_none_or(|current| *current == self.generation)
    }
}

impl Drop for Ticket<'_> {
    fn drop(&mut self) {
        let Ok(mut generations) = self.debouncer.generations.lock() else {
            return;
        };
        if generations.get(self.key) == Some(&self.generation) {
            generations.remove(self.key);
        }
    }
}
