//! Bounded memo of computed grids, keyed by the shape fields that change
//! geometry. Palette edits never touch it.
//!
//! Each entry is a shared future, so concurrent requests for one uncached
//! shape wait on a single background computation. Entries still computing
//! are never evicted, and a computation is cancelled once every caller
//! waiting on it has dropped its future.

use crate::cancellation::CancelHandle;
use crate::computer::{create_grid_computer, GridComputer};
use futures::channel::oneshot;
use futures::future::{BoxFuture, FutureExt, Shared};
use mandart_core::{EngineConfig, Grid, GridKey, MandArtError, Result, ShapeParameters};
use std::collections::{hash_map, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// `None` means the computation failed or was cancelled; already logged.
type SharedGrid = Shared<BoxFuture<'static, Option<Arc<Grid>>>>;

struct Entry {
    grid: SharedGrid,
    cancel: CancelHandle,
    /// Callers currently awaiting `grid`. Only changed under the cache lock.
    waiters: Arc<AtomicUsize>,
}

impl Entry {
    fn is_pending(&self) -> bool {
        self.grid.peek().is_none()
    }
}

#[derive(Default)]
struct Entries {
    map: HashMap<GridKey, Entry>,
    /// Least recently used first.
    order: VecDeque<GridKey>,
}

impl Entries {
    fn touch(&mut self, key: GridKey) {
        if let Some(pos) = self.order.iter().position(|k| *k == key) {
            self.order.remove(pos);
        }
        self.order.push_back(key);
    }

    fn remove(&mut self, key: &GridKey) {
        self.map.remove(key);
        self.order.retain(|k| k != key);
    }

    /// Remove `key` only if it still maps to `grid`.
    fn remove_if_same(&mut self, key: &GridKey, grid: &SharedGrid) {
        if self
            .map
            .get(key)
            .is_some_and(|current| current.grid.ptr_eq(grid))
        {
            self.remove(key);
        }
    }

    /// Least recently used entry whose computation has finished.
    fn oldest_settled(&self) -> Option<GridKey> {
        self.order
            .iter()
            .copied()
            .find(|key| self.map.get(key).is_some_and(|entry| !entry.is_pending()))
    }
}

/// Registration of one caller on an entry. Dropping the last one before the
/// grid is ready cancels the computation.
struct Waiter<'a> {
    cache: &'a GridCache,
    key: GridKey,
    grid: SharedGrid,
    cancel: CancelHandle,
    waiters: Arc<AtomicUsize>,
}

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        let mut entries = self.cache.lock();
        let remaining = self.waiters.fetch_sub(1, Ordering::AcqRel) - 1;
        if remaining > 0 || self.grid.peek().is_some() {
            return;
        }
        log::debug!("No callers left for {:?}, cancelling", self.key);
        self.cancel.cancel();
        entries.remove_if_same(&self.key, &self.grid);
    }
}

pub struct GridCache {
    computer: Arc<dyn GridComputer>,
    capacity: usize,
    entries: Mutex<Entries>,
    computations: AtomicUsize,
}

impl GridCache {
    pub fn new(computer: Arc<dyn GridComputer>, capacity: usize) -> Self {
        Self {
            computer,
            capacity: capacity.max(1),
            entries: Mutex::new(Entries::default()),
            computations: AtomicUsize::new(0),
        }
    }

    /// Cache using the configured backend and capacity.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let computer = create_grid_computer(config.default_backend, config)?;
        Ok(Self::new(Arc::from(computer), config.cache_capacity))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn backend_id(&self) -> &'static str {
        self.computer.id()
    }

    /// Entries held, including ones still computing. May briefly exceed
    /// [`GridCache::capacity`] while more computations are in flight.
    pub fn len(&self) -> usize {
        self.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, shape: &ShapeParameters) -> bool {
        self.lock().map.contains_key(&shape.grid_key())
    }

    /// Forget every entry. Computations already awaited keep running for
    /// their callers.
    pub fn clear(&self) {
        let mut entries = self.lock();
        entries.map.clear();
        entries.order.clear();
    }

    /// Number of grid computations started so far.
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::Relaxed)
    }

    /// Return the grid for `shape`, computing it at most once per key.
    ///
    /// Invalid shapes are rejected before anything is cached. Dropping the
    /// returned future withdraws this caller; when no caller is left the
    /// computation is cancelled and the entry forgotten.
    pub async fn get_or_compute(&self, shape: &ShapeParameters) -> Result<Arc<Grid>> {
        shape.validate()?;
        let key = shape.grid_key();

        let waiter = {
            let mut entries = self.lock();
            let entry = match entries.map.entry(key) {
                hash_map::Entry::Occupied(slot) => {
                    log::debug!("Grid cache hit for {key:?}");
                    slot.into_mut()
                }
                hash_map::Entry::Vacant(slot) => {
                    log::debug!("Grid cache miss for {key:?}");
                    slot.insert(self.spawn_computation(shape.clone()))
                }
            };
            entry.waiters.fetch_add(1, Ordering::AcqRel);
            let waiter = Waiter {
                cache: self,
                key,
                grid: entry.grid.clone(),
                cancel: entry.cancel.clone(),
                waiters: Arc::clone(&entry.waiters),
            };
            entries.touch(key);
            self.evict_overflow(&mut entries);
            waiter
        };

        let outcome = waiter.grid.clone().await;
        let mut entries = self.lock();
        match outcome {
            Some(grid) => {
                self.evict_overflow(&mut entries);
                Ok(grid)
            }
            None => {
                entries.remove_if_same(&key, &waiter.grid);
                Err(MandArtError::ComputationAborted)
            }
        }
    }

    /// Blocking wrapper around [`GridCache::get_or_compute`].
    pub fn get_or_compute_blocking(&self, shape: &ShapeParameters) -> Result<Arc<Grid>> {
        pollster::block_on(self.get_or_compute(shape))
    }

    fn spawn_computation(&self, shape: ShapeParameters) -> Entry {
        self.computations.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        let cancel = CancelHandle::new();
        let checker = cancel.checker();
        let computer = Arc::clone(&self.computer);

        self.computer.spawn(Box::new(move || {
            let _ = tx.send(computer.compute(&shape, &checker));
        }));

        let grid = rx
            .map(|received| match received {
                Ok(Ok(grid)) => Some(Arc::new(grid)),
                Ok(Err(MandArtError::Cancelled)) => {
                    log::debug!("Grid computation cancelled");
                    None
                }
                Ok(Err(e)) => {
                    log::warn!("Grid computation failed: {e}");
                    None
                }
                Err(_) => {
                    log::warn!("Grid worker exited without a result");
                    None
                }
            })
            .boxed()
            .shared();

        Entry {
            grid,
            cancel,
            waiters: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Drop settled entries, oldest first, until back within capacity.
    /// Entries still computing are skipped so no key ever runs twice.
    fn evict_overflow(&self, entries: &mut Entries) {
        while entries.map.len() > self.capacity {
            let Some(oldest) = entries.oldest_settled() else {
                log::debug!(
                    "Grid cache over capacity ({} entries) while computations run",
                    entries.map.len()
                );
                break;
            };
            log::debug!("Evicting grid {oldest:?}");
            entries.remove(&oldest);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancellation::CancellationChecker;
    use crate::computer::SerialGridComputer;
    use crate::engine::compute_grid_serial;
    use std::time::Duration;

    /// Serial backend that holds each computation open for a while.
    struct Sleepy(Duration);

    impl GridComputer for Sleepy {
        fn id(&self) -> &'static str {
            "sleepy"
        }

        fn compute(
            &self,
            shape: &ShapeParameters,
            cancel: &dyn CancellationChecker,
        ) -> Result<Grid> {
            std::thread::sleep(self.0);
            compute_grid_serial(shape, cancel)
        }
    }

    fn sleepy_cache(capacity: usize) -> GridCache {
        GridCache::new(Arc::new(Sleepy(Duration::from_millis(50))), capacity)
    }

    fn shape(x_center: f64) -> ShapeParameters {
        ShapeParameters {
            image_width: 8,
            image_height: 6,
            iterations_max: 64,
            scale: 3.0,
            x_center,
            y_center: 0.0,
            theta: 0.0,
            r_sq_limit: 4.0,
            mand_power_real: 2,
            d_f_iter_min: 0.0,
        }
    }

    fn cache(capacity: usize) -> GridCache {
        GridCache::new(Arc::new(SerialGridComputer), capacity)
    }

    #[test]
    fn second_request_is_a_hit() {
        let cache = cache(4);
        let a = cache.get_or_compute_blocking(&shape(-0.5)).unwrap();
        let b = cache.get_or_compute_blocking(&shape(-0.5)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.computations(), 1);
    }

    #[test]
    fn oldest_entry_evicted_on_overflow() {
        let cache = cache(2);
        for x in [-0.5, -0.4, -0.3] {
            cache.get_or_compute_blocking(&shape(x)).unwrap();
        }
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&shape(-0.5)));
        assert!(cache.contains(&shape(-0.4)));
        assert!(cache.contains(&shape(-0.3)));
    }

    #[test]
    fn recently_used_entry_survives_eviction() {
        let cache = cache(2);
        cache.get_or_compute_blocking(&shape(-0.5)).unwrap();
        cache.get_or_compute_blocking(&shape(-0.4)).unwrap();
        cache.get_or_compute_blocking(&shape(-0.5)).unwrap();
        cache.get_or_compute_blocking(&shape(-0.3)).unwrap();
        assert!(cache.contains(&shape(-0.5)));
        assert!(!cache.contains(&shape(-0.4)));
    }

    #[test]
    fn invalid_shape_is_not_cached() {
        let cache = cache(2);
        let mut bad = shape(-0.5);
        bad.image_width = 0;
        assert!(cache.get_or_compute_blocking(&bad).is_err());
        assert!(cache.is_empty());
        assert_eq!(cache.computations(), 0);
    }

    #[test]
    fn clear_forces_recomputation() {
        let cache = cache(2);
        cache.get_or_compute_blocking(&shape(-0.5)).unwrap();
        cache.clear();
        assert!(cache.is_empty());
        cache.get_or_compute_blocking(&shape(-0.5)).unwrap();
        assert_eq!(cache.computations(), 2);
    }

    #[test]
    fn capacity_is_at_least_one() {
        assert_eq!(cache(0).capacity(), 1);
    }

    #[test]
    fn pending_entries_are_not_evicted() {
        let cache = sleepy_cache(1);
        let (first_shape, second_shape) = (shape(-0.5), shape(-0.4));
        let mut first = Box::pin(cache.get_or_compute(&first_shape));
        let mut second = Box::pin(cache.get_or_compute(&second_shape));
        assert!((&mut first).now_or_never().is_none());
        assert!((&mut second).now_or_never().is_none());

        // Both still computing, so the cache runs over capacity.
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&shape(-0.5)));

        pollster::block_on(first).unwrap();
        pollster::block_on(second).unwrap();
        assert_eq!(cache.computations(), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&shape(-0.4)));
    }

    #[test]
    fn dropping_the_only_caller_forgets_the_entry() {
        let cache = sleepy_cache(4);
        assert!(cache.get_or_compute(&shape(-0.5)).now_or_never().is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn remaining_caller_keeps_computation_alive() {
        let cache = sleepy_cache(4);
        let (first_shape, second_shape) = (shape(-0.5), shape(-0.5));
        let mut first = Box::pin(cache.get_or_compute(&first_shape));
        let mut second = Box::pin(cache.get_or_compute(&second_shape));
        assert!((&mut first).now_or_never().is_none());
        assert!((&mut second).now_or_never().is_none());
        drop(first);

        assert!(cache.contains(&shape(-0.5)));
        assert!(pollster::block_on(second).is_ok());
        assert_eq!(cache.computations(), 1);
    }
}
