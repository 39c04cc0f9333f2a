//! Swappable grid backends behind one trait.

use crate::cancellation::CancellationChecker;
use crate::engine::{compute_grid_parallel, compute_grid_serial};
use mandart_core::{EngineConfig, Grid, MandArtError, Result, ShapeParameters};

/// Computes iteration grids. Every backend must return bit-identical grids
/// for the same shape.
pub trait GridComputer: Send + Sync {
    /// Backend identifier, as accepted by [`create_grid_computer`].
    fn id(&self) -> &'static str;

    fn compute(&self, shape: &ShapeParameters, cancel: &dyn CancellationChecker) -> Result<Grid>;

    /// Run a detached job on this backend's threads. Defaults to rayon's
    /// global pool.
    fn spawn(&self, job: Box<dyn FnOnce() + Send + 'static>) {
        rayon::spawn(job);
    }
}

/// Reference backend: one thread, row by row.
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialGridComputer;

impl GridComputer for SerialGridComputer {
    fn id(&self) -> &'static str {
        "serial"
    }

    fn compute(&self, shape: &ShapeParameters, cancel: &dyn CancellationChecker) -> Result<Grid> {
        compute_grid_serial(shape, cancel)
    }
}

/// Rows spread over a dedicated rayon pool.
pub struct ParallelGridComputer {
    pool: rayon::ThreadPool,
}

impl ParallelGridComputer {
    pub fn with_threads(num_threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("mandart-rows-{i}"))
            .build()
            .map_err(|e| MandArtError::ThreadPool(e.to_string()))?;
        Ok(Self { pool })
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl GridComputer for ParallelGridComputer {
    fn id(&self) -> &'static str {
        "parallel"
    }

    fn compute(&self, shape: &ShapeParameters, cancel: &dyn CancellationChecker) -> Result<Grid> {
        self.pool.install(|| compute_grid_parallel(shape, cancel))
    }

    fn spawn(&self, job: Box<dyn FnOnce() + Send + 'static>) {
        self.pool.spawn(job);
    }
}

/// Create a grid backend by ID. This is the only place a backend is chosen.
pub fn create_grid_computer(
    backend_id: &str,
    config: &EngineConfig,
) -> Result<Box<dyn GridComputer>> {
    match backend_id {
        "serial" => {
            log::info!("Using serial grid backend");
            Ok(Box::new(SerialGridComputer))
        }
        "parallel" => {
            let available = std::thread::available_parallelism().map_or(1, |n| n.get());
            let threads = config.resolved_worker_count(available);
            log::info!("Using parallel grid backend with {threads} threads");
            Ok(Box::new(ParallelGridComputer::with_threads(threads)?))
        }
        other => Err(MandArtError::UnknownBackend(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancellation::{CancelHandle, NeverCancel};
    use mandart_core::{default_config, get_config};

    fn shape() -> ShapeParameters {
        ShapeParameters {
            image_width: 40,
            image_height: 30,
            iterations_max: 300,
            scale: 12.0,
            x_center: -0.6,
            y_center: 0.1,
            theta: 15.0,
            r_sq_limit: 16.0,
            mand_power_real: 2,
            d_f_iter_min: 0.0,
        }
    }

    #[test]
    fn factory_builds_known_backends() {
        let config = default_config();
        assert_eq!(create_grid_computer("serial", config).unwrap().id(), "serial");
        assert_eq!(
            create_grid_computer("parallel", config).unwrap().id(),
            "parallel"
        );
    }

    #[test]
    fn factory_rejects_unknown_backend() {
        let result = create_grid_computer("wasm", default_config());
        assert!(matches!(result, Err(MandArtError::UnknownBackend(id)) if id == "wasm"));
    }

    #[test]
    fn parallel_pool_honours_thread_count() {
        let computer = ParallelGridComputer::with_threads(3).unwrap();
        assert_eq!(computer.num_threads(), 3);
    }

    #[test]
    fn backends_agree_bit_for_bit() {
        let config = get_config("single_threaded").unwrap();
        let serial = create_grid_computer(config.default_backend, config).unwrap();
        let parallel = ParallelGridComputer::with_threads(4).unwrap();

        let a = serial.compute(&shape(), &NeverCancel).unwrap();
        let b = parallel.compute(&shape(), &NeverCancel).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn parallel_backend_observes_cancellation() {
        let computer = ParallelGridComputer::with_threads(2).unwrap();
        let handle = CancelHandle::new();
        handle.cancel();
        let result = computer.compute(&shape(), &handle.checker());
        assert!(matches!(result, Err(MandArtError::Cancelled)));
    }

    #[test]
    fn parallel_spawn_runs_on_its_own_pool() {
        let computer = ParallelGridComputer::with_threads(2).unwrap();
        let (tx, rx) = std::sync::mpsc::channel();
        computer.spawn(Box::new(move || {
            let name = std::thread::current().name().map(str::to_owned);
            let _ = tx.send(name);
        }));
        let name = rx.recv().unwrap().unwrap();
        assert!(name.starts_with("mandart-rows-"), "ran on {name}");
    }
}
