use crate::error::{RenderError, Result};
use rayon::{ThreadPool, ThreadPoolBuilder};

pub const RASTER_THREADS_ENV: &str = "CARD_RASTER_THREADS";

/// Reads `CARD_RASTER_THREADS`; `Ok(None)` when unset.
pub(crate) fn parse_raster_threads_env() -> std::result::Result<Option<usize>, String> {
  match std::env::var(RASTER_THREADS_ENV) {
    Ok(raw) => {
      let raw = raw.trim();
      if raw.is_empty() {
        return Err(format!("{RASTER_THREADS_ENV} is set but empty"));
      }
      match raw.parse::<usize>() {
        Ok(threads) if threads > 0 => Ok(Some(threads)),
        _ => Err(format!(
          "{RASTER_THREADS_ENV}={raw:?} is not a valid positive integer"
        )),
      }
    }
    Err(std::env::VarError::NotPresent) => Ok(None),
    Err(err) => Err(format!("failed to read {RASTER_THREADS_ENV}: {err}")),
  }
}

fn default_threads() -> usize {
  std::thread::available_parallelism()
    .map(|n| n.get())
    .unwrap_or(1)
}

/// Dedicated Rayon pool for rasterization.
///
/// Raster work is CPU-bound; running it here keeps it off the caller's
/// threads and off the global Rayon pool.
#[derive(Debug)]
pub struct RasterPool {
  pool: ThreadPool,
  threads: usize,
}

impl RasterPool {
  /// Builds a pool with `threads` workers (all available cores when `None`).
  pub fn new(threads: Option<usize>) -> Result<Self> {
    let threads = threads.unwrap_or_else(default_threads).max(1);
    let pool = ThreadPoolBuilder::new()
      .num_threads(threads)
      .thread_name(|index| format!("card-raster-{index}"))
      .build()
      .map_err(|err| RenderError::PoolUnavailable {
        reason: err.to_string(),
      })?;
    log::debug!("raster pool started with {threads} threads");
    Ok(Self { pool, threads })
  }

  /// Builds a pool sized by `CARD_RASTER_THREADS`.
  pub fn from_env() -> Result<Self> {
    let threads = parse_raster_threads_env()
      .map_err(|reason| RenderError::PoolUnavailable { reason })?;
    Self::new(threads)
  }

  pub fn threads(&self) -> usize {
    self.threads
  }

  /// Runs `op` on a pool thread and waits for its result.
  pub fn install<R, F>(&self, op: F) -> R
  where
    F: FnOnce() -> R + Send,
    R: Send,
  {
    self.pool.install(op)
  }
}
