/// Concurrency management for Setting Miner.
/// Sizes the worker pool used for per-file extraction.

use anyhow::Result;
use tracing::info;

/// Worker count for a `jobs` setting: `0` picks half the cores (minimum 1),
/// leaving capacity for the parsing service that usually runs on the same host.
pub fn resolve_workers(jobs: usize) -> usize {
    if jobs > 0 {
        return jobs;
    }
    std::cmp::max(1, num_cpus::get() / 2)
}

/// Build a dedicated rayon pool for one extraction run.
pub fn build_pool(workers: usize) -> Result<rayon::ThreadPool> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|index| format!("setting-miner-{}", index))
        .build()?;

    info!(
        workers,
        cores = num_cpus::get(),
        "initialized extraction thread pool"
    );

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_workers() {
        assert_eq!(resolve_workers(3), 3);
        assert!(resolve_workers(0) >= 1);
    }

    #[test]
    fn test_build_pool_uses_requested_workers() {
        let pool = build_pool(2).unwrap();
        assert_eq!(pool.current_num_threads(), 2);
    }
}
