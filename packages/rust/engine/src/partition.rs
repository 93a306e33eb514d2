//! Page-range partitioning across the worker pool.

use entidades_shared::types::WorkRange;

/// Split `[1, total_pages]` into one contiguous range per worker.
///
/// Ranges are gap-free and non-overlapping, sized by ceiling division. When
/// the pool is larger than the page count, trailing workers receive empty
/// ranges (`start_page > end_page`) and contribute zero work — callers must
/// treat that as legitimate, not as a failure.
///
/// Both arguments must be at least 1; [`RunConfig::validate`] enforces this
/// before any partitioning happens.
///
/// [`RunConfig::validate`]: entidades_shared::config::RunConfig::validate
pub fn partition(total_pages: u32, worker_count: u32) -> Vec<WorkRange> {
    let per_worker = total_pages.div_ceil(worker_count);

    (0..worker_count)
        .map(|i| WorkRange {
            worker_id: i + 1,
            start_page: i * per_worker + 1,
            end_page: ((i + 1) * per_worker).min(total_pages),
        })
        .collect()
}
