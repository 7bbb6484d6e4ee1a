//! Parsing many documents in parallel.
//!
//! Each document is parsed independently; the only thing shared between
//! workers is the read-only [`ParserConfig`].

use crate::ast::Document;
use crate::config::ParserConfig;
use crate::error::ParseError;
use rayon::prelude::*;

/// Parse every source, in parallel, with the same config.
///
/// `workers == 0` uses rayon's global pool. Output order matches input
/// order, and each result equals what [`crate::parse`] returns for that
/// source alone.
///
/// # Example
/// ```
/// use markloom::{parse_many, ParserConfig};
///
/// let docs = parse_many(&["# a", "*b*"], 2, &ParserConfig::default());
/// assert_eq!(docs.len(), 2);
/// assert!(docs.iter().all(Result::is_ok));
/// ```
pub fn parse_many<S>(
    sources: &[S],
    workers: usize,
    config: &ParserConfig,
) -> Vec<Result<Document, ParseError>>
where
    S: AsRef<str> + Sync,
{
    parse_many_with(sources, workers, |source| crate::parse(source, config))
}

/// Run `job` over every source in parallel, keeping input order.
///
/// Useful for fusing parse and render into one pass per document.
pub fn parse_many_with<S, T, F>(sources: &[S], workers: usize, job: F) -> Vec<T>
where
    S: AsRef<str> + Sync,
    T: Send,
    F: Fn(&str) -> T + Sync,
{
    log::debug!("batch: {} documents, {} workers", sources.len(), workers);

    let pool = if workers > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| log::warn!("batch: thread pool unavailable, using global pool: {e}"))
            .ok()
    } else {
        None
    };

    let run = || {
        sources
            .par_iter()
            .map(|source| job(source.as_ref()))
            .collect::<Vec<T>>()
    };

    match pool {
        Some(pool) => pool.install(run),
        None => run(),
    }
}
