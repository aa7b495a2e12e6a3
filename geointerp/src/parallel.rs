//! Deterministic range-partitioned worker pool.
//!
//! Every parallel entry point of this crate takes a `num_threads` argument:
//! `0` selects all logical CPUs, `1` runs inline without a pool, any other
//! value bounds the pool size. The output index space is split into one
//! contiguous chunk per worker, so each output element is computed by exactly
//! one worker with the same arithmetic sequence regardless of the pool size.

use crate::error::{Error, Result};
use rayon::prelude::*;
use std::thread;

/// Resolves a user-supplied thread count, mapping `0` to the number of
/// logical CPUs of the host.
#[must_use]
pub fn num_threads(requested: usize) -> usize {
    if requested == 0 {
        thread::available_parallelism().map_or(1, usize::from)
    } else {
        requested
    }
}

/// Splits `out` into one contiguous chunk per worker and runs `f` on each
/// chunk. `f` receives the offset of its chunk within `out` and the chunk
/// itself. The call returns after all workers joined; if any worker failed,
/// the last captured error is returned and the output must be discarded.
///
/// # Errors
///
/// Returns any error produced by `f`, or [`Error::ThreadPool`] when the pool
/// cannot be created.
pub fn dispatch<T, F>(out: &mut [T], requested: usize, f: F) -> Result<()>
where
    T: Send,
    F: Fn(usize, &mut [T]) -> Result<()> + Sync,
{
    let threads = num_threads(requested);

    if threads == 1 || out.len() <= 1 {
        return f(0, out);
    }

    let chunk_size = out.len().div_ceil(threads).max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|err| Error::ThreadPool(err.to_string()))?;

    pool.install(|| {
        out.par_chunks_mut(chunk_size)
            .enumerate()
            .map(|(chunk, slice)| f(chunk * chunk_size, slice))
            .reduce(|| Ok(()), |acc, result| result.and(acc))
    })
}

/// Runs `f` once per worker over a contiguous sub-range of `[0, len)` and
/// returns the per-worker states in range order. Used by the streaming
/// aggregators, where workers fill private accumulators that the driver
/// merges after the join point; with a fixed number of workers the reduction
/// shape, and hence the result, is reproducible.
///
/// # Errors
///
/// Returns any error produced by `f`, or [`Error::ThreadPool`] when the pool
/// cannot be created.
pub fn fold<S, F>(len: usize, requested: usize, f: F) -> Result<Vec<S>>
where
    S: Send,
    F: Fn(std::ops::Range<usize>) -> Result<S> + Sync,
{
    let threads = num_threads(requested);

    if threads == 1 || len <= 1 {
        return Ok(vec![f(0..len)?]);
    }

    let chunk_size = len.div_ceil(threads).max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|err| Error::ThreadPool(err.to_string()))?;

    pool.install(|| {
        (0..len)
            .into_par_iter()
            .step_by(chunk_size)
            .map(|start| f(start..(start + chunk_size).min(len)))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_threads_resolves_to_hardware() {
        assert!(num_threads(0) >= 1);
        assert_eq!(num_threads(3), 3);
    }

    #[test]
    fn dispatch_covers_every_element() {
        let mut out = vec![0_usize; 1000];
        dispatch(&mut out, 4, |offset, slice| {
            for (i, value) in slice.iter_mut().enumerate() {
                *value = offset + i;
            }
            Ok(())
        })
        .unwrap();

        for (i, value) in out.iter().enumerate() {
            assert_eq!(*value, i);
        }
    }

    #[test]
    fn dispatch_is_independent_of_the_worker_count() {
        let compute = |threads| {
            let mut out = vec![0.0_f64; 577];
            dispatch(&mut out, threads, |offset, slice| {
                for (i, value) in slice.iter_mut().enumerate() {
                    let x = (offset + i) as f64;
                    *value = x.sin().mul_add(3.0, x.sqrt());
                }
                Ok(())
            })
            .unwrap();
            out
        };

        assert_eq!(compute(1), compute(7));
    }

    #[test]
    fn dispatch_propagates_worker_errors() {
        let mut out = vec![0_usize; 16];
        let result = dispatch(&mut out, 4, |offset, _| {
            if offset >= 8 {
                Err(Error::InvalidArgument("boom".to_string()))
            } else {
                Ok(())
            }
        });

        assert!(result.is_err());
    }

    #[test]
    fn fold_partitions_the_input_range() {
        let states = fold(100, 3, |range| Ok(range.len())).unwrap();

        assert_eq!(states.iter().sum::<usize>(), 100);
    }
}
