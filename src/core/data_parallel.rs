//! Data parallelism: one operation applied to every partition of a dataset.
//!
//! The dataset is split into one contiguous chunk per worker, each chunk is
//! processed on a dedicated rayon pool, and the partial results are
//! concatenated back in partition order.

use crate::domain::model::{efficiency, speedup, BenchmarkReport, ScalingRow};
use crate::utils::error::{PrimerError, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;
use std::time::{Duration, Instant};

/// Reproducible values in `[0, 1)`.
pub fn generate_dataset(size: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..size).map(|_| rng.gen::<f64>()).collect()
}

pub fn process_chunk(chunk: &[f64], multiplier: f64) -> Vec<f64> {
    chunk.iter().map(|x| x * multiplier).collect()
}

pub fn sequential_processing(data: &[f64], multiplier: f64) -> Vec<f64> {
    process_chunk(data, multiplier)
}

/// Splits `data` into exactly `num_workers` contiguous chunks.
///
/// Every chunk holds `len / num_workers` elements except the last, which
/// also takes the remainder. Chunks may be empty when there are more
/// workers than elements.
pub fn partition(data: &[f64], num_workers: usize) -> Result<Vec<&[f64]>> {
    if num_workers == 0 {
        return Err(PrimerError::InvalidConfigValueError {
            field: "workers".to_string(),
            value: "0".to_string(),
            reason: "At least one worker is required".to_string(),
        });
    }

    let chunk_size = data.len() / num_workers;
    let chunks = (0..num_workers)
        .map(|i| {
            let start = i * chunk_size;
            let end = if i + 1 < num_workers {
                (i + 1) * chunk_size
            } else {
                data.len()
            };
            &data[start..end]
        })
        .collect();

    Ok(chunks)
}

pub fn parallel_processing(data: &[f64], multiplier: f64, num_workers: usize) -> Result<Vec<f64>> {
    let chunks = partition(data, num_workers)?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_workers)
        .thread_name(|i| format!("chunk-worker-{}", i + 1))
        .build()?;

    let partials: Vec<Vec<f64>> = pool.install(|| {
        chunks
            .par_iter()
            .map(|chunk| process_chunk(chunk, multiplier))
            .collect()
    });

    tracing::debug!(workers = num_workers, chunks = partials.len(), "Combining partial results");
    Ok(partials.into_iter().flatten().collect())
}

/// Fails on the first element where the two runs disagree.
pub fn verify_results(sequential: &[f64], parallel: &[f64]) -> Result<()> {
    if let Some(index) = sequential
        .iter()
        .zip(parallel)
        .position(|(s, p)| s.to_bits() != p.to_bits())
    {
        return Err(PrimerError::ResultMismatch {
            index,
            sequential: sequential[index],
            parallel: parallel[index],
        });
    }

    if sequential.len() != parallel.len() {
        let index = sequential.len().min(parallel.len());
        return Err(PrimerError::ResultMismatch {
            index,
            sequential: sequential.get(index).copied().unwrap_or(f64::NAN),
            parallel: parallel.get(index).copied().unwrap_or(f64::NAN),
        });
    }

    Ok(())
}

fn timed<T>(f: impl FnOnce() -> Result<T>) -> Result<(T, Duration)> {
    let start = Instant::now();
    let value = f()?;
    Ok((value, start.elapsed()))
}

/// Times the sequential and parallel paths on the same data and checks they agree.
pub fn benchmark_data(data: &[f64], multiplier: f64, workers: usize) -> Result<BenchmarkReport> {
    let (seq_result, seq_time) = timed(|| Ok(sequential_processing(data, multiplier)))?;
    let (par_result, par_time) = timed(|| parallel_processing(data, multiplier, workers))?;

    verify_results(&seq_result, &par_result)?;

    let report = BenchmarkReport::new(seq_time, par_time, workers);
    tracing::debug!(
        size = data.len(),
        workers,
        seq_ms = seq_time.as_millis() as u64,
        par_ms = par_time.as_millis() as u64,
        speedup = report.speedup,
        "Benchmark finished"
    );
    Ok(report)
}

pub fn benchmark(size: usize, multiplier: f64, seed: u64, workers: usize) -> Result<BenchmarkReport> {
    let data = generate_dataset(size, seed);
    benchmark_data(&data, multiplier, workers)
}

/// Fixed problem size, growing worker count.
///
/// Worker counts above `cpu_count` are skipped. The baseline is always a
/// 1-worker parallel run over the same data.
pub fn strong_scaling(
    data: &[f64],
    multiplier: f64,
    worker_counts: &[usize],
    cpu_count: usize,
) -> Result<Vec<ScalingRow>> {
    let (_, baseline) = timed(|| parallel_processing(data, multiplier, 1))?;

    let mut rows = Vec::new();
    for &workers in worker_counts.iter().filter(|&&w| w <= cpu_count) {
        let elapsed = if workers == 1 {
            baseline
        } else {
            timed(|| parallel_processing(data, multiplier, workers))?.1
        };

        let row_speedup = if workers == 1 { 1.0 } else { speedup(baseline, elapsed) };
        rows.push(ScalingRow {
            workers,
            problem_size: data.len(),
            elapsed,
            speedup: row_speedup,
            efficiency: efficiency(row_speedup, workers),
        });
    }

    Ok(rows)
}

fn weak_problem_size(base_size: usize, workers: usize) -> Result<usize> {
    base_size
        .checked_mul(workers)
        .ok_or_else(|| PrimerError::InvalidConfigValueError {
            field: "data.weak_base_size".to_string(),
            value: base_size.to_string(),
            reason: format!("{} workers would need more elements than fit in memory", workers),
        })
}

/// Problem size grows with the worker count: `base_size * workers` elements.
///
/// Efficiency is `t(1) / t(n)`; ideal weak scaling keeps the time flat.
/// Each size draws its data from seed `seed + workers`, wrapping at `u64::MAX`.
pub fn weak_scaling(
    base_size: usize,
    multiplier: f64,
    seed: u64,
    worker_counts: &[usize],
    cpu_count: usize,
) -> Result<Vec<ScalingRow>> {
    let run = |workers: usize, size: usize| -> Result<Duration> {
        let data = generate_dataset(size, seed.wrapping_add(workers as u64));
        Ok(timed(|| parallel_processing(&data, multiplier, workers))?.1)
    };

    // Sizes are checked up front so nothing is generated for a run that cannot fit.
    let plan = worker_counts
        .iter()
        .filter(|&&w| w <= cpu_count)
        .map(|&workers| Ok((workers, weak_problem_size(base_size, workers)?)))
        .collect::<Result<Vec<_>>>()?;

    let baseline = run(1, base_size)?;

    let mut rows = Vec::new();
    for (workers, problem_size) in plan {
        let elapsed = if workers == 1 {
            baseline
        } else {
            run(workers, problem_size)?
        };

        let row_efficiency = if workers == 1 {
            100.0
        } else {
            speedup(baseline, elapsed) * 100.0
        };
        rows.push(ScalingRow {
            workers,
            problem_size,
            elapsed,
            // Scaled speedup: n times the work in the measured time.
            speedup: row_efficiency / 100.0 * workers as f64,
            efficiency: row_efficiency,
        });
    }

    Ok(rows)
}
