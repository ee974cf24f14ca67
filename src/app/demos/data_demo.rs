use crate::config::toml_config::{DataConfig, PrimerConfig};
use crate::core::data_parallel::{self, parallel_processing, sequential_processing};
use crate::domain::model::ScalingRow;
use crate::domain::ports::Demo;
use crate::utils::error::Result;
use crate::utils::narration::{thousands, Narrator};
use async_trait::async_trait;

pub struct DataParallelDemo {
    config: DataConfig,
    workers: usize,
    cpu_count: usize,
}

impl DataParallelDemo {
    pub fn new(config: DataConfig, workers: usize, cpu_count: usize) -> Self {
        Self {
            config,
            workers,
            cpu_count,
        }
    }

    pub fn from_config(config: &PrimerConfig) -> Self {
        Self::new(config.data.clone(), config.data_workers(), num_cpus::get())
    }

    async fn demonstrate(&self, narrator: &mut Narrator) -> Result<()> {
        narrator.banner("DATA PARALLELISM DEMONSTRATION")?;

        narrator.section(1, "Concept Explanation")?;
        narrator.lines(&[
            "Data parallelism means applying the SAME operation",
            "to DIFFERENT data elements simultaneously.",
            "Example: Multiplying each element in an array by 2",
        ])?;

        narrator.section(2, "Simple Example")?;
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        narrator.line(format!("Original data: {:?}", data))?;
        narrator.line(format!(
            "Sequential result (x * 2): {:?}",
            sequential_processing(&data, 2.0)
        ))?;
        let halves = data_parallel::partition(&data, 2)?;
        narrator.line(format!(
            "Parallel: {:?} and {:?} processed simultaneously by 2 workers",
            halves[0], halves[1]
        ))?;
        narrator.line(format!(
            "Parallel result (x * 2): {:?}",
            parallel_processing(&data, 2.0, 2)?
        ))?;

        narrator.section(3, "Real-world Applications")?;
        narrator.bullets(&[
            "Image processing (apply filter to all pixels)",
            "Matrix operations (multiply all elements)",
            "Scientific simulations (update all particles)",
            "Data transformation (apply function to all records)",
        ])?;

        narrator.section(4, "Performance Benchmark")?;
        narrator.line(format!("Testing with {} elements...", thousands(self.config.size)))?;
        let (size, multiplier, seed, workers) = (
            self.config.size,
            self.config.multiplier,
            self.config.seed,
            self.workers,
        );
        let report = tokio::task::spawn_blocking(move || {
            data_parallel::benchmark(size, multiplier, seed, workers)
        })
        .await??;
        narrator.line(format!(
            "Sequential time: {:.3} seconds",
            report.sequential_time.as_secs_f64()
        ))?;
        narrator.line(format!(
            "Parallel time: {:.3} seconds ({} workers)",
            report.parallel_time.as_secs_f64(),
            report.workers
        ))?;
        narrator.line(format!("Speedup: {:.2}x", report.speedup))?;
        narrator.line(format!("Efficiency: {:.1}%", report.efficiency))?;
        narrator.line("Sequential and parallel results match element for element")?;

        narrator.section(5, "Key Characteristics")?;
        narrator.bullets(&[
            "Same operation applied to all data",
            "Minimal communication between workers",
            "Easy to load balance (equal-sized chunks)",
            "Highly scalable for large datasets",
        ])?;

        narrator.section(6, "When to Use Data Parallelism")?;
        narrator.checks(&[
            "Large datasets with uniform operations",
            "Operations are computationally expensive",
            "Data can be easily partitioned",
            "Minimal data dependencies between elements",
        ])?;

        narrator.section(7, "Challenges")?;
        narrator.bullets(&[
            "Data partitioning strategy",
            "Load balancing for irregular data",
            "Result aggregation",
            "Memory usage with many copies",
        ])?;

        Ok(())
    }

    async fn compare_scaling(&self, narrator: &mut Narrator) -> Result<()> {
        narrator.next_banner("SCALING ANALYSIS")?;

        let (size, multiplier, seed, cpu_count) = (
            self.config.size,
            self.config.multiplier,
            self.config.seed,
            self.cpu_count,
        );
        let worker_counts = self.config.scaling_workers.clone();
        let strong = tokio::task::spawn_blocking(move || {
            let data = data_parallel::generate_dataset(size, seed);
            data_parallel::strong_scaling(&data, multiplier, &worker_counts, cpu_count)
        })
        .await??;

        narrator.raw(format!(
            "\nStrong Scaling (fixed problem size = {}):",
            thousands(self.config.size)
        ))?;
        narrator.raw("Workers | Time (s) | Speedup | Efficiency")?;
        narrator.rule(40)?;
        for row in &strong {
            narrator.raw(format!(
                "{:7} | {:8.3} | {:7.2} | {:9.1}%",
                row.workers,
                row.elapsed.as_secs_f64(),
                row.speedup,
                row.efficiency
            ))?;
        }

        let base_size = self.config.weak_base_size;
        let worker_counts = self.config.scaling_workers.clone();
        let weak = tokio::task::spawn_blocking(move || {
            data_parallel::weak_scaling(base_size, multiplier, seed, &worker_counts, cpu_count)
        })
        .await??;

        narrator.raw(format!(
            "\nWeak Scaling (problem size per worker = {}):",
            thousands(base_size)
        ))?;
        narrator.raw("Workers | Total Size | Time (s) | Efficiency")?;
        narrator.rule(45)?;
        for row in &weak {
            narrator.raw(format!(
                "{:7} | {:10} | {:8.3} | {:9.1}%",
                row.workers,
                row.problem_size,
                row.elapsed.as_secs_f64(),
                row.efficiency
            ))?;
        }

        let skipped = skipped_worker_counts(&self.config.scaling_workers, &strong);
        if !skipped.is_empty() {
            narrator.raw(format!(
                "(skipped {:?}: more workers than the {} available cores)",
                skipped, self.cpu_count
            ))?;
        }

        Ok(())
    }

    fn summarize(&self, narrator: &mut Narrator) -> Result<()> {
        narrator.next_banner("SUMMARY")?;
        narrator.raw("Data parallelism is ideal for:")?;
        narrator.numbered(&[
            "Uniform operations on large datasets",
            "Problems that can be easily partitioned",
            "Applications where communication is minimal",
        ])?;

        narrator.raw("\nThis example demonstrates the basic pattern of:")?;
        narrator.numbered(&[
            "Partition data into chunks",
            "Process chunks independently",
            "Combine results",
        ])?;

        narrator.raw("\nTry modifying this code to:")?;
        narrator.numbered(&[
            "Change the operation (e.g., square root, sine)",
            "Use different data types (e.g., strings, images)",
            "Replace the dedicated thread pool with rayon's global pool",
            "Handle uneven partitions by stealing work between chunks",
        ])?;
        Ok(())
    }
}

fn skipped_worker_counts(requested: &[usize], rows: &[ScalingRow]) -> Vec<usize> {
    requested
        .iter()
        .copied()
        .filter(|w| !rows.iter().any(|r| r.workers == *w))
        .collect()
}

#[async_trait]
impl Demo for DataParallelDemo {
    fn name(&self) -> &str {
        "data-parallelism"
    }

    async fn run(&self, narrator: &mut Narrator) -> Result<()> {
        self.demonstrate(narrator).await?;
        self.compare_scaling(narrator).await?;
        self.summarize(narrator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> DataConfig {
        DataConfig {
            size: 2_000,
            weak_base_size: 500,
            ..DataConfig::default()
        }
    }

    #[tokio::test]
    async fn test_demo_narrates_every_section() {
        let demo = DataParallelDemo::new(small_config(), 2, 2);
        let (mut narrator, buffer) = Narrator::capture();
        demo.run(&mut narrator).await.unwrap();

        let output = buffer.contents();
        for heading in [
            "DATA PARALLELISM DEMONSTRATION",
            "1. Concept Explanation:",
            "4. Performance Benchmark:",
            "7. Challenges:",
            "SCALING ANALYSIS",
            "Strong Scaling (fixed problem size = 2,000):",
            "Weak Scaling (problem size per worker = 500):",
            "SUMMARY",
        ] {
            assert!(output.contains(heading), "missing {heading}");
        }
        assert!(output.contains("Testing with 2,000 elements..."));
        assert!(output.contains("Parallel result (x * 2): [2.0, 4.0, 6.0, 8.0, 10.0, 12.0, 14.0, 16.0]"));
        assert!(output.contains("(skipped [4]: more workers than the 2 available cores)"));
    }

    #[test]
    fn test_skipped_worker_counts() {
        let rows = vec![ScalingRow {
            workers: 1,
            problem_size: 10,
            elapsed: std::time::Duration::ZERO,
            speedup: 1.0,
            efficiency: 100.0,
        }];
        assert_eq!(skipped_worker_counts(&[1, 2, 4], &rows), vec![2, 4]);
    }
}
