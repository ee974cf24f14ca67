use anyhow::{Context, Result};
use parallel_primer::utils::validation::Validate;
use parallel_primer::{build_engine, LessonKind, Narrator, PrimerConfig};
use std::io::Write;
use tempfile::NamedTempFile;

fn small_config() -> Result<PrimerConfig> {
    let config = PrimerConfig::from_toml_str(
        r#"
[data]
size = 4000
workers = 2
scaling_workers = [1, 2]
weak_base_size = 1000

[task]
workers = 3
latency_scale = 0.0

[mpi]
ranks = 4
"#,
    )?;
    Ok(config)
}

#[tokio::test]
async fn test_all_lessons_end_to_end() -> Result<()> {
    let config = small_config()?;
    let engine = build_engine(&LessonKind::ALL, &config);

    let (mut narrator, buffer) = Narrator::capture();
    let ran = engine.run(&mut narrator).await?;
    assert_eq!(ran, 3);

    let output = buffer.contents();
    assert!(output.starts_with("System has "));

    let data = output
        .find("DATA PARALLELISM DEMONSTRATION")
        .context("data lesson banner missing")?;
    let task = output
        .find("TASK PARALLELISM DEMONSTRATION")
        .context("task lesson banner missing")?;
    let mpi = output.find("MPI HELLO WORLD").context("mpi lesson banner missing")?;
    assert!(data < task && task < mpi);

    assert!(output.contains("Testing with 4,000 elements..."));
    assert!(output.contains("Results: 8 tasks completed"));
    assert!(output.contains("Process 0 gathered data: [0, 10, 20, 30]"));
    assert!(output.contains("Process 1 received message: 42 from process 0"));

    Ok(())
}

#[tokio::test]
async fn test_lessons_from_config_file() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    file.write_all(b"[mpi]\nranks = 2\nroot = 1\n")?;

    let config = PrimerConfig::from_file(file.path())
        .with_context(|| format!("loading {}", file.path().display()))?;
    let engine = build_engine(&[LessonKind::MessagePassing], &config);

    let (mut narrator, buffer) = Narrator::capture();
    engine.run(&mut narrator).await?;

    let output = buffer.contents();
    assert!(output.contains("Hello from process 1 out of 2"));
    assert!(output.contains("Process 1 gathered data: [0, 10]"));
    assert!(!output.contains("[rank 2]"));

    Ok(())
}

#[test]
fn test_example_config_is_valid() -> Result<()> {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("configs/primer.example.toml");
    let config = PrimerConfig::from_file(&path).context("example config should parse")?;
    config.validate()?;
    assert_eq!(config.mpi.ranks, 4);
    assert_eq!(config.data.scaling_workers, vec![1, 2, 4]);

    Ok(())
}

#[test]
fn test_maximum_seed_config_is_accepted() -> Result<()> {
    let config = PrimerConfig::from_toml_str("[data]\nseed = 18446744073709551615\n")?;
    config.validate()?;
    assert_eq!(config.data.seed, u64::MAX);

    Ok(())
}
