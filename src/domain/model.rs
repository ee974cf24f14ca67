use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Timings of one sequential-vs-parallel comparison.
#[derive(Debug, Clone)]
pub struct BenchmarkReport {
    pub sequential_time: Duration,
    pub parallel_time: Duration,
    pub workers: usize,
    pub speedup: f64,
    /// Percent of ideal linear speedup.
    pub efficiency: f64,
}

impl BenchmarkReport {
    pub fn new(sequential_time: Duration, parallel_time: Duration, workers: usize) -> Self {
        let speedup = speedup(sequential_time, parallel_time);
        Self {
            sequential_time,
            parallel_time,
            workers,
            speedup,
            efficiency: efficiency(speedup, workers),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScalingRow {
    pub workers: usize,
    pub problem_size: usize,
    pub elapsed: Duration,
    pub speedup: f64,
    pub efficiency: f64,
}

/// `baseline / elapsed`, or 0 when nothing was measured.
pub fn speedup(baseline: Duration, elapsed: Duration) -> f64 {
    let elapsed = elapsed.as_secs_f64();
    if elapsed > 0.0 {
        baseline.as_secs_f64() / elapsed
    } else {
        0.0
    }
}

pub fn efficiency(speedup: f64, workers: usize) -> f64 {
    if workers == 0 {
        0.0
    } else {
        speedup / workers as f64 * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    CalculateSquare,
    CalculateCube,
    CalculateFactorial,
    ProcessString,
    FetchData,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::CalculateSquare => "calculate_square",
            TaskKind::CalculateCube => "calculate_cube",
            TaskKind::CalculateFactorial => "calculate_factorial",
            TaskKind::ProcessString => "process_string",
            TaskKind::FetchData => "fetch_data",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskInput {
    Number(u64),
    Text(String),
}

impl fmt::Display for TaskInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskInput::Number(n) => write!(f, "{}", n),
            TaskInput::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "type")]
    pub kind: TaskKind,
    #[serde(rename = "data")]
    pub input: TaskInput,
}

impl Task {
    pub fn number(kind: TaskKind, value: u64) -> Self {
        Self {
            kind,
            input: TaskInput::Number(value),
        }
    }

    pub fn text(kind: TaskKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            input: TaskInput::Text(value.into()),
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.input)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedRecord {
    pub task_id: u64,
    pub data: u32,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskOutput {
    Number(u128),
    Text(String),
    Fetched(FetchedRecord),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task: TaskKind,
    pub input: TaskInput,
    pub output: TaskOutput,
    /// Set by the worker pool; sequential runs leave it empty.
    pub worker: Option<String>,
}
