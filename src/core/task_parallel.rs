//! Task parallelism: heterogeneous tasks dispatched to a small worker pool.
//!
//! ```text
//! producer ──▶ [ bounded task queue ] ──▶ Worker-1..Worker-n ──▶ result channel ──▶ coordinator
//!               tasks…, Stop × n
//! ```
//!
//! Workers share one receiver and exit when they pull a `Stop` sentinel or
//! when the queue stays empty for the idle timeout.

use crate::domain::model::{FetchedRecord, Task, TaskInput, TaskKind, TaskOutput, TaskResult};
use crate::utils::error::{PrimerError, Result};
use rand::Rng;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Scales the simulated latency of every task. A scale of 0 skips the sleeps.
#[derive(Debug, Clone, Copy)]
pub struct Latency {
    scale: f64,
}

impl Latency {
    pub fn new(scale: f64) -> Self {
        Self {
            scale: scale.max(0.0),
        }
    }

    pub fn none() -> Self {
        Self::new(0.0)
    }

    async fn pause(&self, seconds: f64) {
        let scaled = seconds * self.scale;
        if scaled > 0.0 {
            tokio::time::sleep(Duration::from_secs_f64(scaled)).await;
        }
    }
}

impl Default for Latency {
    fn default() -> Self {
        Self::new(1.0)
    }
}

pub async fn calculate_square(x: u64, latency: &Latency) -> u128 {
    latency.pause(0.1).await;
    let x = u128::from(x);
    x * x
}

pub async fn calculate_cube(x: u64, latency: &Latency) -> Result<u128> {
    latency.pause(0.15).await;
    let x = u128::from(x);
    x.checked_mul(x)
        .and_then(|sq| sq.checked_mul(x))
        .ok_or_else(|| PrimerError::ArithmeticError {
            operation: TaskKind::CalculateCube.to_string(),
            message: format!("{}³ does not fit in 128 bits", x),
        })
}

pub async fn calculate_factorial(x: u64, latency: &Latency) -> Result<u128> {
    latency.pause(0.2).await;
    (1..=u128::from(x)).try_fold(1u128, |acc, i| {
        acc.checked_mul(i).ok_or_else(|| PrimerError::ArithmeticError {
            operation: TaskKind::CalculateFactorial.to_string(),
            message: format!("{}! does not fit in 128 bits", x),
        })
    })
}

/// Uppercases `s` and appends one to three exclamation marks.
pub async fn process_string(s: &str, latency: &Latency) -> String {
    latency.pause(0.05).await;
    let marks = rand::thread_rng().gen_range(1..=3);
    format!("{}{}", s.to_uppercase(), "!".repeat(marks))
}

/// Stands in for a remote call with variable latency.
pub async fn fetch_data(task_id: u64, latency: &Latency) -> FetchedRecord {
    let jitter = rand::thread_rng().gen::<f64>() * 0.2;
    latency.pause(0.1 + jitter).await;
    FetchedRecord {
        task_id,
        data: rand::thread_rng().gen_range(1..=100),
        timestamp: chrono::Utc::now(),
    }
}

fn expect_number(task: &Task) -> Result<u64> {
    match &task.input {
        TaskInput::Number(n) => Ok(*n),
        TaskInput::Text(_) => Err(PrimerError::InvalidTask {
            task: task.to_string(),
            reason: "expected a numeric input".to_string(),
        }),
    }
}

fn expect_text(task: &Task) -> Result<&str> {
    match &task.input {
        TaskInput::Text(s) => Ok(s),
        TaskInput::Number(_) => Err(PrimerError::InvalidTask {
            task: task.to_string(),
            reason: "expected a text input".to_string(),
        }),
    }
}

pub async fn execute(task: &Task, latency: &Latency) -> Result<TaskOutput> {
    let output = match task.kind {
        TaskKind::CalculateSquare => {
            TaskOutput::Number(calculate_square(expect_number(task)?, latency).await)
        }
        TaskKind::CalculateCube => {
            TaskOutput::Number(calculate_cube(expect_number(task)?, latency).await?)
        }
        TaskKind::CalculateFactorial => {
            TaskOutput::Number(calculate_factorial(expect_number(task)?, latency).await?)
        }
        TaskKind::ProcessString => {
            TaskOutput::Text(process_string(expect_text(task)?, latency).await)
        }
        TaskKind::FetchData => {
            TaskOutput::Fetched(fetch_data(expect_number(task)?, latency).await)
        }
    };
    Ok(output)
}

/// Runs the tasks one after another; results keep the input order.
pub async fn sequential_task_processing(tasks: &[Task], latency: &Latency) -> Result<Vec<TaskResult>> {
    let mut results = Vec::with_capacity(tasks.len());
    for task in tasks {
        let output = execute(task, latency).await?;
        results.push(TaskResult {
            task: task.kind,
            input: task.input.clone(),
            output,
            worker: None,
        });
    }
    Ok(results)
}

enum WorkItem {
    Run(Task),
    Stop,
}

pub struct WorkerPool {
    num_workers: usize,
    queue_capacity: Option<usize>,
    idle_timeout: Duration,
    latency: Latency,
}

impl WorkerPool {
    pub fn new(num_workers: usize) -> Self {
        Self {
            num_workers,
            queue_capacity: None,
            idle_timeout: Duration::from_secs(1),
            latency: Latency::default(),
        }
    }

    pub fn with_queue_capacity(mut self, capacity: Option<usize>) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn with_latency(mut self, latency: Latency) -> Self {
        self.latency = latency;
        self
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Runs every task on the pool. Results arrive in completion order.
    pub async fn process(&self, tasks: Vec<Task>) -> Result<Vec<TaskResult>> {
        if self.num_workers == 0 {
            return Err(PrimerError::InvalidConfigValueError {
                field: "task.workers".to_string(),
                value: "0".to_string(),
                reason: "At least one worker is required".to_string(),
            });
        }

        let task_count = tasks.len();
        let capacity = self
            .queue_capacity
            .unwrap_or(task_count + self.num_workers)
            .max(1);

        let (task_tx, task_rx) = mpsc::channel::<WorkItem>(capacity);
        let task_rx = Arc::new(Mutex::new(task_rx));
        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<Result<TaskResult>>();

        let workers: Vec<JoinHandle<usize>> = (1..=self.num_workers)
            .map(|id| {
                let name = format!("Worker-{}", id);
                let rx = task_rx.clone();
                let tx = result_tx.clone();
                let idle_timeout = self.idle_timeout;
                let latency = self.latency;
                tokio::spawn(async move { worker(name, rx, tx, idle_timeout, latency).await })
            })
            .collect();
        drop(result_tx);

        let num_workers = self.num_workers;
        let producer = tokio::spawn(async move {
            for task in tasks {
                if task_tx.send(WorkItem::Run(task)).await.is_err() {
                    warn!("Task queue closed before every task was enqueued");
                    return;
                }
            }
            for _ in 0..num_workers {
                if task_tx.send(WorkItem::Stop).await.is_err() {
                    return;
                }
            }
            trace!(task_count, num_workers, "Producer enqueued tasks and stop sentinels");
        });

        let mut results = Vec::with_capacity(task_count);
        while results.len() < task_count {
            match result_rx.recv().await {
                Some(Ok(result)) => results.push(result),
                Some(Err(e)) => {
                    producer.abort();
                    workers.iter().for_each(JoinHandle::abort);
                    return Err(e);
                }
                None => {
                    producer.abort();
                    return Err(PrimerError::WorkerPoolError {
                        message: format!(
                            "workers exited after {} of {} results",
                            results.len(),
                            task_count
                        ),
                    });
                }
            }
        }

        producer.await?;
        for handle in workers {
            let processed = handle.await?;
            trace!(processed, "Worker joined");
        }

        Ok(results)
    }
}

async fn worker(
    name: String,
    rx: Arc<Mutex<mpsc::Receiver<WorkItem>>>,
    tx: mpsc::UnboundedSender<Result<TaskResult>>,
    idle_timeout: Duration,
    latency: Latency,
) -> usize {
    debug!(worker = %name, "Worker starting");
    let mut processed = 0;

    loop {
        let item = {
            let mut rx_guard = rx.lock().await;
            match tokio::time::timeout(idle_timeout, rx_guard.recv()).await {
                Ok(item) => item,
                Err(_) => {
                    debug!(worker = %name, processed, "Queue idle, worker exiting");
                    break;
                }
            }
        };

        match item {
            Some(WorkItem::Run(task)) => {
                trace!(worker = %name, task = %task, "Running task");
                let result = execute(&task, &latency).await.map(|output| TaskResult {
                    task: task.kind,
                    input: task.input,
                    output,
                    worker: Some(name.clone()),
                });
                let failed = result.is_err();
                if tx.send(result).is_err() || failed {
                    break;
                }
                processed += 1;
            }
            Some(WorkItem::Stop) | None => {
                debug!(worker = %name, processed, "Worker received stop signal");
                break;
            }
        }
    }

    processed
}

pub async fn parallel_task_processing(
    tasks: Vec<Task>,
    num_workers: usize,
    latency: Latency,
) -> Result<Vec<TaskResult>> {
    WorkerPool::new(num_workers)
        .with_latency(latency)
        .process(tasks)
        .await
}

/// Tasks handled per worker. Results without a worker count as `unknown`.
pub fn worker_distribution(results: &[TaskResult]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for result in results {
        let name = result.worker.as_deref().unwrap_or("unknown");
        *counts.entry(name.to_string()).or_insert(0) += 1;
    }
    counts
}

/// The mixed workload used by the lesson.
pub fn demo_tasks() -> Vec<Task> {
    vec![
        Task::number(TaskKind::CalculateSquare, 5),
        Task::number(TaskKind::CalculateCube, 3),
        Task::number(TaskKind::CalculateFactorial, 6),
        Task::text(TaskKind::ProcessString, "hello"),
        Task::number(TaskKind::FetchData, 1),
        Task::number(TaskKind::CalculateSquare, 7),
        Task::number(TaskKind::CalculateCube, 4),
        Task::number(TaskKind::FetchData, 2),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(result: &TaskResult) -> u128 {
        match result.output {
            TaskOutput::Number(n) => n,
            ref other => panic!("expected a number, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_numeric_tasks() {
        let latency = Latency::none();
        assert_eq!(calculate_square(5, &latency).await, 25);
        assert_eq!(calculate_cube(3, &latency).await.unwrap(), 27);
        assert_eq!(calculate_factorial(6, &latency).await.unwrap(), 720);
        assert_eq!(calculate_factorial(0, &latency).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_overflow_is_reported() {
        let latency = Latency::none();
        assert!(calculate_factorial(34, &latency).await.is_ok());
        assert!(matches!(
            calculate_factorial(35, &latency).await,
            Err(PrimerError::ArithmeticError { .. })
        ));
        assert!(calculate_cube(u64::MAX, &latency).await.is_err());
    }

    #[tokio::test]
    async fn test_process_string_and_fetch_data() {
        let latency = Latency::none();
        let shouted = process_string("hello", &latency).await;
        assert!(shouted.starts_with("HELLO"));
        let marks = shouted.len() - "HELLO".len();
        assert!((1..=3).contains(&marks));
        assert!(shouted["HELLO".len()..].chars().all(|c| c == '!'));

        let record = fetch_data(9, &latency).await;
        assert_eq!(record.task_id, 9);
        assert!((1..=100).contains(&record.data));
    }

    #[tokio::test]
    async fn test_wrong_input_type_is_rejected() {
        let task = Task::text(TaskKind::CalculateSquare, "five");
        let err = execute(&task, &Latency::none()).await.unwrap_err();
        assert!(matches!(err, PrimerError::InvalidTask { .. }));

        let task = Task::number(TaskKind::ProcessString, 5);
        assert!(execute(&task, &Latency::none()).await.is_err());
    }

    #[tokio::test]
    async fn test_sequential_keeps_input_order() {
        let tasks = demo_tasks();
        let results = sequential_task_processing(&tasks, &Latency::none()).await.unwrap();

        assert_eq!(results.len(), tasks.len());
        for (task, result) in tasks.iter().zip(&results) {
            assert_eq!(task.kind, result.task);
            assert_eq!(task.input, result.input);
            assert!(result.worker.is_none());
        }
        assert_eq!(number(&results[0]), 25);
        assert_eq!(number(&results[2]), 720);
        assert_eq!(number(&results[6]), 64);
    }

    #[tokio::test]
    async fn test_pool_returns_every_task_once() {
        let tasks: Vec<Task> = (1..=20).map(|n| Task::number(TaskKind::CalculateSquare, n)).collect();
        let mut results = WorkerPool::new(4)
            .with_latency(Latency::none())
            .process(tasks)
            .await
            .unwrap();

        assert_eq!(results.len(), 20);
        results.sort_by_key(number);
        let squares: Vec<u128> = results.iter().map(number).collect();
        let expected: Vec<u128> = (1..=20u128).map(|n| n * n).collect();
        assert_eq!(squares, expected);

        let distribution = worker_distribution(&results);
        assert_eq!(distribution.values().sum::<usize>(), 20);
        assert!(distribution.keys().all(|k| k.starts_with("Worker-")));
        assert!(distribution.len() <= 4);
    }

    #[tokio::test]
    async fn test_pool_with_tiny_queue() {
        let results = WorkerPool::new(2)
            .with_queue_capacity(Some(1))
            .with_latency(Latency::none())
            .process(demo_tasks())
            .await
            .unwrap();
        assert_eq!(results.len(), 8);
    }

    #[tokio::test]
    async fn test_pool_with_more_workers_than_tasks() {
        let tasks = vec![Task::number(TaskKind::CalculateCube, 2)];
        let results = parallel_task_processing(tasks, 6, Latency::none()).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(number(&results[0]), 8);
    }

    #[tokio::test]
    async fn test_pool_with_no_tasks() {
        let results = parallel_task_processing(Vec::new(), 3, Latency::none()).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_pool_surfaces_task_errors() {
        let tasks = vec![
            Task::number(TaskKind::CalculateSquare, 2),
            Task::number(TaskKind::CalculateFactorial, 40),
        ];
        let err = parallel_task_processing(tasks, 2, Latency::none()).await.unwrap_err();
        assert!(matches!(err, PrimerError::ArithmeticError { .. }));
    }

    #[tokio::test]
    async fn test_pool_rejects_zero_workers() {
        let err = WorkerPool::new(0).process(demo_tasks()).await.unwrap_err();
        assert!(matches!(err, PrimerError::InvalidConfigValueError { .. }));
    }

    #[test]
    fn test_worker_distribution_counts_unknown() {
        let result = TaskResult {
            task: TaskKind::CalculateSquare,
            input: TaskInput::Number(2),
            output: TaskOutput::Number(4),
            worker: None,
        };
        let distribution = worker_distribution(&[result.clone(), result]);
        assert_eq!(distribution.get("unknown"), Some(&2));
    }
}
