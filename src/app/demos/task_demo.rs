use crate::config::toml_config::PrimerConfig;
use crate::core::task_parallel::{
    demo_tasks, sequential_task_processing, worker_distribution, Latency, WorkerPool,
};
use crate::domain::model::{speedup, Task};
use crate::domain::ports::Demo;
use crate::utils::error::Result;
use crate::utils::narration::Narrator;
use async_trait::async_trait;
use std::time::{Duration, Instant};

pub struct TaskParallelDemo {
    tasks: Vec<Task>,
    workers: usize,
    latency: Latency,
    idle_timeout: Duration,
    queue_capacity: Option<usize>,
}

impl TaskParallelDemo {
    pub fn new(workers: usize, latency: Latency) -> Self {
        Self {
            tasks: demo_tasks(),
            workers,
            latency,
            idle_timeout: Duration::from_secs(1),
            queue_capacity: None,
        }
    }

    pub fn from_config(config: &PrimerConfig) -> Self {
        Self {
            idle_timeout: config.idle_timeout(),
            queue_capacity: config.task.queue_capacity,
            ..Self::new(config.task_workers(), Latency::new(config.task.latency_scale))
        }
    }

    pub fn with_tasks(mut self, tasks: Vec<Task>) -> Self {
        self.tasks = tasks;
        self
    }

    async fn demonstrate(&self, narrator: &mut Narrator) -> Result<()> {
        narrator.banner("TASK PARALLELISM DEMONSTRATION")?;

        narrator.section(1, "Concept Explanation")?;
        narrator.lines(&[
            "Task parallelism means executing DIFFERENT operations",
            "on the SAME or DIFFERENT data simultaneously.",
            "Example: Web server handling multiple client requests",
        ])?;

        narrator.section(2, "Example Tasks")?;
        narrator.line("Task list:")?;
        for (i, task) in self.tasks.iter().enumerate() {
            narrator.line(format!("{}. {}", i + 1, task))?;
        }

        narrator.section(3, "Sequential Processing")?;
        let start = Instant::now();
        let seq_results = sequential_task_processing(&self.tasks, &self.latency).await?;
        let seq_time = start.elapsed();
        narrator.line(format!("Time: {:.3} seconds", seq_time.as_secs_f64()))?;
        narrator.line(format!("Results: {} tasks completed", seq_results.len()))?;

        narrator.section(4, "Parallel Processing")?;
        let pool = WorkerPool::new(self.workers)
            .with_latency(self.latency)
            .with_idle_timeout(self.idle_timeout)
            .with_queue_capacity(self.queue_capacity);
        let start = Instant::now();
        let par_results = pool.process(self.tasks.clone()).await?;
        let par_time = start.elapsed();
        narrator.line(format!("Workers: {}", pool.num_workers()))?;
        narrator.line(format!("Time: {:.3} seconds", par_time.as_secs_f64()))?;
        narrator.line(format!("Speedup: {:.2}x", speedup(seq_time, par_time)))?;

        narrator.section(5, "Worker Distribution")?;
        for (worker, count) in worker_distribution(&par_results) {
            narrator.line(format!("{}: {} tasks", worker, count))?;
        }

        narrator.section(6, "Real-world Applications")?;
        narrator.bullets(&[
            "Web servers (different requests)",
            "Compilers (lexical analysis, parsing, code gen)",
            "Scientific workflows (different simulations)",
            "Microservices architecture",
        ])?;

        narrator.section(7, "Key Characteristics")?;
        narrator.bullets(&[
            "Different operations/tasks",
            "Tasks may have dependencies",
            "Load balancing can be challenging",
            "Communication patterns vary",
        ])?;

        narrator.section(8, "When to Use Task Parallelism")?;
        narrator.checks(&[
            "Heterogeneous tasks with different operations",
            "Tasks with varying execution times",
            "Independent or loosely coupled tasks",
            "Dynamic task generation",
        ])?;

        narrator.section(9, "Challenges")?;
        narrator.bullets(&[
            "Task dependency management",
            "Load balancing for uneven tasks",
            "Resource contention",
            "Synchronization and coordination",
        ])?;

        Ok(())
    }

    fn compare_with_data_parallelism(&self, narrator: &mut Narrator) -> Result<()> {
        narrator.next_banner("TASK vs DATA PARALLELISM COMPARISON")?;

        narrator.heading("Data Parallelism")?;
        narrator.raw("  Pattern: Same operation, different data")?;
        narrator.raw("  Example: Multiply all elements in array by 2")?;
        narrator.raw("  Communication: Minimal (partition data, combine results)")?;
        narrator.raw("  Load Balancing: Easy (equal-sized chunks)")?;
        narrator.raw("  Scalability: Excellent for regular problems")?;

        narrator.heading("Task Parallelism")?;
        narrator.raw("  Pattern: Different operations, same/different data")?;
        narrator.raw("  Example: Web server handling various requests")?;
        narrator.raw("  Communication: Variable (task dependencies)")?;
        narrator.raw("  Load Balancing: Challenging (uneven task times)")?;
        narrator.raw("  Scalability: Good for independent tasks")?;

        narrator.heading("Hybrid Approach")?;
        narrator.raw("  Many real applications use both:")?;
        narrator.raw("  - Data parallelism within tasks")?;
        narrator.raw("  - Task parallelism between different operations")?;
        narrator.raw("  Example: Video processing pipeline:")?;
        narrator.raw("    • Task 1: Decode frames (data parallel per frame)")?;
        narrator.raw("    • Task 2: Apply filters (data parallel per pixel)")?;
        narrator.raw("    • Task 3: Encode frames (data parallel per frame)")?;
        Ok(())
    }

    fn dynamic_task_generation(&self, narrator: &mut Narrator) -> Result<()> {
        narrator.next_banner("DYNAMIC TASK GENERATION & LOAD BALANCING")?;

        narrator.section(1, "Work Stealing Pattern")?;
        narrator.bullets(&[
            "Each worker has its own task queue",
            "Idle workers steal tasks from busy workers",
            "Dynamic load balancing for uneven workloads",
        ])?;

        narrator.section(2, "Task Dependencies")?;
        narrator.bullets(&[
            "Some tasks depend on others' results",
            "Represented as directed acyclic graph (DAG)",
            "Execute when dependencies are satisfied",
        ])?;

        narrator.section(3, "Example: Image Processing Pipeline")?;
        narrator.lines(&[
            "Tasks with dependencies:",
            "1. Load image → 2. Resize → 3. Filter → 4. Save",
            "Can execute different images in parallel",
            "Each stage can use data parallelism",
        ])?;

        narrator.section(4, "Implementation Strategies")?;
        narrator.bullets(&[
            "Thread pools with work queues",
            "Actor model (message passing)",
            "Task-based parallel libraries",
            "Workflow engines",
        ])?;
        Ok(())
    }

    fn summarize(&self, narrator: &mut Narrator) -> Result<()> {
        narrator.next_banner("SUMMARY")?;
        narrator.raw("Task parallelism is ideal for:")?;
        narrator.numbered(&[
            "Heterogeneous workloads with different operations",
            "Applications with independent or loosely coupled tasks",
            "Dynamic workloads where tasks are generated at runtime",
        ])?;

        narrator.raw("\nCommon patterns:")?;
        narrator.numbered(&[
            "Master-Worker: Central coordinator distributes tasks",
            "Work Stealing: Idle workers take tasks from busy ones",
            "Pipeline: Tasks flow through processing stages",
            "Fork-Join: Split work, process independently, combine",
        ])?;

        narrator.raw("\nTry modifying this code to:")?;
        narrator.numbered(&[
            "Add new task types with different computations",
            "Implement work stealing for better load balancing",
            "Add task dependencies (DAG execution)",
            "Compare with OS threads instead of async tasks",
            "Measure overhead of task queue management",
        ])?;
        Ok(())
    }
}

#[async_trait]
impl Demo for TaskParallelDemo {
    fn name(&self) -> &str {
        "task-parallelism"
    }

    async fn run(&self, narrator: &mut Narrator) -> Result<()> {
        self.demonstrate(narrator).await?;
        self.compare_with_data_parallelism(narrator)?;
        self.dynamic_task_generation(narrator)?;
        self.summarize(narrator)
    }
}
