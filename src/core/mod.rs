pub mod data_parallel;
pub mod engine;
pub mod message_passing;
pub mod task_parallel;

pub use crate::domain::model::{
    BenchmarkReport, ScalingRow, Task, TaskInput, TaskKind, TaskOutput, TaskResult,
};
pub use crate::domain::ports::Demo;
pub use crate::utils::error::Result;
