pub mod data_demo;
pub mod mpi_demo;
pub mod task_demo;

pub use data_demo::DataParallelDemo;
pub use mpi_demo::MessagePassingDemo;
pub use task_demo::TaskParallelDemo;

use crate::config::PrimerConfig;
use crate::core::engine::DemoEngine;
use crate::domain::ports::Demo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonKind {
    Data,
    Task,
    MessagePassing,
}

impl LessonKind {
    pub const ALL: [LessonKind; 3] = [LessonKind::Data, LessonKind::Task, LessonKind::MessagePassing];

    pub fn demo(&self, config: &PrimerConfig) -> Box<dyn Demo> {
        match self {
            LessonKind::Data => Box::new(DataParallelDemo::from_config(config)),
            LessonKind::Task => Box::new(TaskParallelDemo::from_config(config)),
            LessonKind::MessagePassing => Box::new(MessagePassingDemo::from_config(config)),
        }
    }
}

pub fn build_engine(lessons: &[LessonKind], config: &PrimerConfig) -> DemoEngine {
    let mut engine = DemoEngine::new_with_monitoring(config.monitoring_enabled());
    for lesson in lessons {
        engine.add_demo(lesson.demo(config));
    }
    engine
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_engine_keeps_lesson_order() {
        let config = PrimerConfig::default();
        let engine = build_engine(&LessonKind::ALL, &config);
        assert_eq!(
            engine.demo_names(),
            vec!["data-parallelism", "task-parallelism", "message-passing"]
        );

        let engine = build_engine(&[LessonKind::MessagePassing], &config);
        assert_eq!(engine.demo_names(), vec!["message-passing"]);
    }
}
