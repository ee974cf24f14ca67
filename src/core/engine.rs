use crate::domain::ports::Demo;
use crate::utils::error::Result;
use crate::utils::monitor::LessonMonitor;
use crate::utils::narration::Narrator;

/// Runs lessons one after another, recording resource usage per lesson.
pub struct DemoEngine {
    demos: Vec<Box<dyn Demo>>,
    monitor: LessonMonitor,
}

impl DemoEngine {
    pub fn new() -> Self {
        Self::new_with_monitoring(false)
    }

    pub fn new_with_monitoring(monitor_enabled: bool) -> Self {
        Self {
            demos: Vec::new(),
            monitor: LessonMonitor::new(monitor_enabled),
        }
    }

    pub fn add_demo(&mut self, demo: Box<dyn Demo>) {
        self.demos.push(demo);
    }

    pub fn with_demo(mut self, demo: Box<dyn Demo>) -> Self {
        self.add_demo(demo);
        self
    }

    pub fn monitor(&self) -> &LessonMonitor {
        &self.monitor
    }

    pub fn demo_names(&self) -> Vec<&str> {
        self.demos.iter().map(|d| d.name()).collect()
    }

    /// Returns the number of lessons that ran.
    pub async fn run(&self, narrator: &mut Narrator) -> Result<usize> {
        narrator.raw(format!("System has {} CPU cores", num_cpus::get()))?;

        for (i, demo) in self.demos.iter().enumerate() {
            if i > 0 {
                narrator.raw("")?;
            }
            tracing::info!("▶️ Running lesson: {}", demo.name());
            self.monitor.start_lesson();
            demo.run(narrator).await?;
            narrator.flush()?;
            self.monitor.finish_lesson(demo.name());
        }

        self.monitor.log_summary();
        Ok(self.demos.len())
    }
}

impl Default for DemoEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct EchoDemo {
        name: String,
    }

    #[async_trait]
    impl Demo for EchoDemo {
        fn name(&self) -> &str {
            &self.name
        }

        async fn run(&self, narrator: &mut Narrator) -> Result<()> {
            narrator.banner(&self.name)
        }
    }

    #[tokio::test]
    async fn test_engine_runs_demos_in_order() {
        let engine = DemoEngine::new()
            .with_demo(Box::new(EchoDemo {
                name: "FIRST".to_string(),
            }))
            .with_demo(Box::new(EchoDemo {
                name: "SECOND".to_string(),
            }));
        assert_eq!(engine.demo_names(), vec!["FIRST", "SECOND"]);

        let (mut narrator, buffer) = Narrator::capture();
        let ran = engine.run(&mut narrator).await.unwrap();
        assert_eq!(ran, 2);

        let output = buffer.contents();
        assert!(output.starts_with("System has "));
        let first = output.find("FIRST").unwrap();
        let second = output.find("SECOND").unwrap();
        assert!(first < second);
    }

    #[tokio::test]
    async fn test_engine_without_monitoring_keeps_no_history() {
        let engine = DemoEngine::new().with_demo(Box::new(EchoDemo {
            name: "ONLY".to_string(),
        }));
        let (mut narrator, _buffer) = Narrator::capture();
        engine.run(&mut narrator).await.unwrap();

        assert!(!engine.monitor().is_enabled());
        assert!(engine.monitor().history().is_empty());
    }

    #[tokio::test]
    async fn test_engine_without_demos() {
        let (mut narrator, _buffer) = Narrator::capture();
        assert_eq!(DemoEngine::default().run(&mut narrator).await.unwrap(), 0);
    }
}
