pub mod toml_config;

pub use toml_config::PrimerConfig;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, CommonArgs, DataArgs, Lesson, MpiArgs, TaskArgs};

#[cfg(feature = "cli")]
mod cli {
    use super::PrimerConfig;
    use crate::app::demos::LessonKind;
    use crate::utils::error::Result;
    use crate::utils::validation::{validate_path, Validate};
    use clap::{Args, Parser, Subcommand};
    use serde::{Deserialize, Serialize};

    /// Flags shared by the umbrella CLI and the single-lesson binaries.
    #[derive(Debug, Clone, Default, Serialize, Deserialize, Parser)]
    pub struct CommonArgs {
        /// Optional TOML file with lesson settings
        #[arg(short, long, global = true)]
        pub config: Option<String>,

        #[arg(short, long, global = true, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, global = true, help = "Log CPU and memory usage per lesson")]
        pub monitor: bool,

        #[arg(long, global = true, help = "Emit log lines as JSON")]
        pub log_json: bool,
    }

    impl CommonArgs {
        /// Loads the TOML file if one was given, applies flag overrides and validates.
        pub fn load_config(&self) -> Result<PrimerConfig> {
            let mut config = match &self.config {
                Some(path) => {
                    validate_path("config", path)?;
                    tracing::info!("📁 Loading configuration from: {}", path);
                    PrimerConfig::from_file(path)?
                }
                None => PrimerConfig::default(),
            };

            if self.monitor {
                config.monitoring.enabled = true;
            }

            config.validate()?;
            Ok(config)
        }
    }

    #[derive(Debug, Clone, Parser)]
    #[command(name = "parallel-primer")]
    #[command(about = "Narrated lessons on data parallelism, task parallelism and message passing")]
    pub struct CliConfig {
        #[command(flatten)]
        pub common: CommonArgs,

        /// Lesson to run; all of them when omitted
        #[command(subcommand)]
        pub lesson: Option<Lesson>,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Lesson {
        /// Same operation applied to chunks of one dataset
        Data(DataArgs),
        /// Different operations dispatched to a worker pool
        Task(TaskArgs),
        /// MPI-style ranks exchanging messages
        Mpi(MpiArgs),
        /// Every lesson in order
        All,
    }

    #[derive(Debug, Clone, Default, Args)]
    pub struct DataArgs {
        #[arg(long)]
        pub size: Option<usize>,

        #[arg(long)]
        pub multiplier: Option<f64>,

        #[arg(long)]
        pub workers: Option<usize>,
    }

    #[derive(Debug, Clone, Default, Args)]
    pub struct TaskArgs {
        #[arg(long)]
        pub workers: Option<usize>,

        /// Scale factor for the simulated task latencies
        #[arg(long)]
        pub latency_scale: Option<f64>,
    }

    #[derive(Debug, Clone, Default, Args)]
    pub struct MpiArgs {
        /// Number of ranks, as `mpirun -np` would set it
        #[arg(long)]
        pub ranks: Option<usize>,
    }

    impl Lesson {
        pub fn kinds(&self) -> Vec<LessonKind> {
            match self {
                Lesson::Data(_) => vec![LessonKind::Data],
                Lesson::Task(_) => vec![LessonKind::Task],
                Lesson::Mpi(_) => vec![LessonKind::MessagePassing],
                Lesson::All => LessonKind::ALL.to_vec(),
            }
        }

        pub fn apply_to(&self, config: &mut PrimerConfig) {
            match self {
                Lesson::Data(args) => {
                    if let Some(size) = args.size {
                        config.data.size = size;
                    }
                    if let Some(multiplier) = args.multiplier {
                        config.data.multiplier = multiplier;
                    }
                    if args.workers.is_some() {
                        config.data.workers = args.workers;
                    }
                }
                Lesson::Task(args) => {
                    if args.workers.is_some() {
                        config.task.workers = args.workers;
                    }
                    if let Some(scale) = args.latency_scale {
                        config.task.latency_scale = scale;
                    }
                }
                Lesson::Mpi(args) => {
                    if let Some(ranks) = args.ranks {
                        config.mpi.ranks = ranks;
                    }
                }
                Lesson::All => {}
            }
        }
    }

}
