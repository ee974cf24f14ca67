use clap::Parser;
use parallel_primer::app::runner;
use parallel_primer::{CliConfig, LessonKind};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    runner::init_logging(&cli.common);
    tracing::info!("Starting parallel-primer");

    let lessons = match &cli.lesson {
        Some(lesson) => lesson.kinds(),
        None => LessonKind::ALL.to_vec(),
    };

    let code = runner::run_lessons(&cli.common, &lessons, cli.lesson.as_ref()).await;
    if code > 0 {
        std::process::exit(code);
    }
}
