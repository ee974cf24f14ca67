use clap::Parser;
use parallel_primer::app::runner;
use parallel_primer::{CommonArgs, LessonKind};

/// Runs the task-parallelism lesson on its own.
#[derive(Parser)]
#[command(name = "task_parallel_demo")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    runner::init_logging(&args.common);

    let code = runner::run_lessons(&args.common, &[LessonKind::Task], None).await;
    if code > 0 {
        std::process::exit(code);
    }
}
