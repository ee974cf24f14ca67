use clap::Parser;
use parallel_primer::app::runner;
use parallel_primer::{CommonArgs, LessonKind};

/// Runs the message-passing lesson on its own.
#[derive(Parser)]
#[command(name = "mpi_hello_world")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    runner::init_logging(&args.common);

    let code = runner::run_lessons(&args.common, &[LessonKind::MessagePassing], None).await;
    if code > 0 {
        std::process::exit(code);
    }
}
