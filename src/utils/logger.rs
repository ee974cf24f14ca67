use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// How log lines are rendered on stderr. Stdout belongs to the lesson narration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

/// Directive used when `RUST_LOG` is unset.
///
/// Verbose runs also show per-rank and per-worker debug events.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "parallel_primer=debug,info"
    } else {
        "parallel_primer=info,warn"
    }
}

pub fn init_logger(format: LogFormat, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let fmt = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    // Worker and rank tasks hop between runtime threads; ids help when verbose.
    let layer = match format {
        LogFormat::Compact => fmt.with_thread_ids(verbose).compact().boxed(),
        LogFormat::Json => fmt.with_thread_names(true).json().boxed(),
    };

    tracing_subscriber::registry().with(filter).with(layer).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_tracks_verbosity() {
        assert!(default_directive(true).contains("parallel_primer=debug"));
        assert!(default_directive(false).starts_with("parallel_primer=info"));
    }

    #[test]
    fn test_default_directives_parse() {
        for verbose in [true, false] {
            assert!(EnvFilter::try_new(default_directive(verbose)).is_ok());
        }
    }
}
