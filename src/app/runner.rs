use crate::app::demos::{build_engine, LessonKind};
use crate::config::{CommonArgs, Lesson};
use crate::utils::error::{ErrorSeverity, PrimerError};
use crate::utils::logger::{self, LogFormat};
use crate::utils::narration::Narrator;
use crate::utils::validation::Validate;

pub fn init_logging(common: &CommonArgs) {
    let format = if common.log_json {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    logger::init_logger(format, common.verbose);
}

pub fn exit_code(error: &PrimerError) -> i32 {
    match error.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn report(error: &PrimerError) {
    tracing::error!(
        "❌ Lesson failed: {} (Category: {:?}, Severity: {:?})",
        error,
        error.category(),
        error.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", error.recovery_suggestion());

    eprintln!("❌ {}", error.user_friendly_message());
    eprintln!("💡 Suggestion: {}", error.recovery_suggestion());
}

/// Loads config, runs the chosen lessons on stdout and returns the process exit code.
pub async fn run_lessons(
    common: &CommonArgs,
    lessons: &[LessonKind],
    overrides: Option<&Lesson>,
) -> i32 {
    let mut config = match common.load_config() {
        Ok(config) => config,
        Err(e) => {
            report(&e);
            return exit_code(&e);
        }
    };

    if let Some(lesson) = overrides {
        lesson.apply_to(&mut config);
        if let Err(e) = config.validate() {
            report(&e);
            return exit_code(&e);
        }
    }

    if common.verbose {
        tracing::debug!("Lesson config: {:?}", config);
    }
    if config.monitoring_enabled() {
        tracing::info!("🔍 System monitoring enabled");
    }

    let engine = build_engine(lessons, &config);
    let mut narrator = Narrator::stdout();

    match engine.run(&mut narrator).await {
        Ok(count) => {
            tracing::info!("✅ {} lesson(s) completed", count);
            0
        }
        Err(e) => {
            report(&e);
            exit_code(&e)
        }
    }
}
