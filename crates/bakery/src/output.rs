//! Terminal output utilities

use bakery_tools::TargetResult;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

/// Print a warning message
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Print a header
pub fn header(msg: &str) {
    println!("\n{}", style(msg).bold().underlined());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}

/// Create a spinner
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// How one target fared in a tool batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed(String),
    /// Completed, but with findings worth attention
    Flagged(String),
    /// Message plus `(label, detail)` lines
    Failed(String, Vec<(String, String)>),
}

impl Outcome {
    fn of<T>(result: &TargetResult<T>, judge: &impl Fn(&T) -> Outcome) -> Outcome {
        match &result.result {
            Ok(value) => judge(value),
            Err(e) => Outcome::Failed(e.to_string(), Vec::new()),
        }
    }
}

/// One-line tally of a batch, e.g. "3 targets: 2 passed, 1 failed"
pub fn batch_summary(outcomes: &[Outcome]) -> String {
    let (mut passed, mut flagged, mut failed) = (0, 0, 0);
    for outcome in outcomes {
        match outcome {
            Outcome::Passed(_) => passed += 1,
            Outcome::Flagged(_) => flagged += 1,
            Outcome::Failed(..) => failed += 1,
        }
    }

    let mut parts = vec![format!("{} passed", passed)];
    if flagged > 0 {
        parts.push(format!("{} flagged", flagged));
    }
    if failed > 0 {
        parts.push(format!("{} failed", failed));
    }
    format!("{} targets: {}", outcomes.len(), parts.join(", "))
}

/// Print a header, one line per target uid, then the tally
pub fn target_results<T>(
    title: &str,
    results: &[TargetResult<T>],
    judge: impl Fn(&T) -> Outcome,
) {
    header(title);
    let outcomes: Vec<Outcome> = results.iter().map(|r| Outcome::of(r, &judge)).collect();
    for (result, outcome) in results.iter().zip(&outcomes) {
        match outcome {
            Outcome::Passed(msg) => success(&format!("{}: {}", result.uid, msg)),
            Outcome::Flagged(msg) => warning(&format!("{}: {}", result.uid, msg)),
            Outcome::Failed(msg, details) => {
                error(&format!("{}: {}", result.uid, msg));
                for (label, detail) in details {
                    kv(label, detail);
                }
            }
        }
    }
    info(&batch_summary(&outcomes));
}
