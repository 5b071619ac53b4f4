use crate::migrate::{ApplyReport, PendingReport};
use crate::migration::MigrationDescriptor;
use console::style;
use std::time::Duration;

const APPLIED_LABEL: &str = "Migrations completed:";
const PENDING_LABEL: &str = "Pending migrations:";

/// Renders command results for the terminal.
///
/// Every `render_*` method returns the text, `print_*` writes it to stdout.
pub struct RunReporter {
    quiet: bool,
}

impl RunReporter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    pub fn render_applied(&self, report: &ApplyReport, elapsed: Duration) -> String {
        let width = column_width(&report.applied, APPLIED_LABEL);
        let mut out = String::new();

        if !self.quiet {
            for migration in &report.applied {
                out.push_str(&migration_line(
                    style("⇈").blue().to_string(),
                    style(&migration.filename).yellow().to_string(),
                    migration,
                    width,
                ));
            }
        }

        out.push_str(&format!(
            "{}\t{:<width$}\t{} {}\n",
            style("✓").green(),
            APPLIED_LABEL,
            style(report.persisted().len()).magenta().bold(),
            style(format!("({})", format_duration(elapsed))).dim(),
            width = width
        ));
        out
    }

    pub fn render_failure(&self, report: &ApplyReport) -> Option<String> {
        let failure = report.failure.as_ref()?;

        let outcome = if report.transactional {
            "transaction rolled back, no migration of this run was kept".to_string()
        } else if report.applied.is_empty() {
            "no migration of this run was committed".to_string()
        } else {
            let kept: Vec<&str> = report.applied.iter().map(|m| m.filename.as_str()).collect();
            format!("still committed: {}", kept.join(", "))
        };

        Some(format!(
            "{}\t{} {}: {:#}\n\t{}\n",
            style("✗").red(),
            style("Migration failed").red().bold(),
            style(&failure.migration.filename).yellow(),
            failure.error,
            style(outcome).red()
        ))
    }

    pub fn render_pending(&self, report: &PendingReport, with_history: bool) -> String {
        let width = column_width(&report.pending, PENDING_LABEL);
        let mut out = String::new();

        if !self.quiet {
            for migration in &report.pending {
                out.push_str(&migration_line(
                    style("⇉").blue().to_string(),
                    style(&migration.filename).yellow().bold().to_string(),
                    migration,
                    width,
                ));
            }
        }

        let history = if with_history {
            format!(
                "/{} ({} done)",
                style(report.total()).magenta().bold(),
                style(report.history).green().bold()
            )
        } else {
            String::new()
        };

        out.push_str(&format!(
            "{}\t{:<width$}\t{}{}\n",
            style("ⓘ").cyan(),
            PENDING_LABEL,
            style(report.pending.len()).magenta().bold(),
            history,
            width = width
        ));

        if with_history && let Some(last) = &report.last {
            out.push_str(&format!(
                "\tLast applied: {} at {}\n",
                style(&last.filename).yellow(),
                last.applied_at.format("%Y-%m-%d %H:%M:%S UTC")
            ));
        }
        out
    }

    pub fn render_created(&self, migration: &MigrationDescriptor) -> String {
        format!(
            "{}\tMigration file created:\t\t{}\n",
            style("✓").green(),
            style(&migration.filename).magenta().bold()
        )
    }

    pub fn print_applied(&self, report: &ApplyReport, elapsed: Duration) {
        print!("{}", self.render_applied(report, elapsed));
    }

    pub fn print_failure(&self, report: &ApplyReport) {
        if let Some(text) = self.render_failure(report) {
            eprint!("{}", text);
        }
    }

    pub fn print_pending(&self, report: &PendingReport, with_history: bool) {
        print!("{}", self.render_pending(report, with_history));
    }

    pub fn print_created(&self, migration: &MigrationDescriptor) {
        print!("{}", self.render_created(migration));
    }
}

fn column_width(migrations: &[MigrationDescriptor], label: &str) -> usize {
    migrations
        .iter()
        .map(|m| m.filename.chars().count())
        .fold(label.len(), usize::max)
}

fn migration_line(
    marker: String,
    name: String,
    migration: &MigrationDescriptor,
    width: usize,
) -> String {
    let padding = " ".repeat(width.saturating_sub(migration.filename.chars().count()));
    format!(
        "{}\t{}{}\t{}\n",
        marker,
        name,
        padding,
        style(migration.timestamp).magenta().bold()
    )
}

pub(crate) fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let millis = d.subsec_millis();

    if total_secs == 0 {
        format!("{}ms", millis)
    } else if total_secs < 60 {
        if millis > 0 {
            format!("{}.{}s", total_secs, millis / 100)
        } else {
            format!("{}s", total_secs)
        }
    } else {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        if secs > 0 {
            format!("{}m{}s", mins, secs)
        } else {
            format!("{}m", mins)
        }
    }
}
