//! Readable descriptions of SQL failures inside a migration batch.

use sqlx::postgres::{PgDatabaseError, PgErrorPosition};

const EXCERPT_RADIUS: usize = 2;

/// What PostgreSQL told us about a failed statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFailure {
    pub message: String,
    /// 1-indexed line of the batch the server pointed at
    pub line: Option<usize>,
    pub code: Option<String>,
    pub detail: Option<String>,
    pub hint: Option<String>,
}

impl SqlFailure {
    pub fn from_sqlx(error: &sqlx::Error, sql: &str) -> Self {
        if let Some(db_error) = error.as_database_error()
            && let Some(pg_error) = db_error.try_downcast_ref::<PgDatabaseError>()
        {
            let position = pg_error.position().map(|pos| match pos {
                PgErrorPosition::Original(p) => p,
                PgErrorPosition::Internal { position, .. } => position,
            });

            return Self {
                message: pg_error.message().to_string(),
                line: position.map(|p| line_at(sql, p)),
                code: Some(pg_error.code().to_string()),
                detail: pg_error.detail().map(str::to_string),
                hint: pg_error.hint().map(str::to_string),
            };
        }

        Self {
            message: error.to_string(),
            line: None,
            code: None,
            detail: None,
            hint: None,
        }
    }

    /// Multi-line description including an excerpt of `sql` around the
    /// failing line.
    pub fn render(&self, sql: &str) -> String {
        let mut out = match (&self.code, self.line) {
            (Some(code), Some(line)) => format!("[{}] {} (line {})", code, self.message, line),
            (Some(code), None) => format!("[{}] {}", code, self.message),
            (None, _) => self.message.clone(),
        };

        if let Some(detail) = &self.detail {
            out.push_str(&format!("\n  Detail: {}", detail));
        }
        if let Some(hint) = &self.hint {
            out.push_str(&format!("\n  Hint: {}", hint));
        }
        if let Some(line) = self.line {
            out.push('\n');
            out.push_str(&excerpt(sql, line));
        }
        out
    }
}

/// Line containing the 1-indexed character `position`
pub fn line_at(sql: &str, position: usize) -> usize {
    sql.chars()
        .take(position.saturating_sub(1))
        .filter(|c| *c == '\n')
        .count()
        + 1
}

fn excerpt(sql: &str, line: usize) -> String {
    let first = line.saturating_sub(EXCERPT_RADIUS).max(1);

    sql.lines()
        .enumerate()
        .map(|(idx, text)| (idx + 1, text))
        .skip(first - 1)
        .take_while(|(number, _)| *number <= line + EXCERPT_RADIUS)
        .map(|(number, text)| {
            let marker = if number == line { '>' } else { ' ' };
            format!("  {} {:4} | {}", marker, number, text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
