// src/config/template.rs

//! Template rendering applied to a config file before it is parsed as TOML.
//!
//! ```toml
//! [job.extract]
//! script = "python extract.py --day {{ 'yesterday' | date('%Y%m%d') }}"
//! ```

use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Days, Local, NaiveDate};
use minijinja::{Environment, Error, ErrorKind, UndefinedBehavior, context};

use crate::errors::{DagrunError, Result};

/// Format used by `date` when none is given.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Render `source` (named `name` in error messages).
///
/// Undefined variables are errors rather than empty strings.
pub fn render_config(name: &str, source: &str) -> Result<String> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.add_filter("date", date_filter);

    env.render_named_str(name, source, context! {})
        .map_err(|err| DagrunError::ConfigError(format!("failed to render '{name}': {err}")))
}

fn date_filter(value: String, format: Option<String>) -> std::result::Result<String, Error> {
    let format = format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT);

    let when = resolve_date(&value, Local::now()).ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("cannot interpret '{value}' as a date"),
        )
    })?;

    format_date(&when, format).ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("invalid date format '{format}'"),
        )
    })
}

/// Interpret a date expression relative to `now`.
///
/// Accepts `now`, `today`, `yesterday`, `tomorrow`, `N day(s)|week(s) ago`,
/// `in N day(s)|week(s)` and ISO `YYYY-MM-DD` (midnight local time).
pub fn resolve_date(expr: &str, now: DateTime<Local>) -> Option<DateTime<Local>> {
    let expr = expr.trim().to_lowercase();

    match expr.as_str() {
        "now" | "today" => return Some(now),
        "yesterday" => return now.checked_sub_days(Days::new(1)),
        "tomorrow" => return now.checked_add_days(Days::new(1)),
        _ => {}
    }

    if let Ok(date) = NaiveDate::parse_from_str(&expr, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0)?.and_local_timezone(Local).earliest();
    }

    let words: Vec<&str> = expr.split_whitespace().collect();
    let (count, unit, forward) = match words.as_slice() {
        [count, unit, "ago"] => (*count, *unit, false),
        ["in", count, unit] => (*count, *unit, true),
        _ => return None,
    };

    let count: u64 = count.parse().ok()?;
    let days = match unit {
        "day" | "days" => count,
        "week" | "weeks" => count.checked_mul(7)?,
        _ => return None,
    };

    if forward {
        now.checked_add_days(Days::new(days))
    } else {
        now.checked_sub_days(Days::new(days))
    }
}

/// strftime-format `when`; `None` if `format` has an invalid specifier.
pub fn format_date(when: &DateTime<Local>, format: &str) -> Option<String> {
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return None;
    }

    let mut out = String::new();
    write!(out, "{}", when.format_with_items(items.iter())).ok()?;
    Some(out)
}
