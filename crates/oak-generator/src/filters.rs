//! Formatting filters available to every template.
//!
//! Filters are pure functions registered by name on the environment:
//!
//! - `number(decimals=0)` - thousands separated number
//! - `percent(decimals=1)` - fraction shown as a percentage
//! - `author_name(style="full")` - `full`, `last_first`, `initials` or `last`
//! - `date(format="%B %-d, %Y")` - ISO date or RFC 3339 timestamp, strftime output
//! - `excerpt(words=50)` - first words of a text
//! - `filter_rows(field, value)` - rows whose `field` equals `value`
//! - `markdown` - Markdown to HTML
//!
//! ```rust,ignore
//! let mut env = minijinja::Environment::new();
//! register_filters(&mut env);
//! ```

use std::fmt::Write;

use chrono::{DateTime, NaiveDate};
use minijinja::{Environment, Error, ErrorKind, Value, value::ValueKind};
use pulldown_cmark::{Options, Parser, html};

/// Default output of the `date` filter.
pub const DEFAULT_DATE_FORMAT: &str = "%B %-d, %Y";

/// Default word count of the `excerpt` filter.
pub const DEFAULT_EXCERPT_WORDS: usize = 50;

/// Registers Oak's filters with a MiniJinja environment.
pub fn register_filters(env: &mut Environment<'static>) {
    env.add_filter("number", number);
    env.add_filter("percent", percent);
    env.add_filter("author_name", author_name);
    env.add_filter("date", date);
    env.add_filter("excerpt", excerpt);
    env.add_filter("filter_rows", filter_rows);
    env.add_filter("markdown", markdown);
}

fn invalid(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidOperation, message.into())
}

/// Numbers pass through; text is parsed.
fn to_number(value: &Value, filter: &str) -> Result<f64, Error> {
    let number = if value.kind() == ValueKind::Number {
        f64::try_from(value.clone()).ok()
    } else {
        value.to_string().trim().parse::<f64>().ok()
    };
    number
        .filter(|n| n.is_finite())
        .ok_or_else(|| invalid(format!("{filter} filter expects a number, got {value:?}")))
}

fn number(value: Value, decimals: Option<usize>) -> Result<String, Error> {
    let n = to_number(&value, "number")?;
    Ok(group_thousands(&format!("{:.*}", decimals.unwrap_or(0), n)))
}

fn percent(value: Value, decimals: Option<usize>) -> Result<String, Error> {
    let n = to_number(&value, "percent")?;
    Ok(format!("{:.*}%", decimals.unwrap_or(1), n * 100.0))
}

/// Insert `,` every three digits of the integer part.
fn group_thousands(formatted: &str) -> String {
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted),
    };
    let (int, frac) = match unsigned.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (unsigned, None),
    };

    let mut out = String::from(sign);
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if let Some(frac) = frac {
        out.push('.');
        out.push_str(frac);
    }
    out
}

fn author_name(value: Value, style: Option<String>) -> Result<String, Error> {
    let text = value.to_string();
    let text = text.trim();

    // "Last, First" or "First Middle Last"
    let (first, last) = match text.split_once(',') {
        Some((last, first)) => (first.trim(), last.trim()),
        None => match text.rsplit_once(char::is_whitespace) {
            Some((first, last)) => (first.trim(), last),
            None => ("", text),
        },
    };

    let joined = |parts: &[&str]| {
        parts
            .iter()
            .filter(|p| !p.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    };

    match style.as_deref().unwrap_or("full") {
        "full" => Ok(joined(&[first, last])),
        "last_first" if first.is_empty() => Ok(last.to_string()),
        "last_first" => Ok(format!("{last}, {first}")),
        "initials" => {
            let initials = first
                .split_whitespace()
                .filter_map(|w| w.chars().next())
                .map(|c| format!("{c}."))
                .collect::<Vec<_>>()
                .join(" ");
            Ok(joined(&[initials.as_str(), last]))
        }
        "last" => Ok(last.to_string()),
        other => Err(invalid(format!("unknown author_name style {other:?}"))),
    }
}

fn date(value: Value, format: Option<String>) -> Result<String, Error> {
    let text = value.to_string();
    let text = text.trim();
    let format = format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT);

    let mut out = String::new();
    let written = if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        write!(out, "{}", timestamp.format(format))
    } else if let Ok(day) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        write!(out, "{}", day.format(format))
    } else {
        return Err(invalid(format!("date filter cannot parse {text:?}")));
    };
    written.map_err(|_| invalid(format!("invalid date format {format:?} for {text:?}")))?;
    Ok(out)
}

fn excerpt(value: Value, words: Option<usize>) -> String {
    let limit = words.unwrap_or(DEFAULT_EXCERPT_WORDS);
    let text = value.to_string();
    let mut iter = text.split_whitespace();
    let kept: Vec<&str> = iter.by_ref().take(limit).collect();
    let mut out = kept.join(" ");
    if iter.next().is_some() {
        out.push('…');
    }
    out
}

fn filter_rows(value: Value, field: String, expected: Value) -> Result<Value, Error> {
    let expected = expected.to_string();
    let rows: Vec<Value> = value
        .try_iter()?
        .filter(|row| {
            row.get_attr(&field)
                .is_ok_and(|v| !v.is_undefined() && v.to_string() == expected)
        })
        .collect();
    Ok(Value::from(rows))
}

fn markdown(value: Value) -> Value {
    let text = value.to_string();
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(&text, options));
    Value::from_safe_string(out)
}
