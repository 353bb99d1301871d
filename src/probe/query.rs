// src/probe/query.rs
// =============================================================================
// Building count queries and reading their answers.
//
// Every probe is a GET against
//   <layer>/query?where=<predicate>&returnGeometry=false&returnCountOnly=true&f=json
// and the service answers either {"count": n} or {"error": {...}}.
// =============================================================================

use std::fmt;
use std::time::Duration;

use serde_json::Value;
use url::Url;

use super::{ProbeFailure, ProbeResult};
use crate::client::service_error;
use crate::service::FieldType;

/// A literal on the right-hand side of an equality predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// Rendered in single quotes, with embedded quotes doubled.
    Text(String),
    /// Rendered as-is.
    Number(String),
}

impl Literal {
    /// Textual fields compare against a quoted string, everything else
    /// against a bare numeric literal. A code that is not a finite number
    /// is quoted whatever the field type, so it can never leak into the
    /// clause as SQL.
    pub fn for_field(code: &Value, field_type: &FieldType) -> Self {
        let raw = match code {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let numeric = raw.parse::<f64>().is_ok_and(f64::is_finite);
        if field_type.is_textual() || !numeric {
            Literal::Text(raw)
        } else {
            Literal::Number(raw)
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Text(text) => write!(f, "'{}'", text.replace('\'', "''")),
            Literal::Number(number) => f.write_str(number),
        }
    }
}

/// The `where` clause of a count query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    NotNull(String),
    NotNullOrEmpty(String),
    Equals { field: String, literal: Literal },
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::NotNull(field) => write!(f, "NOT {field} IS NULL"),
            Predicate::NotNullOrEmpty(field) => write!(f, "NOT {field} IS NULL AND {field} <> ''"),
            Predicate::Equals { field, literal } => write!(f, "{field} = {literal}"),
        }
    }
}

/// `<layer>/query?where=...&returnGeometry=false&returnCountOnly=true&f=json`
pub fn count_url(layer: &Url, predicate: &Predicate) -> Url {
    let mut url = layer.clone();
    let path = format!("{}/query", layer.path().trim_end_matches('/'));
    url.set_path(&path);
    url.set_fragment(None);
    url.query_pairs_mut()
        .clear()
        .append_pair("where", &predicate.to_string())
        .append_pair("returnGeometry", "false")
        .append_pair("returnCountOnly", "true")
        .append_pair("f", "json");
    url
}

/// A count wins over an error; a body with neither is unusable.
pub fn interpret(response: &Value) -> ProbeResult {
    if let Some(count) = response.get("count").and_then(Value::as_u64) {
        return ProbeResult::Count(count);
    }
    if let Some(payload) = service_error(response) {
        return ProbeResult::Failure(ProbeFailure::Application { payload });
    }
    ProbeResult::Failure(ProbeFailure::Transport {
        message: "response carried neither a count nor an error".to_string(),
    })
}

/// Seconds with three decimals from one second up, milliseconds below.
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    if millis >= 1000 {
        format!("{:.3}s", elapsed.as_secs_f64())
    } else {
        format!("{millis}ms")
    }
}
