// src/probe/mod.rs
// =============================================================================
// This module contains the probing pipeline's steps.
//
// Submodules:
// - query: count predicates, literal quoting and response interpretation
// - nulls: the null/empty step run over a layer's fields
// - domains: the coded-value step, with an inner queue per field
// - link: the step that describes a service link and counts its features
//
// Each step turns one work item into one or more ProbeReports and hands
// them to a RenderSink. Steps never fail: every transport or service error
// becomes a Failure result and the queue moves on.
//
// Rust concepts:
// - Enums with data: ProbeResult is either a count or a failure
// - serde attributes: control how reports look as JSON
// - Generics with ?Sized: steps work with concrete types or trait objects
// =============================================================================

mod domains;
mod link;
mod nulls;
mod query;

pub use domains::DomainProber;
pub use link::LinkProber;
pub use nulls::NullProber;
pub use query::{format_elapsed, Literal, Predicate};

use std::time::{Duration, Instant};

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

use crate::client::{QueryClient, ServiceRequest, TransportError};
use crate::service::{DiscoveryError, FieldType};

/// The unit of work a report belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkItem {
    LinkProbe {
        service_url: String,
    },
    FieldNullProbe {
        field_name: String,
        field_type: FieldType,
    },
    DomainValueProbe {
        field_name: String,
        field_type: FieldType,
        coded_value: Value,
        coded_label: String,
    },
}

impl WorkItem {
    pub fn field_name(&self) -> Option<&str> {
        match self {
            WorkItem::LinkProbe { .. } => None,
            WorkItem::FieldNullProbe { field_name, .. }
            | WorkItem::DomainValueProbe { field_name, .. } => Some(field_name),
        }
    }
}

/// Which question a request asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    Metadata,
    NonNull,
    NonEmpty,
    DomainValue,
    FeatureCount,
    ShapeCount,
}

impl ProbeKind {
    pub fn label(self) -> &'static str {
        match self {
            ProbeKind::Metadata => "Service metadata",
            ProbeKind::NonNull => "Features with values",
            ProbeKind::NonEmpty => "Features without empty values",
            ProbeKind::DomainValue => "Features with value",
            ProbeKind::FeatureCount => "Number of features",
            ProbeKind::ShapeCount => "Features with shapes",
        }
    }

    pub fn error_label(self) -> &'static str {
        match self {
            ProbeKind::NonNull | ProbeKind::DomainValue => "Error getting count",
            ProbeKind::NonEmpty => "Error getting non-empty values count",
            ProbeKind::Metadata | ProbeKind::FeatureCount | ProbeKind::ShapeCount => "Error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeResult {
    Count(u64),
    Failure(ProbeFailure),
}

impl ProbeResult {
    /// A count of zero usually points at a data-quality problem, so it is
    /// flagged even though it isn't an error.
    pub fn is_zero(&self) -> bool {
        matches!(self, ProbeResult::Count(0))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ProbeResult::Failure(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProbeFailure {
    /// No usable JSON came back.
    Transport { message: String },
    /// The service answered with an `error` object.
    Application { payload: Map<String, Value> },
}

impl From<TransportError> for ProbeFailure {
    fn from(error: TransportError) -> Self {
        ProbeFailure::Transport {
            message: error.to_string(),
        }
    }
}

impl From<DiscoveryError> for ProbeFailure {
    fn from(error: DiscoveryError) -> Self {
        match error {
            DiscoveryError::Service(payload) => ProbeFailure::Application { payload },
            other => ProbeFailure::Transport {
                message: other.to_string(),
            },
        }
    }
}

/// What a render sink receives: one per request issued.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeReport {
    pub item: WorkItem,
    pub probe: ProbeKind,
    pub result: ProbeResult,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

fn serialize_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(elapsed.as_millis() as u64)
}

/// Issues one count query and times it from just before the request.
pub(crate) async fn count<C>(client: &C, layer: &Url, predicate: &Predicate) -> (ProbeResult, Duration)
where
    C: QueryClient + ?Sized,
{
    let request = ServiceRequest::get(query::count_url(layer, predicate));
    debug!(%predicate, "issuing count query");

    let started = Instant::now();
    let response = client.request(request).await;
    let elapsed = started.elapsed();

    let result = match response {
        Ok(body) => query::interpret(&body),
        Err(error) => ProbeResult::Failure(error.into()),
    };
    if let ProbeResult::Failure(failure) = &result {
        warn!(%predicate, ?failure, "count query failed");
    }
    (result, elapsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_report_serializes_with_tags() {
        let report = ProbeReport {
            item: WorkItem::FieldNullProbe {
                field_name: "NAME".to_string(),
                field_type: FieldType::new("esriFieldTypeString"),
            },
            probe: ProbeKind::NonEmpty,
            result: ProbeResult::Count(42),
            elapsed: Duration::from_millis(1250),
        };

        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({
                "item": {"kind": "field_null_probe", "field_name": "NAME", "field_type": "esriFieldTypeString"},
                "probe": "non_empty",
                "result": {"count": 42},
                "elapsed_ms": 1250
            })
        );
    }

    #[test]
    fn test_failure_serializes_payload() {
        let mut payload = Map::new();
        payload.insert("code".to_string(), json!(500));
        let result = ProbeResult::Failure(ProbeFailure::Application { payload });

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"failure": {"type": "application", "payload": {"code": 500}}})
        );
    }

    #[test]
    fn test_zero_is_flagged_not_failed() {
        assert!(ProbeResult::Count(0).is_zero());
        assert!(!ProbeResult::Count(0).is_failure());
        assert!(!ProbeResult::Count(3).is_zero());
    }

    #[test]
    fn test_discovery_service_error_becomes_application_failure() {
        let mut payload = Map::new();
        payload.insert("code".to_string(), json!(499));
        let failure = ProbeFailure::from(DiscoveryError::Service(payload.clone()));
        assert_eq!(failure, ProbeFailure::Application { payload });
    }
}
