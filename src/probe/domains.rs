// src/probe/domains.rs
// =============================================================================
// The coded-value step: two nested queues.
//
// The executor drives the outer queue (one entry per field with a
// coded-value domain). For each entry this step drains the entry's own
// inner queue of coded values, one count query per value, and only then
// resumes the outer queue. An entry with no coded values issues nothing.
// =============================================================================

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::{count, Literal, Predicate, ProbeKind, ProbeReport, WorkItem};
use crate::client::QueryClient;
use crate::executor::{Advance, Advanced, Step};
use crate::render::RenderSink;
use crate::service::DomainEntry;

pub struct DomainProber<'a, C: ?Sized, S: ?Sized> {
    client: &'a C,
    layer: &'a Url,
    sink: &'a mut S,
}

impl<'a, C: ?Sized, S: ?Sized> DomainProber<'a, C, S> {
    pub fn new(client: &'a C, layer: &'a Url, sink: &'a mut S) -> Self {
        Self { client, layer, sink }
    }
}

#[async_trait]
impl<'a, C, S> Step<DomainEntry> for DomainProber<'a, C, S>
where
    C: QueryClient + ?Sized,
    S: RenderSink + ?Sized,
{
    async fn step(&mut self, entry: DomainEntry, advance: Advance) -> Advanced {
        let DomainEntry {
            field_name,
            field_type,
            mut values,
        } = entry;
        debug!(field = %field_name, values = values.len(), "draining coded values");

        while let Some(value) = values.pop_front() {
            let predicate = Predicate::Equals {
                field: field_name.clone(),
                literal: Literal::for_field(&value.code, &field_type),
            };
            let (result, elapsed) = count(self.client, self.layer, &predicate).await;

            self.sink.render(ProbeReport {
                item: WorkItem::DomainValueProbe {
                    field_name: field_name.clone(),
                    field_type: field_type.clone(),
                    coded_value: value.code,
                    coded_label: value.label,
                },
                probe: ProbeKind::DomainValue,
                result,
                elapsed,
            });
        }

        advance.resume()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{Executor, WorkQueue};
    use crate::probe::ProbeResult;
    use crate::service::{CodedValue, FieldType};
    use crate::testing::{EventLog, LoggingSink, ScriptedClient};
    use serde_json::{json, Value};

    fn layer() -> Url {
        Url::parse("https://host/arcgis/rest/services/Roads/FeatureServer/1").unwrap()
    }

    fn entry(field: &str, field_type: &str, codes: &[(Value, &str)]) -> DomainEntry {
        DomainEntry {
            field_name: field.to_string(),
            field_type: FieldType::new(field_type),
            values: codes
                .iter()
                .map(|(code, label)| CodedValue {
                    code: code.clone(),
                    label: label.to_string(),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_inner_queue_drains_before_next_field() {
        let log = EventLog::default();
        let client = ScriptedClient::with_log(
            vec![
                Ok(json!({"count": 10})),
                Ok(json!({"count": 0})),
                Ok(json!({"count": 4})),
            ],
            log.clone(),
        );
        let mut sink = LoggingSink::with_log(log.clone());
        let url = layer();

        let queue = WorkQueue::new([
            entry("STATUS", "esriFieldTypeString", &[(json!("O"), "Open"), (json!("C"), "Closed")]),
            entry("LANES", "esriFieldTypeSmallInteger", &[(json!(2), "Two")]),
        ]);
        let mut prober = DomainProber::new(&client, &url, &mut sink);
        let summary = Executor::new("domains").run(queue, &mut prober, |_| {}).await;

        assert_eq!(summary.processed, 2);
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "request:STATUS = 'O'",
                "render:STATUS",
                "request:STATUS = 'C'",
                "render:STATUS",
                "request:LANES = 2",
                "render:LANES",
            ]
        );
        assert!(sink.reports[1].result.is_zero());
        assert_eq!(
            sink.reports[1].item,
            WorkItem::DomainValueProbe {
                field_name: "STATUS".to_string(),
                field_type: FieldType::new("esriFieldTypeString"),
                coded_value: json!("C"),
                coded_label: "Closed".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_empty_domain_issues_no_requests() {
        let client = ScriptedClient::new(vec![Ok(json!({"count": 3}))]);
        let mut sink = LoggingSink::default();
        let url = layer();

        let queue = WorkQueue::new([
            entry("EMPTY", "esriFieldTypeInteger", &[]),
            entry("KIND", "esriFieldTypeInteger", &[(json!(1), "One")]),
        ]);
        let mut prober = DomainProber::new(&client, &url, &mut sink);
        let summary = Executor::new("domains").run(queue, &mut prober, |_| {}).await;

        assert_eq!(summary.processed, 2);
        assert_eq!(client.where_clauses(), vec!["KIND = 1"]);
        assert_eq!(sink.reports.len(), 1);
        assert_eq!(sink.reports[0].result, ProbeResult::Count(3));
    }

    #[tokio::test]
    async fn test_failed_value_does_not_stop_the_field() {
        let client = ScriptedClient::new(vec![
            Ok(json!({"error": {"code": 400, "message": "Invalid query"}})),
            Ok(json!({"count": 8})),
        ]);
        let mut sink = LoggingSink::default();
        let url = layer();

        let queue = WorkQueue::new([entry(
            "ZONE",
            "esriFieldTypeString",
            &[(json!("R-1"), "Residential"), (json!("C-2"), "Commercial")],
        )]);
        let mut prober = DomainProber::new(&client, &url, &mut sink);
        Executor::new("domains").run(queue, &mut prober, |_| {}).await;

        assert_eq!(sink.reports.len(), 2);
        assert!(sink.reports[0].result.is_failure());
        assert_eq!(sink.reports[1].result, ProbeResult::Count(8));
    }
}
