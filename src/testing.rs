// src/testing.rs
// =============================================================================
// Test doubles shared by the unit tests of several modules.
//
// ScriptedClient answers requests from a prepared list and records what it
// was asked. LoggingSink collects reports. Both can write into one shared
// event log so tests can check how requests and renders interleave.
// =============================================================================

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::client::{QueryClient, ServiceRequest, TransportError};
use crate::probe::{ProbeReport, WorkItem};
use crate::render::RenderSink;
use crate::service::ServiceSummary;

pub type EventLog = Arc<Mutex<Vec<String>>>;

pub struct ScriptedClient {
    responses: Mutex<VecDeque<Result<Value, TransportError>>>,
    requests: Mutex<Vec<ServiceRequest>>,
    log: EventLog,
}

impl ScriptedClient {
    pub fn new(responses: Vec<Result<Value, TransportError>>) -> Self {
        Self::with_log(responses, EventLog::default())
    }

    pub fn with_log(responses: Vec<Result<Value, TransportError>>, log: EventLog) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
            log,
        }
    }

    pub fn requests(&self) -> Vec<ServiceRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The `where` parameter of every request, in issue order.
    pub fn where_clauses(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(|request| {
                request
                    .endpoint
                    .query_pairs()
                    .find(|(key, _)| key == "where")
                    .map(|(_, value)| value.into_owned())
            })
            .collect()
    }
}

#[async_trait]
impl QueryClient for ScriptedClient {
    async fn request(&self, request: ServiceRequest) -> Result<Value, TransportError> {
        let label = request
            .endpoint
            .query_pairs()
            .find(|(key, _)| key == "where")
            .map(|(_, value)| value.into_owned())
            .unwrap_or_else(|| request.endpoint.path().to_string());
        self.log.lock().unwrap().push(format!("request:{label}"));
        self.requests.lock().unwrap().push(request);

        // Let other queues run, as a real request would
        tokio::task::yield_now().await;

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("no scripted response left".into())))
    }
}

#[derive(Default)]
pub struct LoggingSink {
    pub reports: Vec<ProbeReport>,
    pub summaries: Vec<(WorkItem, ServiceSummary)>,
    log: EventLog,
}

impl LoggingSink {
    pub fn with_log(log: EventLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }
}

impl RenderSink for LoggingSink {
    fn render(&mut self, report: ProbeReport) {
        let field = report.item.field_name().unwrap_or("-").to_string();
        self.log.lock().unwrap().push(format!("render:{field}"));
        self.reports.push(report);
    }

    fn describe_service(&mut self, item: &WorkItem, summary: &ServiceSummary) {
        self.summaries.push((item.clone(), summary.clone()));
    }
}
