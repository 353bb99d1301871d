// src/render/collect.rs
// =============================================================================
// A sink that just remembers everything it is given.
//
// Used when output has to be grouped after the fact (the per-field report)
// or serialized in one go (--json).
// =============================================================================

use serde::Serialize;

use super::RenderSink;
use crate::probe::{ProbeReport, WorkItem};
use crate::service::ServiceSummary;

#[derive(Debug, Clone, Serialize)]
pub struct DescribedService {
    pub item: WorkItem,
    pub summary: ServiceSummary,
}

#[derive(Debug, Default)]
pub struct CollectingSink {
    pub reports: Vec<ProbeReport>,
    pub services: Vec<DescribedService>,
}

impl CollectingSink {
    pub fn failures(&self) -> usize {
        self.reports.iter().filter(|r| r.result.is_failure()).count()
    }
}

impl RenderSink for CollectingSink {
    fn render(&mut self, report: ProbeReport) {
        self.reports.push(report);
    }

    fn describe_service(&mut self, item: &WorkItem, summary: &ServiceSummary) {
        self.services.push(DescribedService {
            item: item.clone(),
            summary: summary.clone(),
        });
    }
}
