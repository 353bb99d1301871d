// src/render/terminal.rs
// =============================================================================
// Human-readable output.
//
// The *_lines functions only format; TerminalSink writes their output as
// reports arrive. Keeping the formatting pure lets the tests look at the
// exact text without capturing stdout.
//
// Output looks like:
//   🔗 https://host/arcgis/rest/services/Roads/MapServer/0
//      Spatial reference: 3857 (dynamic)
//      Number of features: 1204 (response time: 87ms)
//      Features with shapes: 0 !!! (response time: 1.204s)
// =============================================================================

use std::io::{self, Write};

use serde_json::{Map, Value};

use super::{un_camel_case, RenderSink};
use crate::probe::{format_elapsed, ProbeFailure, ProbeKind, ProbeReport, ProbeResult, WorkItem};
use crate::service::{FieldDescriptor, ServiceSummary};

const ZERO_FLAG: &str = " !!!";
const INDENT: &str = "   ";

/// Lines for one report. Failure payloads become an indented sub-list.
pub fn report_lines(report: &ProbeReport) -> Vec<String> {
    let label = match &report.item {
        WorkItem::DomainValueProbe { coded_label, .. } => coded_label.as_str(),
        _ => report.probe.label(),
    };

    match &report.result {
        ProbeResult::Count(n) => {
            let flag = if *n == 0 { ZERO_FLAG } else { "" };
            if report.probe == ProbeKind::DomainValue {
                vec![format!("{label}: {n}{flag}")]
            } else {
                vec![format!(
                    "{label}: {n}{flag} (response time: {})",
                    format_elapsed(report.elapsed)
                )]
            }
        }
        ProbeResult::Failure(failure) => {
            let heading = match &report.item {
                WorkItem::DomainValueProbe { coded_label, .. } => {
                    format!("{} ({coded_label})", report.probe.error_label())
                }
                _ => report.probe.error_label().to_string(),
            };
            match failure {
                ProbeFailure::Transport { message } => vec![format!("{heading}: {message}")],
                ProbeFailure::Application { payload } => {
                    let mut lines = Vec::new();
                    push_sub_list(&mut lines, &heading, Some(payload));
                    lines
                }
            }
        }
    }
}

pub fn summary_lines(summary: &ServiceSummary) -> Vec<String> {
    let mut lines = Vec::new();

    match (&summary.spatial_reference, summary.cache) {
        (Some(sr), Some(cache)) => lines.push(format!("Spatial reference: {sr} ({cache})")),
        (Some(sr), None) => lines.push(format!("Spatial reference: {sr}")),
        (None, _) => lines.push("No valid spatial reference available".to_string()),
    }
    if let Some(description) = &summary.description {
        lines.push(format!("Description: {description}"));
    }
    if let Some(description) = &summary.service_description {
        lines.push(format!("Service Description: {description}"));
    }
    if let Some(copyright) = &summary.copyright {
        lines.push(format!("©: {copyright}"));
    }
    if let Some(layers) = summary.layer_count {
        lines.push(format!("# Layers: {layers}"));
    }
    if let Some(tables) = summary.table_count {
        lines.push(format!("# Tables: {tables}"));
    }
    if let Some(scale) = &summary.min_scale {
        lines.push(format!("Min Scale: {scale}"));
    }
    if let Some(scale) = &summary.max_scale {
        lines.push(format!("Max Scale: {scale}"));
    }
    push_sub_list(&mut lines, "Initial Extent", summary.initial_extent.as_ref());
    push_sub_list(&mut lines, "Full Extent", summary.full_extent.as_ref());
    push_sub_list(&mut lines, "Extent", summary.extent.as_ref());
    if let Some(units) = &summary.units {
        lines.push(format!("Units: {units}"));
    }
    push_sub_list(&mut lines, "Document Info", summary.document_info.as_ref());
    if let Some(max) = summary.max_record_count {
        lines.push(format!("Max Record Count: {max}"));
    }
    if let Some(geometry) = &summary.geometry {
        lines.push(format!("Geometry: {geometry}"));
    }
    if let Some(expression) = &summary.definition_expression {
        lines.push(format!("Definition Expression: {expression}"));
    }
    if let Some(visible) = summary.visible_by_default {
        lines.push(format!("Visible by default: {visible}"));
    }
    if let Some(versioned) = summary.versioned {
        lines.push(format!("Versioned Data: {}", if versioned { "Yes" } else { "No" }));
    }
    lines.extend(summary.capabilities.iter().map(|c| c.to_string()));
    lines.extend(summary.notes.iter().map(|n| n.to_string()));
    lines
}

/// Groups reports under the field they belong to, in declared field order.
/// Null/empty results come first, then the field's coded values.
pub fn field_report_lines(fields: &[FieldDescriptor], reports: &[ProbeReport]) -> Vec<String> {
    let mut lines = Vec::new();

    for field in fields {
        lines.push(format!("📄 {} ({})", field.name, field.field_type.as_str()));

        let belongs = |r: &&ProbeReport| r.item.field_name() == Some(field.name.as_str());
        let mut coded_header_written = false;
        for report in reports.iter().filter(belongs) {
            if report.probe == ProbeKind::DomainValue && !coded_header_written {
                lines.push(format!("{INDENT}Coded values:"));
                coded_header_written = true;
            }
            let indent = if report.probe == ProbeKind::DomainValue {
                format!("{INDENT}  ")
            } else {
                INDENT.to_string()
            };
            lines.extend(report_lines(report).into_iter().map(|line| format!("{indent}{line}")));
        }
    }
    lines
}

// `heading:` followed by one indented, un-camel-cased line per key
fn push_sub_list(lines: &mut Vec<String>, heading: &str, entries: Option<&Map<String, Value>>) {
    let Some(entries) = entries else { return };
    lines.push(format!("{heading}:"));
    lines.extend(
        entries
            .iter()
            .map(|(key, value)| format!("  {}: {}", un_camel_case(key), display_value(value))),
    );
}

// Strings print bare; anything else prints as JSON
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Writes each report as soon as it arrives.
pub struct TerminalSink<W> {
    out: W,
    failures: usize,
}

impl TerminalSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, failures: 0 }
    }

    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    // A closed stdout (e.g. piped into `head`) must not stop the queue
    fn emit(&mut self, line: &str) {
        let _ = writeln!(self.out, "{line}");
    }

    fn header(&mut self, item: &WorkItem) {
        if let WorkItem::LinkProbe { service_url } = item {
            self.emit(&format!("\n🔗 {service_url}"));
        }
    }
}

impl<W: Write + Send> RenderSink for TerminalSink<W> {
    fn render(&mut self, report: ProbeReport) {
        if report.result.is_failure() {
            self.failures += 1;
        }
        // A metadata failure is the only thing printed for that link
        if report.probe == ProbeKind::Metadata {
            self.header(&report.item);
        }
        for line in report_lines(&report) {
            self.emit(&format!("{INDENT}{line}"));
        }
    }

    fn describe_service(&mut self, item: &WorkItem, summary: &ServiceSummary) {
        self.header(item);
        for line in summary_lines(summary) {
            self.emit(&format!("{INDENT}{line}"));
        }
    }
}
