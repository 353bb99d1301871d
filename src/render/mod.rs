// src/render/mod.rs
// =============================================================================
// This module turns probe reports into output.
//
// Submodules:
// - terminal: prints reports as they arrive, and the grouped field report
// - collect: keeps reports in memory for grouping or JSON output
//
// The probers only know the RenderSink trait. A sink is called once per
// request and must not block: it formats, stores or prints, and returns.
// =============================================================================

mod collect;
mod terminal;

pub use collect::{CollectingSink, DescribedService};
pub use terminal::{field_report_lines, TerminalSink};

use crate::probe::{ProbeReport, WorkItem};
use crate::service::ServiceSummary;

pub trait RenderSink: Send {
    /// Called once per issued request.
    fn render(&mut self, report: ProbeReport);

    /// Called once per service link whose metadata could be read.
    fn describe_service(&mut self, _item: &WorkItem, _summary: &ServiceSummary) {}
}

/// `maxRecordCount` -> `Max Record Count`
pub fn un_camel_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 4);
    let mut previous: Option<char> = None;

    for (i, c) in value.chars().enumerate() {
        if i == 0 {
            out.extend(c.to_uppercase());
        } else {
            if c.is_ascii_uppercase() && previous.is_some_and(|p| p.is_ascii_lowercase()) {
                out.push(' ');
            }
            out.push(c);
        }
        previous = Some(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_un_camel_case() {
        assert_eq!(un_camel_case("code"), "Code");
        assert_eq!(un_camel_case("maxRecordCount"), "Max Record Count");
        assert_eq!(un_camel_case("details"), "Details");
        assert_eq!(un_camel_case("OBJECTID"), "OBJECTID");
        assert_eq!(un_camel_case(""), "");
    }
}
