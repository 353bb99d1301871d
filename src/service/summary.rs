// src/service/summary.rs
// =============================================================================
// A digest of a service's metadata, shown next to each probed link.
//
// The digest is plain data. How it is displayed is up to the render sink.
// =============================================================================

use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

use super::discover::{object_id_field, shape_field};
use super::metadata::ServiceMetadata;
use crate::config::ProbeConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServiceSummary {
    /// `latestWkid`, `wkid`, `latestWkt` or `wkt`, whichever comes first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spatial_reference: Option<String>,
    /// Some("tiled") / Some("dynamic") when a spatial reference is published.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_scale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_scale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_extent: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_extent: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extent: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_info: Option<Map<String, Value>>,
    /// Only reported alongside `documentInfo`, i.e. for map services.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_record_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition_expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible_by_default: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub versioned: Option<bool>,
    /// Capabilities the service advertises, e.g. "Supports Statistics".
    pub capabilities: Vec<&'static str>,
    /// Things we could not count, e.g. a missing object-id field.
    pub notes: Vec<&'static str>,
}

impl ServiceSummary {
    pub fn from_metadata(url: &Url, metadata: &ServiceMetadata, config: &ProbeConfig) -> Self {
        let spatial_reference = metadata.spatial_reference.as_ref().and_then(|sr| {
            sr.latest_wkid
                .or(sr.wkid)
                .map(|wkid| wkid.to_string())
                .or_else(|| sr.latest_wkt.clone())
                .or_else(|| sr.wkt.clone())
        });
        let cache = metadata.spatial_reference.as_ref().map(|_| {
            if metadata.single_fused_map_cache.unwrap_or(false) {
                "tiled"
            } else {
                "dynamic"
            }
        });

        let flags = [
            (metadata.supports_dynamic_layers, "Supports Dynamic Layers"),
            (metadata.has_attachments, "Has Attachments"),
            (metadata.has_labels, "Has Labels"),
            (metadata.supports_statistics, "Supports Statistics"),
            (metadata.supports_advanced_queries, "Supports Advanced Queries"),
        ];
        let mut capabilities: Vec<&'static str> = flags
            .iter()
            .filter(|(flag, _)| flag.unwrap_or(false))
            .map(|(_, name)| *name)
            .collect();
        if metadata.relationships.as_ref().is_some_and(|r| !r.is_empty()) {
            capabilities.push("Has Relationships");
        }

        let mut notes = Vec::new();
        if !metadata.fields().is_empty() {
            if object_id_field(metadata, config).is_none() {
                notes.push("No way to query features.");
            }
            let is_feature_service = url.path().to_ascii_lowercase().contains("/featureserver/");
            // Untyped documents (services, image layers) are not feature layers
            let is_feature_layer = metadata.layer_type.as_deref().is_some_and(|t| t != "Table");
            if shape_field(metadata).is_none() && !is_feature_service && is_feature_layer {
                notes.push("No visible shape field available.");
            }
        }

        Self {
            spatial_reference,
            cache,
            description: non_empty(&metadata.description),
            service_description: non_empty(&metadata.service_description),
            copyright: non_empty(&metadata.copyright_text),
            layer_count: metadata.layers.as_ref().map(Vec::len),
            table_count: metadata.tables.as_ref().map(Vec::len).filter(|n| *n > 0),
            min_scale: metadata.min_scale.map(scale_label),
            max_scale: metadata.max_scale.map(scale_label),
            initial_extent: metadata.initial_extent.clone(),
            full_extent: metadata.full_extent.clone(),
            extent: metadata.extent.clone(),
            units: non_empty(&metadata.units).map(|u| u.replace("esri", "")),
            geometry: non_empty(&metadata.geometry_type).map(|g| g.replace("esriGeometry", "")),
            document_info: metadata.document_info.clone(),
            max_record_count: metadata.document_info.as_ref().and(metadata.max_record_count),
            definition_expression: non_empty(&metadata.definition_expression),
            visible_by_default: metadata.default_visibility,
            versioned: metadata.is_data_versioned,
            capabilities,
            notes,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|v| !v.is_empty()).map(str::to_string)
}

// A scale of 0 means "no limit"
fn scale_label(scale: f64) -> String {
    if scale == 0.0 {
        "None".to_string()
    } else {
        scale.to_string()
    }
}
