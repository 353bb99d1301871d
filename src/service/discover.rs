// src/service/discover.rs
// =============================================================================
// Turns a metadata document into the ordered lists the probers consume.
//
// Every list keeps the order the service declared things in, so results
// come out in the same order as the service's own field listing.
// =============================================================================

use serde_json::Value;
use url::Url;

use super::metadata::{FieldType, ServiceMetadata};
use crate::config::ProbeConfig;
use crate::executor::WorkQueue;

/// One field to probe for null and empty values.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub field_type: FieldType,
}

/// One permitted value of a coded-value domain.
#[derive(Debug, Clone, PartialEq)]
pub struct CodedValue {
    pub code: Value,
    pub label: String,
}

/// Outer queue entry of the domain pass: a field and the inner queue of its
/// coded values.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainEntry {
    pub field_name: String,
    pub field_type: FieldType,
    pub values: WorkQueue<CodedValue>,
}

/// A service or layer endpoint to describe and count.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceLink {
    pub url: Url,
    /// Set when the document was already read while listing layers.
    pub metadata: Option<ServiceMetadata>,
}

impl ServiceLink {
    pub fn new(url: Url) -> Self {
        Self { url, metadata: None }
    }
}

pub fn field_descriptors(metadata: &ServiceMetadata) -> Vec<FieldDescriptor> {
    metadata
        .fields()
        .iter()
        .map(|field| FieldDescriptor {
            name: field.name.clone(),
            field_type: field.field_type.clone(),
        })
        .collect()
}

/// One entry per field that has a coded-value domain. Fields without one are
/// skipped entirely; a domain with zero coded values still gets an entry.
pub fn domain_queue(metadata: &ServiceMetadata) -> WorkQueue<DomainEntry> {
    metadata
        .fields()
        .iter()
        .filter_map(|field| {
            let coded = field.coded_values()?;
            Some(DomainEntry {
                field_name: field.name.clone(),
                field_type: field.field_type.clone(),
                values: coded
                    .iter()
                    .map(|value| CodedValue {
                        code: value.code.clone(),
                        label: value.name.clone(),
                    })
                    .collect(),
            })
        })
        .collect()
}

/// `<service>/<id>` for every layer, then every table.
pub fn layer_links(service: &Url, metadata: &ServiceMetadata) -> Vec<ServiceLink> {
    let base = service.path().trim_end_matches('/').to_string();

    metadata
        .layers
        .iter()
        .chain(metadata.tables.iter())
        .flatten()
        .map(|layer| {
            let mut url = service.clone();
            url.set_query(None);
            url.set_fragment(None);
            url.set_path(&format!("{}/{}", base, layer.id));
            ServiceLink::new(url)
        })
        .collect()
}

/// The field to count features on: the declared `objectIdField`, else the
/// first OID-typed field.
pub fn object_id_field<'a>(metadata: &'a ServiceMetadata, config: &ProbeConfig) -> Option<&'a str> {
    if let Some(name) = metadata.object_id_field.as_deref().filter(|n| !n.is_empty()) {
        return Some(name);
    }
    metadata
        .fields()
        .iter()
        .find(|field| field.field_type.is_object_id(config.untyped_is_object_id))
        .map(|field| field.name.as_str())
}

pub fn shape_field(metadata: &ServiceMetadata) -> Option<&str> {
    metadata
        .fields()
        .iter()
        .find(|field| field.field_type.is_geometry())
        .map(|field| field.name.as_str())
}
