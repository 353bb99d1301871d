// src/service/metadata.rs
// =============================================================================
// The JSON document a service (or one of its layers) returns for `?f=json`.
//
// Only the keys we actually use are modelled. Almost everything is optional
// because map services, feature services, image services, layers and tables
// each publish a different subset, and some publish `null` instead of
// leaving a key out.
//
// Rust concepts:
// - #[serde(rename_all = "camelCase")]: maps `objectIdField` to object_id_field
// - #[serde(transparent)]: a newtype that (de)serializes as its inner value
// - Option<T>: a key that may be missing or null
// =============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::client::{service_error, QueryClient, ServiceRequest, TransportError};

const TEXT_TYPE: &str = "esriFieldTypeString";
const OID_TYPE: &str = "esriFieldTypeOID";
const GEOMETRY_TYPE: &str = "esriFieldTypeGeometry";

/// Declared type of a field, e.g. `esriFieldTypeString`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldType(String);

impl FieldType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Textual fields get a second (non-empty) probe and quoted literals.
    pub fn is_textual(&self) -> bool {
        self.0 == TEXT_TYPE
    }

    pub fn is_object_id(&self, untyped_is_object_id: bool) -> bool {
        self.0 == OID_TYPE || (untyped_is_object_id && self.0.is_empty())
    }

    pub fn is_geometry(&self) -> bool {
        self.0 == GEOMETRY_TYPE
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldInfo {
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub domain: Option<Domain>,
}

impl FieldInfo {
    /// Coded values of the field's domain, if it has a coded-value domain.
    /// Range domains have no `codedValues` and yield None.
    pub fn coded_values(&self) -> Option<&[CodedValueInfo]> {
        self.domain.as_ref()?.coded_values.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    #[serde(default)]
    pub coded_values: Option<Vec<CodedValueInfo>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CodedValueInfo {
    #[serde(default)]
    pub name: String,
    pub code: Value,
}

/// A `layers` or `tables` entry of a service document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LayerRef {
    pub id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpatialReference {
    pub wkid: Option<i64>,
    pub latest_wkid: Option<i64>,
    pub wkt: Option<String>,
    pub latest_wkt: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceMetadata {
    pub fields: Option<Vec<FieldInfo>>,
    pub layers: Option<Vec<LayerRef>>,
    pub tables: Option<Vec<LayerRef>>,
    pub spatial_reference: Option<SpatialReference>,
    pub single_fused_map_cache: Option<bool>,
    pub object_id_field: Option<String>,
    #[serde(rename = "type")]
    pub layer_type: Option<String>,
    pub description: Option<String>,
    pub service_description: Option<String>,
    pub copyright_text: Option<String>,
    pub supports_dynamic_layers: Option<bool>,
    pub min_scale: Option<f64>,
    pub max_scale: Option<f64>,
    pub initial_extent: Option<Map<String, Value>>,
    pub full_extent: Option<Map<String, Value>>,
    pub extent: Option<Map<String, Value>>,
    pub document_info: Option<Map<String, Value>>,
    pub units: Option<String>,
    pub geometry_type: Option<String>,
    pub max_record_count: Option<u64>,
    pub definition_expression: Option<String>,
    pub default_visibility: Option<bool>,
    pub has_attachments: Option<bool>,
    pub has_labels: Option<bool>,
    pub supports_statistics: Option<bool>,
    pub supports_advanced_queries: Option<bool>,
    pub relationships: Option<Vec<Value>>,
    pub is_data_versioned: Option<bool>,
}

impl ServiceMetadata {
    pub fn fields(&self) -> &[FieldInfo] {
        self.fields.as_deref().unwrap_or_default()
    }
}

/// Why a metadata document could not be obtained.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DiscoveryError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("service reported an error: {}", Value::Object(.0.clone()))]
    Service(Map<String, Value>),

    #[error("unexpected metadata layout: {0}")]
    Decode(String),
}

/// `<url>?f=json`, dropping whatever query the URL already had.
pub fn metadata_url(url: &Url) -> Url {
    let mut endpoint = url.clone();
    endpoint.set_fragment(None);
    endpoint.query_pairs_mut().clear().append_pair("f", "json");
    endpoint
}

/// Fetches and decodes the metadata document of a service or layer.
pub async fn fetch_metadata<C>(client: &C, url: &Url) -> Result<ServiceMetadata, DiscoveryError>
where
    C: QueryClient + ?Sized,
{
    let response = client.request(ServiceRequest::get(metadata_url(url))).await?;

    if let Some(payload) = service_error(&response) {
        return Err(DiscoveryError::Service(payload));
    }

    let metadata: ServiceMetadata =
        serde_json::from_value(response).map_err(|e| DiscoveryError::Decode(e.to_string()))?;
    debug!(%url, fields = metadata.fields().len(), "metadata decoded");
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedClient;
    use serde_json::json;

    #[test]
    fn test_metadata_url_replaces_query() {
        let url = Url::parse("https://host/arcgis/rest/services/Roads/MapServer/2?token=abc").unwrap();
        assert_eq!(
            metadata_url(&url).as_str(),
            "https://host/arcgis/rest/services/Roads/MapServer/2?f=json"
        );
    }

    #[test]
    fn test_decode_layer_with_domains() {
        let metadata: ServiceMetadata = serde_json::from_value(json!({
            "type": "Feature Layer",
            "objectIdField": "OBJECTID",
            "fields": [
                {"name": "OBJECTID", "type": "esriFieldTypeOID", "alias": "OBJECTID", "domain": null},
                {"name": "STATUS", "type": "esriFieldTypeString", "domain": {
                    "type": "codedValue",
                    "codedValues": [{"name": "Open", "code": "O"}, {"name": "Closed", "code": "C"}]
                }},
                {"name": "LANES", "type": "esriFieldTypeSmallInteger", "domain": {
                    "type": "range", "range": [1, 8]
                }}
            ]
        }))
        .unwrap();

        assert_eq!(metadata.fields().len(), 3);
        assert_eq!(metadata.layer_type.as_deref(), Some("Feature Layer"));
        assert_eq!(metadata.fields()[1].coded_values().map(|v| v.len()), Some(2));
        assert_eq!(metadata.fields()[2].coded_values(), None);
        assert!(metadata.fields()[1].field_type.is_textual());
    }

    #[test]
    fn test_null_fields_decode_as_empty() {
        let metadata: ServiceMetadata =
            serde_json::from_value(json!({"fields": null, "layers": [{"id": 0, "name": "A"}]})).unwrap();
        assert!(metadata.fields().is_empty());
        assert_eq!(metadata.layers.unwrap()[0].id, 0);
    }

    #[test]
    fn test_untyped_field_is_object_id_only_when_enabled() {
        let untyped = FieldType::new("");
        assert!(!untyped.is_object_id(false));
        assert!(untyped.is_object_id(true));
        assert!(FieldType::new("esriFieldTypeOID").is_object_id(false));
    }

    #[tokio::test]
    async fn test_fetch_metadata_reports_service_error() {
        let client = ScriptedClient::new(vec![Ok(json!({"error": {"code": 499, "message": "Token Required"}}))]);
        let url = Url::parse("https://host/arcgis/rest/services/Secure/MapServer").unwrap();

        let err = fetch_metadata(&client, &url).await.unwrap_err();
        match err {
            DiscoveryError::Service(payload) => assert_eq!(payload["code"], 499),
            other => panic!("expected service error, got {other:?}"),
        }
        assert_eq!(client.requests()[0].endpoint.query(), Some("f=json"));
    }

    #[tokio::test]
    async fn test_fetch_metadata_passes_transport_errors_through() {
        let client = ScriptedClient::new(vec![Err(TransportError::Network("refused".into()))]);
        let url = Url::parse("https://host/arcgis/rest/services/A/MapServer/0").unwrap();

        let err = fetch_metadata(&client, &url).await.unwrap_err();
        assert_eq!(err, DiscoveryError::Transport(TransportError::Network("refused".into())));
    }
}
