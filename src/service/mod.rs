// src/service/mod.rs
// =============================================================================
// This module knows what a service describes about itself.
//
// Submodules:
// - metadata: serde model of the `?f=json` document and how to fetch it
// - discover: turns that document into ordered work queues
// - summary: the human-facing digest shown for each probed link
//
// Nothing in here issues a count query. It only produces the input the
// probing pipeline consumes.
// =============================================================================

mod discover;
mod metadata;
mod summary;

pub use discover::{
    domain_queue, field_descriptors, layer_links, object_id_field, shape_field, CodedValue,
    DomainEntry, FieldDescriptor, ServiceLink,
};
pub use metadata::{fetch_metadata, DiscoveryError, FieldType};
pub use summary::ServiceSummary;
