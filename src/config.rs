// src/config.rs
// =============================================================================
// Run-time options shared by the probers.
//
// All configuration comes from the command line (see cli.rs); this struct is
// what the rest of the program sees once the flags have been parsed, so the
// probers never depend on clap directly.
// =============================================================================

/// Options that change what gets probed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Treat a field whose declared type is the empty string as the
    /// object-id field. Some services publish their OID field that way.
    pub untyped_is_object_id: bool,
    /// Run the null/empty queue over the layer's fields.
    pub probe_nulls: bool,
    /// Run the coded-value queue over the layer's domains.
    pub probe_domains: bool,
    /// Replace each service link with the service plus its layers and tables.
    pub expand_layers: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            untyped_is_object_id: false,
            probe_nulls: true,
            probe_domains: true,
            expand_layers: false,
        }
    }
}
