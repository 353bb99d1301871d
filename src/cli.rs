// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// clap is a popular Rust library for parsing command-line arguments.
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// Rust concepts:
// - Structs: Custom data types that group related data
// - Enums: Types that can be one of several variants
// - Derive macros: Automatically generate code for our types
// =============================================================================

use clap::{Parser, Subcommand};

use crate::config::ProbeConfig;

// This struct represents our entire CLI application
#[derive(Parser, Debug)]
#[command(
    name = "service-probe",
    version,
    about = "Probe a geospatial REST service field by field",
    long_about = "service-probe asks an ArcGIS-style REST service how many features have values in each \
                  field, how many text fields are empty, and how many features use each coded domain value. \
                  Queries are issued one at a time per queue so the service only ever sees light load."
)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, global = true, env = "SERVICE_PROBE_LOG", default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Count non-null, non-empty and coded values for every field of a layer
    ///
    /// Example: service-probe fields https://host/arcgis/rest/services/Roads/MapServer/0
    Fields {
        /// Layer or table URL (e.g., .../MapServer/0 or .../FeatureServer/3)
        layer_url: String,

        /// Output results in JSON format instead of a report
        #[arg(long)]
        json: bool,

        /// Don't run the null/empty pass
        #[arg(long)]
        skip_nulls: bool,

        /// Don't run the coded-value pass
        #[arg(long)]
        skip_domains: bool,

        /// Treat a field declared with an empty type as the object-id field
        #[arg(long)]
        untyped_oid: bool,
    },

    /// Describe services and count their features
    ///
    /// Example: service-probe service https://host/arcgis/rest/services/Roads/MapServer --expand-layers
    Service {
        /// One or more service or layer URLs, probed in the order given
        #[arg(required = true)]
        urls: Vec<String>,

        /// Output results in JSON format instead of a report
        #[arg(long)]
        json: bool,

        /// Also probe every layer and table the service lists
        #[arg(long)]
        expand_layers: bool,

        /// Treat a field declared with an empty type as the object-id field
        #[arg(long)]
        untyped_oid: bool,
    },
}

impl Commands {
    pub fn config(&self) -> ProbeConfig {
        match self {
            Commands::Fields {
                skip_nulls,
                skip_domains,
                untyped_oid,
                ..
            } => ProbeConfig {
                untyped_is_object_id: *untyped_oid,
                probe_nulls: !skip_nulls,
                probe_domains: !skip_domains,
                ..ProbeConfig::default()
            },
            Commands::Service {
                expand_layers,
                untyped_oid,
                ..
            } => ProbeConfig {
                untyped_is_object_id: *untyped_oid,
                expand_layers: *expand_layers,
                ..ProbeConfig::default()
            },
        }
    }

    pub fn json(&self) -> bool {
        match self {
            Commands::Fields { json, .. } | Commands::Service { json, .. } => *json,
        }
    }
}
