// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap and set up logging
// 2. Read the service's own metadata to find out what to probe
// 3. Hand each ordered list of work to an executor, one queue per pass
// 4. Print the reports and exit with a proper code
//    (0 = every probe answered, 1 = some probes failed, 2 = error)
//
// Rust concepts used:
// - async/await: requests are asynchronous, and two queues may run side by side
// - Result<T, E>: For error handling (T = success type, E = error type)
// - Generics: the handlers work with any QueryClient, real or scripted
// =============================================================================

// Module declarations - tells Rust about our other source files
mod cli;        // src/cli.rs - command-line parsing
mod client;     // src/client/ - issuing requests
mod config;     // src/config.rs - options shared by the probers
mod executor;   // src/executor/ - draining work queues one item at a time
mod probe;      // src/probe/ - the steps: null/empty, coded values, links
mod render;     // src/render/ - turning reports into output
mod service;    // src/service/ - service metadata and discovery
#[cfg(test)]
mod testing;    // src/testing.rs - scripted client and sinks for tests

use anyhow::{Context, Result};
use clap::Parser;
use futures::future;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

use cli::{Cli, Commands};
use client::{HttpClient, QueryClient};
use config::ProbeConfig;
use executor::{Executor, RunSummary, WorkQueue};
use probe::{DomainProber, LinkProber, NullProber, ProbeReport};
use render::{CollectingSink, RenderSink, TerminalSink};
use service::{DomainEntry, FieldDescriptor, ServiceLink};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    // Run our application logic and capture the exit code
    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Logs go to stderr so `--json` output on stdout stays parseable
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    let config = cli.command.config();
    let json = cli.command.json();
    let client = HttpClient::new().context("could not build the HTTP client")?;

    match cli.command {
        Commands::Fields { layer_url, .. } => handle_fields(&client, &layer_url, &config, json).await,
        Commands::Service { urls, .. } => handle_service(&client, &urls, &config, json).await,
    }
}

// Everything a field pass produced, kept apart per queue
struct LayerRun {
    fields: Vec<FieldDescriptor>,
    nulls: CollectingSink,
    domains: CollectingSink,
}

#[derive(Serialize)]
struct FieldsOutput<'a> {
    layer: &'a str,
    fields: &'a [ProbeReport],
    coded_values: &'a [ProbeReport],
}

#[derive(Serialize)]
struct ServiceOutput<'a> {
    services: &'a [render::DescribedService],
    reports: &'a [ProbeReport],
}

// Handles the 'fields' subcommand
async fn handle_fields<C>(client: &C, layer_url: &str, config: &ProbeConfig, json: bool) -> Result<i32>
where
    C: QueryClient + ?Sized,
{
    let layer = Url::parse(layer_url).with_context(|| format!("invalid URL '{layer_url}'"))?;
    if !json {
        println!("🔍 Probing layer: {}", layer);
    }

    let run = probe_layer(client, &layer, config).await?;
    let failures = run.nulls.failures() + run.domains.failures();

    if json {
        let output = FieldsOutput {
            layer: layer.as_str(),
            fields: &run.nulls.reports,
            coded_values: &run.domains.reports,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if run.fields.is_empty() {
        println!("⚠️  Layer declares no fields");
    } else {
        let mut reports = run.nulls.reports;
        reports.extend(run.domains.reports);

        println!("📄 {} field(s)\n", run.fields.len());
        for line in render::field_report_lines(&run.fields, &reports) {
            println!("{}", line);
        }
        print_summary(&reports);
    }

    Ok(if failures > 0 { 1 } else { 0 })
}

// Runs the null/empty queue and the coded-value queue of one layer. The two
// queues are independent: each has at most one request in flight, but both
// may be waiting at the same time.
async fn probe_layer<C>(client: &C, layer: &Url, config: &ProbeConfig) -> Result<LayerRun>
where
    C: QueryClient + ?Sized,
{
    let metadata = service::fetch_metadata(client, layer)
        .await
        .with_context(|| format!("could not read metadata for {layer}"))?;

    let fields = service::field_descriptors(&metadata);
    let domains = service::domain_queue(&metadata);
    let mut nulls = CollectingSink::default();
    let mut coded = CollectingSink::default();
    run_layer_passes(client, layer, config, &fields, domains, &mut nulls, &mut coded).await;

    Ok(LayerRun {
        fields,
        nulls,
        domains: coded,
    })
}

// Drains the field queue and the coded-value queue side by side. Each queue
// still has at most one request in flight.
async fn run_layer_passes<C, N, D>(
    client: &C,
    layer: &Url,
    config: &ProbeConfig,
    fields: &[FieldDescriptor],
    domains: WorkQueue<DomainEntry>,
    nulls: &mut N,
    coded: &mut D,
) where
    C: QueryClient + ?Sized,
    N: RenderSink + ?Sized,
    D: RenderSink + ?Sized,
{
    let null_pass = async {
        if config.probe_nulls {
            let mut prober = NullProber::new(client, layer, nulls);
            Executor::new("fields")
                .run(WorkQueue::new(fields.to_vec()), &mut prober, |summary| {
                    info!(processed = summary.processed, "null/empty pass finished")
                })
                .await;
        }
    };
    let domain_pass = async {
        if config.probe_domains {
            let mut prober = DomainProber::new(client, layer, coded);
            Executor::new("domains")
                .run(domains, &mut prober, |summary| {
                    info!(processed = summary.processed, "coded-value pass finished")
                })
                .await;
        }
    };
    future::join(null_pass, domain_pass).await;
}

// Handles the 'service' subcommand
async fn handle_service<C>(client: &C, urls: &[String], config: &ProbeConfig, json: bool) -> Result<i32>
where
    C: QueryClient + ?Sized,
{
    let links = collect_links(client, urls, config).await?;

    let failures = if json {
        let mut sink = CollectingSink::default();
        run_links(client, links, config, &mut sink).await;

        let output = ServiceOutput {
            services: &sink.services,
            reports: &sink.reports,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        sink.failures()
    } else {
        println!("🔍 Probing {} link(s)...", links.len());
        let mut sink = TerminalSink::stdout();
        run_links(client, links, config, &mut sink).await;

        println!("\n📊 Summary:");
        println!("   ❌ Failed: {}", sink.failures());
        sink.failures()
    };

    Ok(if failures > 0 { 1 } else { 0 })
}

// The links to probe, in the order given. With --expand-layers each service
// is followed by its layers and tables.
async fn collect_links<C>(client: &C, urls: &[String], config: &ProbeConfig) -> Result<Vec<ServiceLink>>
where
    C: QueryClient + ?Sized,
{
    let mut links = Vec::new();

    for raw in urls {
        let url = Url::parse(raw).with_context(|| format!("invalid URL '{raw}'"))?;
        let mut link = ServiceLink::new(url);
        let mut layers = Vec::new();

        if config.expand_layers {
            match service::fetch_metadata(client, &link.url).await {
                Ok(metadata) => {
                    layers = service::layer_links(&link.url, &metadata);
                    link.metadata = Some(metadata);
                }
                // The link itself is still probed and will report the failure
                Err(error) => warn!(url = %link.url, %error, "could not list layers"),
            }
        }

        links.push(link);
        links.extend(layers);
    }

    Ok(links)
}

async fn run_links<C, S>(client: &C, links: Vec<ServiceLink>, config: &ProbeConfig, sink: &mut S) -> RunSummary
where
    C: QueryClient + ?Sized,
    S: RenderSink + ?Sized,
{
    let mut prober = LinkProber::new(client, config, sink);
    Executor::new("links")
        .run(WorkQueue::new(links), &mut prober, |summary| {
            info!(processed = summary.processed, "link pass finished")
        })
        .await
}

// Prints a count of each kind of outcome
fn print_summary(reports: &[ProbeReport]) {
    let zero = reports.iter().filter(|r| r.result.is_zero()).count();
    let failed = reports.iter().filter(|r| r.result.is_failure()).count();
    let counted = reports.len() - failed;

    println!();
    println!("📊 Summary:");
    println!("   ✅ Counted: {}", counted);
    println!("   ⚠️  Zero counts: {}", zero);
    println!("   ❌ Failed: {}", failed);
    println!("   📋 Total requests: {}", reports.len());
}
