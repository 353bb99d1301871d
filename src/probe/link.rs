// src/probe/link.rs
// =============================================================================
// The service-link step: describe a service, then count its features.
//
// How it works:
// 1. Fetch `<link>?f=json` unless the link already carries it; if that
//    fails, render one Metadata failure
// 2. Hand a ServiceSummary to the sink
// 3. If the link declares fields, count non-null object ids, then non-null
//    shapes, one request at a time
// =============================================================================

use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{count, Predicate, ProbeKind, ProbeReport, ProbeResult, WorkItem};
use crate::client::QueryClient;
use crate::config::ProbeConfig;
use crate::executor::{Advance, Advanced, Step};
use crate::render::RenderSink;
use crate::service::{fetch_metadata, object_id_field, shape_field, ServiceLink, ServiceSummary};

pub struct LinkProber<'a, C: ?Sized, S: ?Sized> {
    client: &'a C,
    config: &'a ProbeConfig,
    sink: &'a mut S,
}

impl<'a, C: ?Sized, S: ?Sized> LinkProber<'a, C, S> {
    pub fn new(client: &'a C, config: &'a ProbeConfig, sink: &'a mut S) -> Self {
        Self { client, config, sink }
    }
}

#[async_trait]
impl<'a, C, S> Step<ServiceLink> for LinkProber<'a, C, S>
where
    C: QueryClient + ?Sized,
    S: RenderSink + ?Sized,
{
    async fn step(&mut self, mut link: ServiceLink, advance: Advance) -> Advanced {
        let item = WorkItem::LinkProbe {
            service_url: link.url.to_string(),
        };

        let metadata = match link.metadata.take() {
            Some(metadata) => metadata,
            None => {
                let started = Instant::now();
                match fetch_metadata(self.client, &link.url).await {
                    Ok(metadata) => metadata,
                    Err(error) => {
                        warn!(url = %link.url, %error, "could not read service metadata");
                        self.sink.render(ProbeReport {
                            item,
                            probe: ProbeKind::Metadata,
                            result: ProbeResult::Failure(error.into()),
                            elapsed: started.elapsed(),
                        });
                        return advance.resume();
                    }
                }
            }
        };

        let summary = ServiceSummary::from_metadata(&link.url, &metadata, self.config);
        self.sink.describe_service(&item, &summary);

        if metadata.fields().is_empty() {
            return advance.resume();
        }

        let counts = [
            (object_id_field(&metadata, self.config), ProbeKind::FeatureCount),
            (shape_field(&metadata), ProbeKind::ShapeCount),
        ];
        for (field, probe) in counts {
            let Some(field) = field else { continue };
            let (result, elapsed) = count(self.client, &link.url, &Predicate::NotNull(field.to_string())).await;
            self.sink.render(ProbeReport {
                item: item.clone(),
                probe,
                result,
                elapsed,
            });
        }

        debug!(url = %link.url, "link probed");
        advance.resume()
    }
}
