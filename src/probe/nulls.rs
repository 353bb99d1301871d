// src/probe/nulls.rs
// =============================================================================
// The null/empty step, run once per field of a layer.
//
// How it works:
// 1. Count rows where the field is not null
// 2. For textual fields, if step 1 produced a count, also count rows where
//    the field is neither null nor the empty string
// 3. Resume the queue only after every request for this field resolved
//
// One report is rendered per request, so a text field produces two
// reports and any other field produces one.
// =============================================================================

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::{count, Predicate, ProbeKind, ProbeReport, WorkItem};
use crate::client::QueryClient;
use crate::executor::{Advance, Advanced, Step};
use crate::render::RenderSink;
use crate::service::FieldDescriptor;

pub struct NullProber<'a, C: ?Sized, S: ?Sized> {
    client: &'a C,
    layer: &'a Url,
    sink: &'a mut S,
}

impl<'a, C: ?Sized, S: ?Sized> NullProber<'a, C, S> {
    pub fn new(client: &'a C, layer: &'a Url, sink: &'a mut S) -> Self {
        Self { client, layer, sink }
    }
}

#[async_trait]
impl<'a, C, S> Step<FieldDescriptor> for NullProber<'a, C, S>
where
    C: QueryClient + ?Sized,
    S: RenderSink + ?Sized,
{
    async fn step(&mut self, field: FieldDescriptor, advance: Advance) -> Advanced {
        let item = WorkItem::FieldNullProbe {
            field_name: field.name.clone(),
            field_type: field.field_type.clone(),
        };

        let (result, elapsed) = count(self.client, self.layer, &Predicate::NotNull(field.name.clone())).await;
        let chain_empty_check = field.field_type.is_textual() && !result.is_failure();
        self.sink.render(ProbeReport {
            item: item.clone(),
            probe: ProbeKind::NonNull,
            result,
            elapsed,
        });

        if chain_empty_check {
            let (result, elapsed) =
                count(self.client, self.layer, &Predicate::NotNullOrEmpty(field.name.clone())).await;
            self.sink.render(ProbeReport {
                item,
                probe: ProbeKind::NonEmpty,
                result,
                elapsed,
            });
        }

        debug!(field = %field.name, position = advance.position(), "field probed");
        advance.resume()
    }
}
