// crates.io
use tracing::{Instrument, instrument::Instrumented};
// self
use crate::{_prelude::*, obs::FlowKind};

/// Span wrapper used by token flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		Self { span: tracing::info_span!("oauth2_token_cache.flow", flow = kind.as_str(), stage) }
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		fut.instrument(self.span.clone())
	}
}
