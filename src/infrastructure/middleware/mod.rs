// Token gate middleware and the extractor handlers use to receive the
// resulting viewer context.

pub mod viewer_context_extractor;
pub mod viewer_context_middleware;

pub use viewer_context_extractor::Vc;
pub use viewer_context_middleware::*;
