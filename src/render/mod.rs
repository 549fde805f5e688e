//! Embedding and fallback rendering.
//!
//! - [`EmbeddingFrame`](frame::EmbeddingFrame): the host's embedded view
//! - [`RenderFallbackController`](fallback::RenderFallbackController): what to
//!   show when the view cannot render the destination

pub mod fallback;
pub mod frame;
