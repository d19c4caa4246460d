//! Built-in tool handlers.
//!
//! These are the three tools advertised to the model on every completion
//! request:
//!
//! - **RegisterSearchTool**: keyword / type / date-range search against the
//!   document store, with document-type normalization on every result
//! - **RegisterStatsTool**: aggregate corpus statistics, passed through verbatim
//! - **RelatedQueriesTool**: deterministic follow-up query suggestions
//!
//! Each implements [`ToolHandler`](crate::tool_protocol::ToolHandler) and is
//! wired into a [`ToolRegistry`](crate::tool_protocol::ToolRegistry) at
//! assistant construction time.

pub mod search;
pub mod stats;
pub mod suggest;

pub use search::{RegisterSearchTool, SEARCH_TOOL_NAME};
pub use stats::{RegisterStatsTool, STATS_TOOL_NAME};
pub use suggest::{RelatedQueriesTool, SUGGEST_TOOL_NAME};
