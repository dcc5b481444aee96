//! Tools the model can call mid-turn.
//!
//! - [`Tool`]: a named capability with a JSON argument schema
//! - [`ToolRegistry`]: dispatches calls under a timeout and a cancellation token
//! - [`builtin`]: date, weather, stock quote and holiday tools

pub mod builtin;
pub mod error;
pub mod registry;
pub mod tool;

pub use builtin::{BuiltinToolsConfig, builtin_tools};
pub use error::{HandlerError, ToolError};
pub use registry::{DEFAULT_TOOL_TIMEOUT, ToolRegistry};
pub use tool::{Tool, ToolDefinition, parse_args};
