//! Provider-agnostic conversation and result types
//!
//! Every adapter converts to and from these shapes; nothing past the adapter
//! boundary branches on provider identity.

pub mod request;
pub mod response;
pub mod tool;
pub mod transcript;

pub use request::{DispatchRequest, GenerationOptions};
pub use response::{DispatchResult, ToolCallResult};
pub use tool::{ToolDeclaration, ToolInvocation, ToolResult};
pub use transcript::{Part, RawTurn, Role, Turn};
