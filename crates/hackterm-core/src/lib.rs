pub mod config;
pub mod endpoint;
pub mod segment;
pub mod state;
pub mod transport;

// Re-export main types for convenience
pub use config::Config;
pub use endpoint::Endpoint;
pub use segment::{segment, Segment, SegmentKind};
pub use state::{ChatMessage, ChatRole, Conversation, PendingRequest};
pub use transport::{BackendReply, HttpTransport, Transport, TransportError};
