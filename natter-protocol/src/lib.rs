//! natter-protocol: Shared wire definitions for client-server communication
//!
//! The relay wire format is deliberately plain: raw TCP with no message
//! framing, where one socket readout (capped at [`MAX_CHUNK_BYTES`]) is one
//! logical chunk. This crate pins down that chunk rule, the default port,
//! and the two line formats the server emits, so both binaries agree on
//! them.

pub mod codec;
pub mod relay;

// Re-export main types at crate root
pub use codec::{ChunkCodec, CodecError, MAX_CHUNK_BYTES};
pub use relay::{chat_line, join_notice};

/// Default TCP port the relay server listens on
pub const DEFAULT_PORT: u16 = 11111;
