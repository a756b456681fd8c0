//! Chunk codec for the unframed relay wire
//!
//! The relay does not delimit messages on the wire. Whatever bytes one
//! readout delivers, up to [`MAX_CHUNK_BYTES`], count as one chunk; a large
//! send surfaces as several chunks, and back-to-back sends that land before
//! the peer reads coalesce into one. The codec makes that boundary rule
//! explicit in a single tested place instead of scattering read calls
//! around the server.

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Maximum number of bytes delivered as one chunk
pub const MAX_CHUNK_BYTES: usize = 1024;

/// Chunk codec error
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Codec yielding one chunk per buffered readout, bounded at [`MAX_CHUNK_BYTES`]
///
/// Encoding is a passthrough: chunks are written as-is, with no prefix or
/// terminator.
pub struct ChunkCodec;

impl ChunkCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ChunkCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ChunkCodec {
    type Item = Bytes;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let take = src.len().min(MAX_CHUNK_BYTES);
        Ok(Some(src.split_to(take).freeze()))
    }
}

impl Encoder<Bytes> for ChunkCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len());
        dst.put_slice(&item);
        Ok(())
    }
}
