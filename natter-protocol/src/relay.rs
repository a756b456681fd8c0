//! Relay line formats
//!
//! The server emits exactly two kinds of lines: a join notice when a client
//! finishes its handshake, and a chat line attributing a payload to its
//! sender. Payloads are copied through byte-for-byte, so non-UTF-8 input
//! relays unchanged.

use bytes::{BufMut, Bytes, BytesMut};

/// Build the notice broadcast when `name` joins the room
pub fn join_notice(name: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(name.len() + 11);
    buf.put_slice(name.as_bytes());
    buf.put_slice(b" connected.");
    buf.freeze()
}

/// Build a chat line attributing `payload` to `name`
pub fn chat_line(name: &str, payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(name.len() + 2 + payload.len());
    buf.put_slice(name.as_bytes());
    buf.put_slice(b": ");
    buf.put_slice(payload);
    buf.freeze()
}
