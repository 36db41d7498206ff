//! Opulent Voice Protocol (OVP) frame layout.
//!
//! This crate handles the binary link-layer framing used to carry compressed
//! voice and control messages over an unreliable datagram transport: header
//! layouts, frame types, station identifiers and sequence numbering. It does
//! not know about audio, sockets or push-to-talk state.
//!
//! Two header layouts are supported and selected explicitly:
//!
//! | Layout    | Header | Fields |
//! |-----------|--------|--------|
//! | `Legacy`  | 8 B    | magic(2) type(1) seq(2) len(2) reserved(1) |
//! | `Current` | 14 B   | sync(2) station(6) type(1) seq(2) len(2) reserved(1) |
//!
//! All integers are big-endian.
//!
//! # Design Principles
//!
//! - **Explicit layouts** - Both header revisions live behind one codec, chosen at construction.
//! - **Bounded decoding** - The declared payload length is never trusted beyond the buffer.
//! - **Infallible creation** - Building a frame cannot fail; parsing reports absence.

mod codec;
mod error;
mod frame;
mod header;

pub use codec::FrameCodec;
pub use error::{DecodeError, EncodeError, WireResult};
pub use frame::{decode_frame, encode_frame, encode_header, Frame};
pub use header::{
    CallsignError, FrameHeader, FrameType, ProtocolVariant, StationId, HEADER_SIZE,
    LEGACY_HEADER_SIZE, LEGACY_MAGIC, MAX_PAYLOAD_LEN, PTT_START, PTT_STOP, STREAM_SYNC_WORD,
};
