//! Frame decoding into [`PacketRecord`](crate::PacketRecord)s.
//!
//! `layout` names the layers and header offsets, `parser` slices frames
//! with etherparse, `error` lists the reasons a frame stays opaque.

pub mod error;
pub mod layout;
pub mod parser;

pub use error::DecodeError;
pub use parser::{decode_event, opaque_record};
