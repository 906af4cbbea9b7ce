//! H.264 / AVC bitstream parsing
//!
//! This module scans length-prefixed NAL units inside `mdat` payloads,
//! strips emulation-prevention bytes, and decodes SEI message headers.
//! The primary use is surfacing timestamped SEI payloads (closed captions
//! and other in-band metadata) to downstream interpreters.

mod nal;
mod sei;

pub use nal::{find_sei_nals, strip_emulation_prevention, NalUnitType, SeiNal};
pub use sei::{parse_sei_messages, SeiMessage};
