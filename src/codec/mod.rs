//! Codec-level bitstream parsing.

pub mod avc;
