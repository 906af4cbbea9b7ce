//! Track fragment header decoders (`tfhd`, `tfdt`, `trun`).
//!
//! Field presence is governed by the full-box flag word per ISO/IEC
//! 14496-12 §8.8. A truncated box yields as many fields or samples as can
//! be fully read; remaining bytes are ignored.

use bytes::Buf;

use crate::error::{Error, Result};

// tfhd flag bits (ISO/IEC 14496-12 §8.8.7).
const TFHD_BASE_DATA_OFFSET: u32 = 0x000001;
const TFHD_SAMPLE_DESCRIPTION_INDEX: u32 = 0x000002;
const TFHD_DEFAULT_SAMPLE_DURATION: u32 = 0x000008;
const TFHD_DEFAULT_SAMPLE_SIZE: u32 = 0x000010;
const TFHD_DEFAULT_SAMPLE_FLAGS: u32 = 0x000020;

// trun flag bits (ISO/IEC 14496-12 §8.8.8).
const TRUN_DATA_OFFSET: u32 = 0x000001;
const TRUN_FIRST_SAMPLE_FLAGS: u32 = 0x000004;
const TRUN_SAMPLE_DURATION: u32 = 0x000100;
const TRUN_SAMPLE_SIZE: u32 = 0x000200;
const TRUN_SAMPLE_FLAGS: u32 = 0x000400;
const TRUN_SAMPLE_COMPOSITION_TIME_OFFSET: u32 = 0x000800;

/// Decoded `tfhd` (track fragment header) box.
///
/// Any default may be absent; absent trun sample fields fall back to these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackFragmentHeader {
    pub track_id: u32,
    pub base_data_offset: Option<u64>,
    pub sample_description_index: Option<u32>,
    pub default_sample_duration: Option<u32>,
    pub default_sample_size: Option<u32>,
    pub default_sample_flags: Option<u32>,
}

/// Decoded `tfdt` (track fragment decode time) box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackFragmentDecodeTime {
    /// Absolute start of the fragment on the track's timeline, in
    /// timescale units. Held wide regardless of box version.
    pub base_media_decode_time: u64,
}

/// Decoded `trun` (track run) box.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackRun {
    pub data_offset: Option<i32>,
    pub samples: Vec<TrunSample>,
}

/// One sample entry within a `trun`. Absent fields take the `tfhd`
/// defaults; an absent composition time offset means 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrunSample {
    pub duration: Option<u32>,
    pub size: Option<u32>,
    pub flags: Option<u32>,
    pub composition_time_offset: Option<i64>,
}

/// Parse a `tfhd` box's contents.
pub fn parse_tfhd(data: &[u8]) -> Result<TrackFragmentHeader> {
    if data.len() < 8 {
        return Err(Error::Truncated {
            box_type: "tfhd",
            need: 8,
            have: data.len(),
        });
    }

    let mut buf = data;
    let flags = buf.get_u32() & 0x00FF_FFFF;
    let mut header = TrackFragmentHeader {
        track_id: buf.get_u32(),
        ..TrackFragmentHeader::default()
    };

    if flags & TFHD_BASE_DATA_OFFSET != 0 {
        if buf.remaining() < 8 {
            return Ok(header);
        }
        header.base_data_offset = Some(buf.get_u64());
    }
    if flags & TFHD_SAMPLE_DESCRIPTION_INDEX != 0 {
        if buf.remaining() < 4 {
            return Ok(header);
        }
        header.sample_description_index = Some(buf.get_u32());
    }
    if flags & TFHD_DEFAULT_SAMPLE_DURATION != 0 {
        if buf.remaining() < 4 {
            return Ok(header);
        }
        header.default_sample_duration = Some(buf.get_u32());
    }
    if flags & TFHD_DEFAULT_SAMPLE_SIZE != 0 {
        if buf.remaining() < 4 {
            return Ok(header);
        }
        header.default_sample_size = Some(buf.get_u32());
    }
    if flags & TFHD_DEFAULT_SAMPLE_FLAGS != 0 {
        if buf.remaining() < 4 {
            return Ok(header);
        }
        header.default_sample_flags = Some(buf.get_u32());
    }

    Ok(header)
}

/// Parse a `tfdt` box's contents.
///
/// Version 0 carries a 32-bit decode time, version 1 a 64-bit one; both
/// are widened to `u64`.
pub fn parse_tfdt(data: &[u8]) -> Result<TrackFragmentDecodeTime> {
    if data.len() < 8 {
        return Err(Error::Truncated {
            box_type: "tfdt",
            need: 8,
            have: data.len(),
        });
    }

    let mut buf = data;
    let version = (buf.get_u32() >> 24) as u8;

    let base_media_decode_time = if version == 1 {
        if buf.remaining() < 8 {
            return Err(Error::Truncated {
                box_type: "tfdt",
                need: 12,
                have: data.len(),
            });
        }
        buf.get_u64()
    } else {
        buf.get_u32() as u64
    };

    Ok(TrackFragmentDecodeTime {
        base_media_decode_time,
    })
}

/// Parse a `trun` box's contents.
///
/// A run that ends mid-sample yields exactly the fully-readable prefix of
/// its sample entries.
pub fn parse_trun(data: &[u8]) -> Result<TrackRun> {
    if data.len() < 8 {
        return Err(Error::Truncated {
            box_type: "trun",
            need: 8,
            have: data.len(),
        });
    }

    let mut buf = data;
    let version_flags = buf.get_u32();
    let version = (version_flags >> 24) as u8;
    let flags = version_flags & 0x00FF_FFFF;
    let mut sample_count = buf.get_u32();

    let mut run = TrackRun::default();

    if flags & TRUN_DATA_OFFSET != 0 {
        if buf.remaining() < 4 {
            return Ok(run);
        }
        run.data_offset = Some(buf.get_i32());
    }

    // The first sample may carry its own flags word in place of a
    // per-sample flags field.
    if flags & TRUN_FIRST_SAMPLE_FLAGS != 0 && sample_count > 0 {
        if buf.remaining() < 4 {
            return Ok(run);
        }
        let first_flags = buf.get_u32();
        let Some(mut sample) = read_trun_sample(&mut buf, version, flags & !TRUN_SAMPLE_FLAGS)
        else {
            return Ok(run);
        };
        sample.flags = Some(first_flags);
        run.samples.push(sample);
        sample_count -= 1;
    }

    for _ in 0..sample_count {
        match read_trun_sample(&mut buf, version, flags) {
            Some(sample) => run.samples.push(sample),
            None => break,
        }
    }

    Ok(run)
}

fn read_trun_sample(buf: &mut &[u8], version: u8, flags: u32) -> Option<TrunSample> {
    let mut sample = TrunSample::default();

    if flags & TRUN_SAMPLE_DURATION != 0 {
        if buf.remaining() < 4 {
            return None;
        }
        sample.duration = Some(buf.get_u32());
    }
    if flags & TRUN_SAMPLE_SIZE != 0 {
        if buf.remaining() < 4 {
            return None;
        }
        sample.size = Some(buf.get_u32());
    }
    if flags & TRUN_SAMPLE_FLAGS != 0 {
        if buf.remaining() < 4 {
            return None;
        }
        sample.flags = Some(buf.get_u32());
    }
    if flags & TRUN_SAMPLE_COMPOSITION_TIME_OFFSET != 0 {
        if buf.remaining() < 4 {
            return None;
        }
        // Version 1 offsets are signed; version 0 offsets are unsigned and
        // stay non-negative when widened.
        sample.composition_time_offset = Some(if version == 1 {
            buf.get_i32() as i64
        } else {
            buf.get_u32() as i64
        });
    }

    Some(sample)
}
