//! Sample-table reconstruction for track fragments.
//!
//! Combines `tfhd` defaults, the `tfdt` base decode time, and one or more
//! `trun` runs into a flat sample list with absolute decode and
//! presentation timestamps.

use crate::boxes::fragment::{parse_trun, TrackFragmentHeader};
use crate::types::Sample;

/// Build the flat sample list for one `traf`.
///
/// `truns` are the contents of the fragment's `trun` boxes in document
/// order. Absent per-sample fields take the `tfhd` defaults (or 0); the
/// composition time offset defaults to 0. Decode timestamps accumulate
/// from `base_media_decode_time` in `i64`, so `dts` for the k-th sample is
/// exactly the base plus the sum of preceding durations.
pub fn build_samples(
    truns: &[&[u8]],
    base_media_decode_time: u64,
    tfhd: &TrackFragmentHeader,
) -> Vec<Sample> {
    let default_duration = tfhd.default_sample_duration.unwrap_or(0);
    let default_size = tfhd.default_sample_size.unwrap_or(0);

    let mut current_dts = base_media_decode_time as i64;
    let mut samples = Vec::new();

    for trun in truns {
        let Ok(run) = parse_trun(trun) else {
            continue;
        };

        for entry in run.samples {
            let duration = entry.duration.unwrap_or(default_duration);
            let size = entry.size.unwrap_or(default_size);
            let composition_time_offset = entry.composition_time_offset.unwrap_or(0);

            samples.push(Sample {
                track_id: tfhd.track_id,
                size,
                duration,
                composition_time_offset,
                dts: current_dts,
                pts: current_dts + composition_time_offset,
            });

            current_dts += duration as i64;
        }
    }

    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trun_bytes(version: u8, flags: u32, content: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + content.len());
        out.extend_from_slice(&(((version as u32) << 24) | flags).to_be_bytes());
        out.extend_from_slice(content);
        out
    }

    // duration + size + composition time offset present
    const FULL_FLAGS: u32 = 0x000100 | 0x000200 | 0x000800;

    fn full_trun(samples: &[(u32, u32, i32)]) -> Vec<u8> {
        let mut content = Vec::new();
        content.extend_from_slice(&(samples.len() as u32).to_be_bytes());
        for &(duration, size, cts) in samples {
            content.extend_from_slice(&duration.to_be_bytes());
            content.extend_from_slice(&size.to_be_bytes());
            content.extend_from_slice(&cts.to_be_bytes());
        }
        trun_bytes(1, FULL_FLAGS, &content)
    }

    #[test]
    fn test_dts_accumulates_from_base() {
        let trun = full_trun(&[(3000, 100, 0), (3000, 200, 1500), (1500, 300, -500)]);
        let tfhd = TrackFragmentHeader {
            track_id: 1,
            ..TrackFragmentHeader::default()
        };

        let samples = build_samples(&[trun.as_slice()], 90_000, &tfhd);
        assert_eq!(samples.len(), 3);

        assert_eq!(samples[0].dts, 90_000);
        assert_eq!(samples[0].pts, 90_000);
        assert_eq!(samples[1].dts, 93_000);
        assert_eq!(samples[1].pts, 94_500);
        assert_eq!(samples[2].dts, 96_000);
        assert_eq!(samples[2].pts, 95_500);
        assert!(samples.iter().all(|s| s.track_id == 1));
    }

    #[test]
    fn test_defaults_imputed_from_tfhd() {
        // trun carries no per-sample fields at all.
        let mut content = Vec::new();
        content.extend_from_slice(&2u32.to_be_bytes());
        let trun = trun_bytes(0, 0, &content);

        let tfhd = TrackFragmentHeader {
            track_id: 4,
            default_sample_duration: Some(1001),
            default_sample_size: Some(4096),
            ..TrackFragmentHeader::default()
        };

        let samples = build_samples(&[trun.as_slice()], 0, &tfhd);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].duration, 1001);
        assert_eq!(samples[0].size, 4096);
        assert_eq!(samples[0].composition_time_offset, 0);
        assert_eq!(samples[1].dts, 1001);
    }

    #[test]
    fn test_multiple_truns_preserve_order() {
        let first = full_trun(&[(10, 1, 0), (10, 2, 0)]);
        let second = full_trun(&[(10, 3, 0)]);
        let tfhd = TrackFragmentHeader {
            track_id: 1,
            ..TrackFragmentHeader::default()
        };

        let samples = build_samples(&[first.as_slice(), second.as_slice()], 0, &tfhd);
        let sizes: Vec<u32> = samples.iter().map(|s| s.size).collect();
        assert_eq!(sizes, vec![1, 2, 3]);
        assert_eq!(samples[2].dts, 20);
    }

    #[test]
    fn test_base_time_past_53_bit_range_is_exact() {
        let base = (1u64 << 53) + 1;
        let trun = full_trun(&[(1, 1, 0), (1, 1, 0)]);
        let tfhd = TrackFragmentHeader {
            track_id: 1,
            ..TrackFragmentHeader::default()
        };

        let samples = build_samples(&[trun.as_slice()], base, &tfhd);
        assert_eq!(samples[0].dts, base as i64);
        assert_eq!(samples[1].dts, base as i64 + 1);
    }

    #[test]
    fn test_unreadable_trun_is_skipped() {
        let good = full_trun(&[(10, 5, 0)]);
        let samples = build_samples(
            &[&[0u8, 0][..], good.as_slice()],
            0,
            &TrackFragmentHeader {
                track_id: 1,
                ..TrackFragmentHeader::default()
            },
        );
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].size, 5);
    }
}
