//! Stateful SEI extraction façade.

use std::collections::HashMap;

use crate::boxes::{find_boxes, fragment, sample_table, BoxType};
use crate::codec::avc;
use crate::types::{LogRecord, ParsedSei, SeiEvent};

/// Extracts timestamped SEI events from fragmented MP4 media segments.
///
/// The extractor binds to a single video track (the first entry of the
/// init-segment track list) and pairs each `moof`/`traf` with its `mdat`
/// positionally. Segments received before an init segment is known are
/// cached and drained once a binding exists.
///
/// `parse` is not reentrant; callers serialize calls against one
/// extractor. No failure crosses this façade: anomalies surface as log
/// records in the result, or as a `None` return.
#[derive(Debug, Default)]
pub struct SeiExtractor {
    initialized: bool,
    track_id: Option<u32>,
    timescale: Option<u32>,
    segment_cache: Vec<Vec<u8>>,
}

impl SeiExtractor {
    /// Create an uninitialized extractor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether [`init`](Self::init) has been called.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Mark the extractor ready to accept segments. Idempotent.
    pub fn init(&mut self) {
        self.initialized = true;
    }

    /// Whether the given init-segment data names a binding different from
    /// the current one. False when either input is empty.
    pub fn is_new_init(&self, video_track_ids: &[u32], timescales: &HashMap<u32, u32>) -> bool {
        if video_track_ids.is_empty() || timescales.is_empty() {
            return false;
        }
        let candidate = video_track_ids[0];
        self.track_id != Some(candidate) || self.timescale != timescales.get(&candidate).copied()
    }

    /// Parse one segment, returning timestamped SEI events and logs.
    ///
    /// Returns `None` when the extractor is uninitialized, when no track
    /// binding can be established yet (the segment is cached for later),
    /// or when the segment yields neither events nor logs. Draining the
    /// cache happens before the current segment, so events appear in
    /// arrival order.
    pub fn parse(
        &mut self,
        segment: &[u8],
        video_track_ids: &[u32],
        timescales: &HashMap<u32, u32>,
    ) -> Option<ParsedSei> {
        if !self.initialized {
            return None;
        }

        if self.is_new_init(video_track_ids, timescales) {
            let track_id = video_track_ids[0];
            self.track_id = Some(track_id);
            self.timescale = timescales.get(&track_id).copied();
            tracing::debug!(track_id, timescale = ?self.timescale, "bound video track");
        }

        let (Some(track_id), Some(timescale)) = (self.track_id, self.timescale) else {
            // No usable binding yet; hold the segment until an init
            // segment arrives.
            self.segment_cache.push(segment.to_vec());
            return None;
        };

        let mut out = ParsedSei::default();

        // Drain segments that arrived before the binding, oldest first.
        for cached in std::mem::take(&mut self.segment_cache) {
            parse_segment(&cached, track_id, timescale, &mut out);
        }
        parse_segment(segment, track_id, timescale, &mut out);

        if out.is_empty() {
            None
        } else {
            Some(out)
        }
    }

    /// Clear the track binding and any cached segments. The initialized
    /// flag is untouched.
    pub fn reset(&mut self) {
        self.track_id = None;
        self.timescale = None;
        self.segment_cache.clear();
    }
}

/// Extract SEI events from one segment under a known track binding,
/// appending events and logs to `out`.
pub(crate) fn parse_segment(segment: &[u8], track_id: u32, timescale: u32, out: &mut ParsedSei) {
    let trafs = find_boxes(segment, &[BoxType::MOOF, BoxType::TRAF]);
    let mdats = find_boxes(segment, &[BoxType::MDAT]);
    tracing::debug!(
        trafs = trafs.len(),
        mdats = mdats.len(),
        track_id,
        "scanning segment"
    );

    // moof and mdat come in pairs in segment order; pair positionally.
    // A surplus on either side stays unprocessed.
    for (&mdat, &traf) in mdats.iter().zip(trafs.iter()) {
        let Some(tfhd_bytes) = find_boxes(traf, &[BoxType::TFHD]).into_iter().next() else {
            continue;
        };
        let header = match fragment::parse_tfhd(tfhd_bytes) {
            Ok(header) => header,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable track fragment");
                out.logs
                    .push(LogRecord::warn(format!("skipping track fragment: {e}")));
                continue;
            }
        };

        let base_media_decode_time = find_boxes(traf, &[BoxType::TFDT])
            .first()
            .and_then(|tfdt| fragment::parse_tfdt(tfdt).ok())
            .map(|tfdt| tfdt.base_media_decode_time)
            .unwrap_or(0);

        let truns = find_boxes(traf, &[BoxType::TRUN]);
        if header.track_id != track_id || truns.is_empty() {
            continue;
        }

        let samples = sample_table::build_samples(&truns, base_media_decode_time, &header);
        let (nals, logs) = avc::find_sei_nals(mdat, &samples, track_id);
        tracing::debug!(
            samples = samples.len(),
            sei_nals = nals.len(),
            "scanned track fragment"
        );
        out.logs.extend(logs);

        for nal in &nals {
            for message in avc::parse_sei_messages(&nal.escaped_rbsp) {
                out.sei.push(SeiEvent {
                    pts: nal.pts as f64 / timescale as f64,
                    payload_type: message.payload_type,
                    payload_size: message.payload_size,
                    payload: message.payload.to_vec(),
                });
            }
        }
    }
}
