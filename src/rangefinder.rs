//! Rangefinder log families.
//!
//! Raw TeraRanger streams are a sequence of 4 byte distance frames protected by a
//! CRC-8. The ZR logger wraps a rangefinder reading into a fixed 16 byte record that
//! adds a device timestamp and a CRC-16/ARC. Two ZR payloads exist: USD1 radar
//! altimeter readings and an embedded TeraRanger frame (NEO).
//!
//! None of these logs carry a clock or solution status, so their sessions are live
//! from the first record and no channel is gated.
use std::ops::Range;

use crate::channel::{ChannelId, ChannelSpec};
use crate::config::DecodeConfig;
use crate::decoder::{Context, Disposition, LogDecoder};
use crate::integrity::{Checksum, Crc16Arc, Crc8};
use crate::session::SessionTracker;
use crate::synchronizer::{Frame, FrameFormat};
use crate::Result;

pub const TERARANGER_MARKER: u8 = 0x54;
pub const TERARANGER_FRAME_LEN: usize = 4;

pub const ZR_MARKER: [u8; 2] = [0x5a, 0xa5];
pub const ZR_FRAME_LEN: usize = 16;
/// Bytes of a ZR record covered by its CRC.
pub const ZR_CHECKSUM_SPAN: Range<usize> = 0..14;

const AGL: ChannelId = 0;
const SNR: ChannelId = 1;

/// Distance in millimeters carried by a TeraRanger frame, or `None` if `dat` does not
/// start with a valid frame.
#[must_use]
pub fn teraranger_distance(dat: &[u8]) -> Option<u16> {
    let frame = dat.get(..TERARANGER_FRAME_LEN)?;
    if frame[0] != TERARANGER_MARKER || !TerarangerFormat.verify(frame) {
        return None;
    }
    Some(u16::from_be_bytes([frame[1], frame[2]]))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TerarangerFormat;

impl FrameFormat for TerarangerFormat {
    fn marker(&self) -> &[u8] {
        &[TERARANGER_MARKER]
    }

    fn header_len(&self) -> usize {
        1
    }

    fn frame_len(&self, _header: &[u8]) -> Option<usize> {
        Some(TERARANGER_FRAME_LEN)
    }

    fn checksum(&self) -> &dyn Checksum {
        &Crc8
    }

    fn checksum_span(&self, frame_len: usize) -> Range<usize> {
        0..frame_len - 1
    }

    fn stored_checksum(&self, frame: &[u8]) -> u16 {
        u16::from(frame[frame.len() - 1])
    }
}

/// Raw TeraRanger stream. Frames carry no clock, so the frame ordinal is used as the
/// device timestamp.
#[derive(Debug, Default)]
pub struct TerarangerDecoder {
    ordinal: u32,
}

impl LogDecoder for TerarangerDecoder {
    type Format = TerarangerFormat;

    fn format(&self) -> Self::Format {
        TerarangerFormat
    }

    fn default_chunk_size(&self) -> usize {
        TERARANGER_FRAME_LEN
    }

    fn channels(&self, _config: &DecodeConfig) -> Vec<ChannelSpec> {
        vec![ChannelSpec::free("agl")]
    }

    fn session(&self, config: &DecodeConfig) -> SessionTracker {
        SessionTracker::free_running(config)
    }

    fn handle(&mut self, frame: &Frame, ctx: &mut Context<'_>) -> Result<Disposition> {
        let ts = self.ordinal;
        self.ordinal = self.ordinal.wrapping_add(1);
        ctx.session.observe(ts);

        let mm = u16::from_be_bytes([frame.data[1], frame.data[2]]);
        ctx.emit(AGL, ts, f64::from(mm) * 0.001);
        Ok(Disposition::Decoded)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ZrFormat;

impl FrameFormat for ZrFormat {
    fn marker(&self) -> &[u8] {
        &ZR_MARKER
    }

    fn header_len(&self) -> usize {
        ZR_MARKER.len()
    }

    fn frame_len(&self, _header: &[u8]) -> Option<usize> {
        Some(ZR_FRAME_LEN)
    }

    fn checksum(&self) -> &dyn Checksum {
        &Crc16Arc
    }

    fn checksum_span(&self, _frame_len: usize) -> Range<usize> {
        ZR_CHECKSUM_SPAN
    }

    fn stored_checksum(&self, frame: &[u8]) -> u16 {
        u16::from_le_bytes([frame[14], frame[15]])
    }
}

/// Payload carried in the 6 byte body of a ZR record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZrPayload {
    /// `hdr | ver | distance u16 BE (cm) | snr | reserved`
    Usd1,
    /// TeraRanger frame followed by 2 pad bytes.
    Neo,
}

#[derive(Debug)]
pub struct ZrDecoder {
    payload: ZrPayload,
}

impl ZrDecoder {
    #[must_use]
    pub fn usd1() -> Self {
        ZrDecoder {
            payload: ZrPayload::Usd1,
        }
    }

    #[must_use]
    pub fn neo() -> Self {
        ZrDecoder {
            payload: ZrPayload::Neo,
        }
    }
}

impl LogDecoder for ZrDecoder {
    type Format = ZrFormat;

    fn format(&self) -> Self::Format {
        ZrFormat
    }

    fn default_chunk_size(&self) -> usize {
        ZR_FRAME_LEN
    }

    fn channels(&self, _config: &DecodeConfig) -> Vec<ChannelSpec> {
        match self.payload {
            ZrPayload::Usd1 => vec![ChannelSpec::free("agl"), ChannelSpec::free("snr")],
            ZrPayload::Neo => vec![ChannelSpec::free("agl")],
        }
    }

    fn session(&self, config: &DecodeConfig) -> SessionTracker {
        SessionTracker::free_running(config)
    }

    fn handle(&mut self, frame: &Frame, ctx: &mut Context<'_>) -> Result<Disposition> {
        let dat = &frame.data;
        let ts = u32::from_le_bytes([dat[4], dat[5], dat[6], dat[7]]);
        ctx.session.observe(ts);

        match self.payload {
            ZrPayload::Usd1 => {
                let cm = u16::from_be_bytes([dat[10], dat[11]]);
                ctx.emit(AGL, ts, f64::from(cm) * 0.01);
                ctx.emit(SNR, ts, f64::from(dat[12]));
            }
            ZrPayload::Neo => {
                let Some(mm) = teraranger_distance(&dat[8..14]) else {
                    return Ok(Disposition::BadChecksum);
                };
                ctx.emit(AGL, ts, f64::from(mm) * 0.001);
            }
        }
        Ok(Disposition::Decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelStore;
    use crate::config::RebaseMode;

    fn teraranger(mm: u16) -> Vec<u8> {
        let mut dat = vec![TERARANGER_MARKER];
        dat.extend_from_slice(&mm.to_be_bytes());
        dat.push(Crc8.compute(&dat) as u8);
        dat
    }

    fn record(ts: u32, body: [u8; 6]) -> Frame {
        let mut dat = ZR_MARKER.to_vec();
        dat.extend_from_slice(&12u16.to_le_bytes());
        dat.extend_from_slice(&ts.to_le_bytes());
        dat.extend_from_slice(&body);
        let crc = Crc16Arc.compute(&dat);
        dat.extend_from_slice(&crc.to_le_bytes());
        Frame {
            offset: 0,
            data: dat,
        }
    }

    fn run_frames<D: LogDecoder>(
        decoder: &mut D,
        frames: &[Frame],
        config: &DecodeConfig,
    ) -> (ChannelStore, Vec<Disposition>) {
        let mut store = ChannelStore::new(decoder.channels(config));
        let mut session = decoder.session(config);
        let mut results = Vec::new();
        for frame in frames {
            let mut ctx = Context {
                store: &mut store,
                session: &mut session,
            };
            results.push(decoder.handle(frame, &mut ctx).unwrap());
        }
        (store, results)
    }

    #[test]
    fn teraranger_distance_checks_marker_and_crc() {
        let frame = teraranger(1234);
        assert_eq!(teraranger_distance(&frame), Some(1234));

        let mut bad = frame.clone();
        bad[2] ^= 0x01;
        assert_eq!(teraranger_distance(&bad), None);

        let mut wrong_marker = frame;
        wrong_marker[0] = 0x55;
        assert_eq!(teraranger_distance(&wrong_marker), None);

        assert_eq!(teraranger_distance(&[TERARANGER_MARKER, 0x00]), None);
    }

    #[test]
    fn zr_format_verifies_le_crc() {
        let frame = record(1, [0; 6]);
        assert!(ZrFormat.verify(&frame.data));

        let mut dat = frame.data;
        dat.swap(14, 15);
        assert!(!ZrFormat.verify(&dat));
    }

    #[test]
    fn usd1_record() {
        let config = DecodeConfig::default();
        let frames = [record(1_000, [0xa1, 0x01, 0x01, 0x2c, 42, 0x00])];
        let (store, results) = run_frames(&mut ZrDecoder::usd1(), &frames, &config);

        assert_eq!(results, [Disposition::Decoded]);
        let agl = store.samples(AGL);
        assert_eq!(agl.len(), 1);
        assert_eq!(agl[0].ts, 1_000);
        assert!((agl[0].value - 3.0).abs() < 1e-9);
        assert_eq!(store.samples(SNR)[0].value, 42.0);
    }

    #[test]
    fn usd1_relative_timestamps_start_at_zero() {
        let config = DecodeConfig::builder().rebase(RebaseMode::Relative).build();
        let frames = [
            record(5_000, [0; 6]),
            record(5_250, [0; 6]),
            record(5_500, [0; 6]),
        ];
        let (store, _) = run_frames(&mut ZrDecoder::usd1(), &frames, &config);

        let ts: Vec<i64> = store.samples(AGL).iter().map(|s| s.ts).collect();
        assert_eq!(ts, [0, 250, 500]);
    }

    #[test]
    fn neo_record_with_bad_inner_frame_is_rejected() {
        let config = DecodeConfig::default();
        let good = teraranger(2_500);
        let mut bad = good.clone();
        bad[3] ^= 0xff;

        let body = |inner: &[u8]| -> [u8; 6] {
            let mut body = [0u8; 6];
            body[..4].copy_from_slice(inner);
            body
        };
        let frames = [record(10, body(&good)), record(20, body(&bad))];
        let (store, results) = run_frames(&mut ZrDecoder::neo(), &frames, &config);

        assert_eq!(results, [Disposition::Decoded, Disposition::BadChecksum]);
        let agl = store.samples(AGL);
        assert_eq!(agl.len(), 1);
        assert!((agl[0].value - 2.5).abs() < 1e-9);
    }

    #[test]
    fn teraranger_uses_frame_ordinal_as_time() {
        let config = DecodeConfig::default();
        let frames: Vec<Frame> = [100u16, 200, 300]
            .into_iter()
            .map(|mm| Frame {
                offset: 0,
                data: teraranger(mm),
            })
            .collect();
        let (store, _) = run_frames(&mut TerarangerDecoder::default(), &frames, &config);

        let ts: Vec<i64> = store.samples(AGL).iter().map(|s| s.ts).collect();
        assert_eq!(ts, [0, 1, 2]);
    }
}
