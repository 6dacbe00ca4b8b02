//! The decode loop shared by all log families.
//!
//! A decode pulls frames from a [FrameScanner], hands each one to the family's
//! [LogDecoder], and finally records the scan statistics and session outcome in the
//! snapshot metadata.
use std::fmt::Display;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::channel::{ChannelId, ChannelSpec, ChannelStore, Snapshot};
use crate::config::DecodeConfig;
use crate::rangefinder::{TerarangerDecoder, ZrDecoder};
use crate::sbg::SbgDecoder;
use crate::session::SessionTracker;
use crate::synchronizer::{Frame, FrameFormat, FrameScanner};
use crate::{Error, Result};

/// Supported log families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    /// SBG ECom binary log.
    Sbg,
    /// ZR logger records carrying USD1 radar altimeter readings.
    Usd1,
    /// ZR logger records carrying an embedded TeraRanger frame.
    Neo,
    /// Raw TeraRanger binary stream.
    Teraranger,
}

impl Family {
    pub const ALL: [Family; 4] = [Self::Sbg, Self::Usd1, Self::Neo, Self::Teraranger];

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sbg => "sbg",
            Self::Usd1 => "usd1",
            Self::Neo => "neo",
            Self::Teraranger => "teraranger",
        }
    }
}

impl Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Family {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownFamily(s.to_string()))
    }
}

/// What a [LogDecoder] did with a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Decoded,
    /// Message type not decoded by this crate.
    Ignored,
    /// A checksum nested inside the frame payload did not match.
    BadChecksum,
}

/// Mutable state a message decoder writes to.
pub struct Context<'a> {
    pub store: &'a mut ChannelStore,
    pub session: &'a mut SessionTracker,
}

impl Context<'_> {
    /// Append a sample unless the channel is gated and the session is not live, or the
    /// timestamp cannot be rebased yet. Returns true if the sample was kept.
    pub fn emit(&mut self, id: ChannelId, device_ts: u32, value: f64) -> bool {
        if !self.session.accepts(self.store.spec(id).gated) {
            return false;
        }
        let Some(ts) = self.session.rebase(device_ts) else {
            trace!(channel = self.store.spec(id).name, "no time reference; sample dropped");
            return false;
        };
        self.store.append(id, ts, value);
        true
    }
}

/// Per-family message decoding plugged into [run].
pub trait LogDecoder {
    type Format: FrameFormat;

    fn format(&self) -> Self::Format;

    /// Read size used when the config does not set one.
    fn default_chunk_size(&self) -> usize;

    fn channels(&self, config: &DecodeConfig) -> Vec<ChannelSpec>;

    fn session(&self, config: &DecodeConfig) -> SessionTracker;

    /// Decode one checksum valid frame.
    ///
    /// # Errors
    /// [Error::NotEnoughData] if the payload is too short for its message layout.
    fn handle(&mut self, frame: &Frame, ctx: &mut Context<'_>) -> Result<Disposition>;
}

#[derive(Debug, Default)]
struct Counts {
    nested_bad_checksums: usize,
    short_payloads: usize,
    ignored: usize,
}

/// Decode everything `reader` provides using `decoder`.
///
/// # Errors
/// [Error::InvalidConfig] if `config` does not validate, [Error::Io] if reading fails.
pub fn run<R, D>(
    reader: R,
    mut decoder: D,
    family: Family,
    config: &DecodeConfig,
) -> Result<Snapshot>
where
    R: Read,
    D: LogDecoder,
{
    config.validate()?;
    let chunk_size = config.chunk_size.unwrap_or_else(|| decoder.default_chunk_size());
    let mut scanner = FrameScanner::new(reader, decoder.format(), chunk_size);
    let mut store = ChannelStore::new(decoder.channels(config));
    let mut session = decoder.session(config);
    let mut counts = Counts::default();

    while let Some(frame) = scanner.next_frame()? {
        let mut ctx = Context {
            store: &mut store,
            session: &mut session,
        };
        match decoder.handle(&frame, &mut ctx) {
            Ok(Disposition::Decoded) => {}
            Ok(Disposition::Ignored) => counts.ignored += 1,
            Ok(Disposition::BadChecksum) => {
                debug!(offset = frame.offset, "bad nested checksum");
                counts.nested_bad_checksums += 1;
            }
            Err(Error::NotEnoughData { actual, minimum }) => {
                debug!(offset = frame.offset, actual, minimum, "short payload");
                counts.short_payloads += 1;
            }
            Err(err) => return Err(err),
        }
    }

    let stats = scanner.stats().clone();
    let truncated = scanner.truncated();
    debug!(
        %family,
        frames = stats.frames,
        resyncs = stats.resyncs,
        bad_checksums = stats.bad_checksums,
        discarded = stats.discarded,
        ignored = counts.ignored,
        "decode finished"
    );

    let meta = store.metadata_mut();
    session.finish(stats.frames, meta);
    meta.set_if_absent("frames", stats.frames.to_string());
    meta.set_if_absent("resync", stats.resyncs.to_string());
    meta.set_if_absent(
        "bad_crc",
        (stats.bad_checksums + counts.nested_bad_checksums).to_string(),
    );
    if truncated > 0 {
        meta.set_if_absent("truncated", truncated.to_string());
    }
    meta.set_if_absent("short_payload", counts.short_payloads.to_string());
    meta.set_if_absent("family", family.name());
    meta.set_if_absent("rebase", config.rebase.to_string());

    Ok(store.finish())
}

/// Decode a log of the given family from `reader`.
///
/// # Errors
/// [Error::InvalidConfig] if `config` does not validate, [Error::Io] if reading fails.
pub fn decode<R: Read>(reader: R, family: Family, config: &DecodeConfig) -> Result<Snapshot> {
    match family {
        Family::Sbg => run(reader, SbgDecoder::default(), family, config),
        Family::Usd1 => run(reader, ZrDecoder::usd1(), family, config),
        Family::Neo => run(reader, ZrDecoder::neo(), family, config),
        Family::Teraranger => run(reader, TerarangerDecoder::default(), family, config),
    }
}

/// Decode the log file at `path`.
///
/// # Errors
/// [Error::Io] if the file cannot be opened or read, [Error::InvalidConfig] if `config`
/// does not validate.
pub fn decode_file<P: AsRef<Path>>(
    path: P,
    family: Family,
    config: &DecodeConfig,
) -> Result<Snapshot> {
    let path = path.as_ref();
    let file = File::open(path)?;
    debug!(path = %path.display(), %family, "decoding");
    decode(BufReader::new(file), family, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("sbg", Family::Sbg)]
    #[test_case("usd1", Family::Usd1)]
    #[test_case("NEO", Family::Neo)]
    #[test_case("teraranger", Family::Teraranger)]
    fn family_from_str(s: &str, expected: Family) {
        assert_eq!(s.parse::<Family>().unwrap(), expected);
    }

    #[test]
    fn unknown_family() {
        assert!(matches!(
            "zr".parse::<Family>(),
            Err(Error::UnknownFamily(name)) if name == "zr"
        ));
    }

    #[test]
    fn empty_source_is_an_error_session() {
        let dat: &[u8] = &[];
        for family in Family::ALL {
            let snapshot = decode(dat, family, &DecodeConfig::default()).unwrap();
            assert_eq!(snapshot.metadata.get("session"), Some("error"), "{family}");
            assert_eq!(snapshot.metadata.get("frames"), Some("0"));
            assert_eq!(snapshot.metadata.get("family"), Some(family.name()));
            assert_eq!(snapshot.sample_count(), 0);
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let dat: &[u8] = &[];
        let config = DecodeConfig::builder().jump_threshold(0).build();
        assert!(matches!(
            decode(dat, Family::Sbg, &config),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = decode_file(
            "/this/path/does/not/exist.bin",
            Family::Usd1,
            &DecodeConfig::default(),
        );
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
