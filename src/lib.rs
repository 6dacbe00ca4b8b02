//! Decoding of binary navigation and rangefinder telemetry logs.
//!
//! A log is a raw byte stream of checksum protected frames, possibly corrupted or cut
//! short. Decoding locates and validates frames, decodes their messages into named
//! channels of `(timestamp, value)` samples, and tracks the recording session the
//! device clock describes. The result is a [Snapshot] of every channel plus a
//! first-write-wins [Metadata] summary.
//!
//! Supported families:
//! * SBG Systems ECom logs ([Family::Sbg])
//! * ZR logger records with USD1 ([Family::Usd1]) or TeraRanger ([Family::Neo]) payloads
//! * Raw TeraRanger streams ([Family::Teraranger])
//!
//! # Example
//! ```no_run
//! use navlog::{decode_file, DecodeConfig, Family};
//!
//! let snapshot = decode_file("flight.bin", Family::Sbg, &DecodeConfig::default()).unwrap();
//! println!("session: {:?}", snapshot.metadata.get("session"));
//! for sample in snapshot.get("roll").unwrap_or_default() {
//!     println!("{} {}", sample.ts, sample.value);
//! }
//! ```
mod error;

pub mod bytes;
pub mod channel;
pub mod config;
pub mod decoder;
pub mod integrity;
pub mod rangefinder;
pub mod sbg;
pub mod session;
pub mod synchronizer;
pub mod timecode;

pub use channel::{Channel, Metadata, Sample, Snapshot};
pub use config::{DecodeConfig, RebaseMode};
pub use decoder::{decode, decode_file, Family};
pub use error::{Error, Result};
