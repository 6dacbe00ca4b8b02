//! SBG Systems ECom binary logs.
//!
//! Frame layout:
//! ```text
//! FF 5A | msg id | class | len u16 LE | payload | CRC-16/KERMIT u16 BE | 33
//! ```
//! The CRC covers everything from the message id through the payload. Only logs of
//! class [LOG_CLASS_ECOM_0] are decoded; others are ignored.
mod dispatch;
pub mod logs;

use std::ops::Range;

pub use dispatch::MessageDispatcher;
pub use logs::SbgLog;

use crate::channel::{ChannelId, ChannelSpec};
use crate::config::DecodeConfig;
use crate::decoder::{Context, Disposition, LogDecoder};
use crate::integrity::{Checksum, Crc16Kermit};
use crate::session::SessionTracker;
use crate::synchronizer::{Frame, FrameFormat};
use crate::Result;

pub const SYNC: [u8; 2] = [0xff, 0x5a];
pub const ETX: u8 = 0x33;
/// Sync, id, class and length.
pub const HEADER_LEN: usize = 6;
/// Header, CRC and ETX.
pub const OVERHEAD: usize = HEADER_LEN + 3;
pub const MAX_PAYLOAD_LEN: usize = 4086;
pub const LOG_CLASS_ECOM_0: u8 = 0x00;

/// Default read size.
pub const CHUNK_SIZE: usize = 4096;

/// Message ids of the decoded class 0 logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LogId {
    UtcTime = 2,
    ImuData = 3,
    EkfEuler = 6,
    EkfQuat = 7,
    EkfNav = 8,
    Gps1Vel = 13,
    Gps1Pos = 14,
    Gps1Hdt = 15,
    AirData = 36,
    ImuShort = 44,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SbgFormat;

impl FrameFormat for SbgFormat {
    fn marker(&self) -> &[u8] {
        &SYNC
    }

    fn header_len(&self) -> usize {
        HEADER_LEN
    }

    fn frame_len(&self, header: &[u8]) -> Option<usize> {
        let len = usize::from(u16::from_le_bytes([header[4], header[5]]));
        if len > MAX_PAYLOAD_LEN {
            return None;
        }
        Some(len + OVERHEAD)
    }

    fn checksum(&self) -> &dyn Checksum {
        &Crc16Kermit
    }

    fn checksum_span(&self, frame_len: usize) -> Range<usize> {
        SYNC.len()..frame_len - 3
    }

    fn stored_checksum(&self, frame: &[u8]) -> u16 {
        let n = frame.len();
        u16::from_be_bytes([frame[n - 3], frame[n - 2]])
    }

    fn verify(&self, frame: &[u8]) -> bool {
        let span = self.checksum_span(frame.len());
        frame.last() == Some(&ETX)
            && self.checksum().compute(&frame[span]) == self.stored_checksum(frame)
    }
}

/// A frame split into its addressing fields and payload.
#[derive(Debug, Clone, Copy)]
pub struct Message<'a> {
    pub id: u8,
    pub class: u8,
    pub payload: &'a [u8],
}

impl<'a> Message<'a> {
    /// Split a checksum valid frame.
    #[must_use]
    pub fn from_frame(frame: &'a [u8]) -> Self {
        Message {
            id: frame[2],
            class: frame[3],
            payload: &frame[HEADER_LEN..frame.len() - 3],
        }
    }
}

/// Channels produced from SBG logs, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SbgChannel {
    Roll,
    Pitch,
    Yaw,
    Lat,
    Lon,
    Alt,
    Vn,
    Ve,
    Vd,
    DeltaVx,
    DeltaVy,
    DeltaVz,
    DeltaAx,
    DeltaAy,
    DeltaAz,
    GnssLat,
    GnssLon,
    GnssAlt,
    GnssVn,
    GnssVe,
    GnssVd,
    BaroAlt,
    AccelX,
    AccelY,
    AccelZ,
    GyroX,
    GyroY,
    GyroZ,
    ImuTemp,
    Q0,
    Q1,
    Q2,
    Q3,
    GnssHeading,
    GnssPitch,
}

impl SbgChannel {
    pub const ALL: [SbgChannel; 35] = [
        Self::Roll,
        Self::Pitch,
        Self::Yaw,
        Self::Lat,
        Self::Lon,
        Self::Alt,
        Self::Vn,
        Self::Ve,
        Self::Vd,
        Self::DeltaVx,
        Self::DeltaVy,
        Self::DeltaVz,
        Self::DeltaAx,
        Self::DeltaAy,
        Self::DeltaAz,
        Self::GnssLat,
        Self::GnssLon,
        Self::GnssAlt,
        Self::GnssVn,
        Self::GnssVe,
        Self::GnssVd,
        Self::BaroAlt,
        Self::AccelX,
        Self::AccelY,
        Self::AccelZ,
        Self::GyroX,
        Self::GyroY,
        Self::GyroZ,
        Self::ImuTemp,
        Self::Q0,
        Self::Q1,
        Self::Q2,
        Self::Q3,
        Self::GnssHeading,
        Self::GnssPitch,
    ];

    #[must_use]
    pub fn id(self) -> ChannelId {
        self as ChannelId
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Roll => "roll",
            Self::Pitch => "pitch",
            Self::Yaw => "yaw",
            Self::Lat => "lat",
            Self::Lon => "lon",
            Self::Alt => "alt",
            Self::Vn => "vn",
            Self::Ve => "ve",
            Self::Vd => "vd",
            Self::DeltaVx => "delta_vx",
            Self::DeltaVy => "delta_vy",
            Self::DeltaVz => "delta_vz",
            Self::DeltaAx => "delta_ax",
            Self::DeltaAy => "delta_ay",
            Self::DeltaAz => "delta_az",
            Self::GnssLat => "gnss_lat",
            Self::GnssLon => "gnss_lon",
            Self::GnssAlt => "gnss_alt",
            Self::GnssVn => "gnss_vn",
            Self::GnssVe => "gnss_ve",
            Self::GnssVd => "gnss_vd",
            Self::BaroAlt => "baro_alt",
            Self::AccelX => "accel_x",
            Self::AccelY => "accel_y",
            Self::AccelZ => "accel_z",
            Self::GyroX => "gyro_x",
            Self::GyroY => "gyro_y",
            Self::GyroZ => "gyro_z",
            Self::ImuTemp => "imu_temp",
            Self::Q0 => "q0",
            Self::Q1 => "q1",
            Self::Q2 => "q2",
            Self::Q3 => "q3",
            Self::GnssHeading => "gnss_heading",
            Self::GnssPitch => "gnss_pitch",
        }
    }

    /// GNSS and air data channels, whose gating is configurable.
    #[must_use]
    pub fn is_aux(self) -> bool {
        matches!(
            self,
            Self::GnssLat
                | Self::GnssLon
                | Self::GnssAlt
                | Self::GnssVn
                | Self::GnssVe
                | Self::GnssVd
                | Self::GnssHeading
                | Self::GnssPitch
                | Self::BaroAlt
        )
    }
}

/// Channel table for SBG logs. Aux channels are gated only if `gate_aux` is set.
#[must_use]
pub fn channel_specs(gate_aux: bool) -> Vec<ChannelSpec> {
    SbgChannel::ALL
        .into_iter()
        .map(|ch| ChannelSpec {
            name: ch.name(),
            gated: gate_aux || !ch.is_aux(),
        })
        .collect()
}

/// Decodes SBG frames through a [MessageDispatcher].
#[derive(Debug, Default)]
pub struct SbgDecoder {
    dispatcher: MessageDispatcher,
}

impl LogDecoder for SbgDecoder {
    type Format = SbgFormat;

    fn format(&self) -> Self::Format {
        SbgFormat
    }

    fn default_chunk_size(&self) -> usize {
        CHUNK_SIZE
    }

    fn channels(&self, config: &DecodeConfig) -> Vec<ChannelSpec> {
        channel_specs(config.gate_aux)
    }

    fn session(&self, config: &DecodeConfig) -> SessionTracker {
        SessionTracker::new(config)
    }

    fn handle(&mut self, frame: &Frame, ctx: &mut Context<'_>) -> Result<Disposition> {
        let msg = Message::from_frame(&frame.data);
        if self.dispatcher.dispatch(&msg, ctx)? {
            Ok(Disposition::Decoded)
        } else {
            Ok(Disposition::Ignored)
        }
    }
}
