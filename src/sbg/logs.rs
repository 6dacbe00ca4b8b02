//! Payload layouts of the decoded SBG ECom logs. All fields are little-endian.
use super::LogId;
use crate::timecode::UtcFields;
use crate::{Error, Result};

/// Degrees per radian.
pub const RAD_TO_DEG: f64 = 180.0 / std::f64::consts::PI;
/// Meters per second per IMU_SHORT delta velocity count.
pub const DELTA_VELOCITY_LSB: f64 = 1.0 / 1_048_576.0;
/// Radians per IMU_SHORT delta angle count.
pub const DELTA_ANGLE_LSB: f64 = 1.0 / 67_108_864.0;

/// Clock status value meaning the UTC time is valid.
const CLOCK_UTC_VALID: u16 = 2;
/// Solution mode value meaning a full navigation solution.
const SOL_MODE_NAV_POSITION: u32 = 4;

/// A decoded class 0 log.
pub trait SbgLog: Sized {
    const ID: LogId;

    /// Device timestamp in microseconds.
    fn timestamp(&self) -> u32;

    /// # Errors
    /// [Error::NotEnoughData] if `dat` is shorter than the log layout.
    fn decode(dat: &[u8]) -> Result<Self>;
}

/// Sequential little-endian field reader over a log payload.
pub(crate) struct FieldReader<'a> {
    dat: &'a [u8],
    pos: usize,
}

macro_rules! read_le {
    ($name:ident, $ty:ty) => {
        pub fn $name(&mut self) -> Result<$ty> {
            Ok(<$ty>::from_le_bytes(self.take()?))
        }
    };
}

impl<'a> FieldReader<'a> {
    pub fn new(dat: &'a [u8]) -> Self {
        FieldReader { dat, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let end = self.pos + N;
        if end > self.dat.len() {
            return Err(Error::NotEnoughData {
                actual: self.dat.len(),
                minimum: end,
            });
        }
        let mut buf = [0u8; N];
        buf.copy_from_slice(&self.dat[self.pos..end]);
        self.pos = end;
        Ok(buf)
    }

    read_le!(u8, u8);
    read_le!(u16, u16);
    read_le!(i16, i16);
    read_le!(u32, u32);
    read_le!(i32, i32);
    read_le!(f32, f32);
    read_le!(f64, f64);

    pub fn f32x3(&mut self) -> Result<[f32; 3]> {
        Ok([self.f32()?, self.f32()?, self.f32()?])
    }

    pub fn i32x3(&mut self) -> Result<[i32; 3]> {
        Ok([self.i32()?, self.i32()?, self.i32()?])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UtcTime {
    pub timestamp: u32,
    pub status: u16,
    pub fields: UtcFields,
    pub gps_tow: u32,
}

impl SbgLog for UtcTime {
    const ID: LogId = LogId::UtcTime;

    fn timestamp(&self) -> u32 {
        self.timestamp
    }

    fn decode(dat: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(dat);
        Ok(UtcTime {
            timestamp: r.u32()?,
            status: r.u16()?,
            fields: UtcFields {
                year: r.u16()?,
                month: r.u8()?,
                day: r.u8()?,
                hour: r.u8()?,
                minute: r.u8()?,
                second: r.u8()?,
                nanos: r.u32()?,
            },
            gps_tow: r.u32()?,
        })
    }
}

impl UtcTime {
    #[must_use]
    pub fn clock_valid(&self) -> bool {
        (self.status >> 6) & 0x0f == CLOCK_UTC_VALID
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImuData {
    pub timestamp: u32,
    pub status: u16,
    /// m/s²
    pub accel: [f32; 3],
    /// rad/s
    pub gyro: [f32; 3],
    /// °C
    pub temperature: f32,
    pub delta_velocity: [f32; 3],
    pub delta_angle: [f32; 3],
}

impl SbgLog for ImuData {
    const ID: LogId = LogId::ImuData;

    fn timestamp(&self) -> u32 {
        self.timestamp
    }

    fn decode(dat: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(dat);
        Ok(ImuData {
            timestamp: r.u32()?,
            status: r.u16()?,
            accel: r.f32x3()?,
            gyro: r.f32x3()?,
            temperature: r.f32()?,
            delta_velocity: r.f32x3()?,
            delta_angle: r.f32x3()?,
        })
    }
}

/// Fixed point IMU deltas.
#[derive(Debug, Clone, PartialEq)]
pub struct ImuShort {
    pub timestamp: u32,
    pub status: u16,
    pub delta_velocity: [i32; 3],
    pub delta_angle: [i32; 3],
    pub temperature: i16,
}

impl SbgLog for ImuShort {
    const ID: LogId = LogId::ImuShort;

    fn timestamp(&self) -> u32 {
        self.timestamp
    }

    fn decode(dat: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(dat);
        Ok(ImuShort {
            timestamp: r.u32()?,
            status: r.u16()?,
            delta_velocity: r.i32x3()?,
            delta_angle: r.i32x3()?,
            temperature: r.i16()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EkfEuler {
    pub timestamp: u32,
    /// Roll, pitch, yaw in radians.
    pub euler: [f32; 3],
    pub euler_std: [f32; 3],
    pub status: u32,
}

impl SbgLog for EkfEuler {
    const ID: LogId = LogId::EkfEuler;

    fn timestamp(&self) -> u32 {
        self.timestamp
    }

    fn decode(dat: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(dat);
        Ok(EkfEuler {
            timestamp: r.u32()?,
            euler: r.f32x3()?,
            euler_std: r.f32x3()?,
            status: r.u32()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EkfQuat {
    pub timestamp: u32,
    pub quaternion: [f32; 4],
    pub euler_std: [f32; 3],
    pub status: u32,
}

impl SbgLog for EkfQuat {
    const ID: LogId = LogId::EkfQuat;

    fn timestamp(&self) -> u32 {
        self.timestamp
    }

    fn decode(dat: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(dat);
        Ok(EkfQuat {
            timestamp: r.u32()?,
            quaternion: [r.f32()?, r.f32()?, r.f32()?, r.f32()?],
            euler_std: r.f32x3()?,
            status: r.u32()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EkfNav {
    pub timestamp: u32,
    /// North, east, down in m/s.
    pub velocity: [f32; 3],
    pub velocity_std: [f32; 3],
    /// Latitude, longitude in degrees and altitude in meters.
    pub position: [f64; 3],
    pub undulation: f32,
    pub position_std: [f32; 3],
    pub status: u32,
}

impl SbgLog for EkfNav {
    const ID: LogId = LogId::EkfNav;

    fn timestamp(&self) -> u32 {
        self.timestamp
    }

    fn decode(dat: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(dat);
        Ok(EkfNav {
            timestamp: r.u32()?,
            velocity: r.f32x3()?,
            velocity_std: r.f32x3()?,
            position: [r.f64()?, r.f64()?, r.f64()?],
            undulation: r.f32()?,
            position_std: r.f32x3()?,
            status: r.u32()?,
        })
    }
}

impl EkfNav {
    #[must_use]
    pub fn solution_valid(&self) -> bool {
        self.status & 0x0f == SOL_MODE_NAV_POSITION
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GpsVel {
    pub timestamp: u32,
    pub status: u32,
    pub time_of_week: u32,
    pub velocity: [f32; 3],
    pub velocity_acc: [f32; 3],
    pub course: f32,
    pub course_acc: f32,
}

impl SbgLog for GpsVel {
    const ID: LogId = LogId::Gps1Vel;

    fn timestamp(&self) -> u32 {
        self.timestamp
    }

    fn decode(dat: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(dat);
        Ok(GpsVel {
            timestamp: r.u32()?,
            status: r.u32()?,
            time_of_week: r.u32()?,
            velocity: r.f32x3()?,
            velocity_acc: r.f32x3()?,
            course: r.f32()?,
            course_acc: r.f32()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GpsPos {
    pub timestamp: u32,
    pub status: u32,
    pub time_of_week: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub undulation: f32,
    pub position_acc: [f32; 3],
}

impl SbgLog for GpsPos {
    const ID: LogId = LogId::Gps1Pos;

    fn timestamp(&self) -> u32 {
        self.timestamp
    }

    fn decode(dat: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(dat);
        Ok(GpsPos {
            timestamp: r.u32()?,
            status: r.u32()?,
            time_of_week: r.u32()?,
            latitude: r.f64()?,
            longitude: r.f64()?,
            altitude: r.f64()?,
            undulation: r.f32()?,
            position_acc: r.f32x3()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GpsHdt {
    pub timestamp: u32,
    pub status: u16,
    pub time_of_week: u32,
    /// Degrees.
    pub heading: f32,
    pub heading_acc: f32,
    /// Degrees.
    pub pitch: f32,
    pub pitch_acc: f32,
}

impl SbgLog for GpsHdt {
    const ID: LogId = LogId::Gps1Hdt;

    fn timestamp(&self) -> u32 {
        self.timestamp
    }

    fn decode(dat: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(dat);
        Ok(GpsHdt {
            timestamp: r.u32()?,
            status: r.u16()?,
            time_of_week: r.u32()?,
            heading: r.f32()?,
            heading_acc: r.f32()?,
            pitch: r.f32()?,
            pitch_acc: r.f32()?,
        })
    }
}

/// Barometric air data. Only the leading fields are decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct AirData {
    pub timestamp: u32,
    pub status: u16,
    /// Pa
    pub pressure_abs: f32,
    /// Meters.
    pub altitude: f32,
}

impl SbgLog for AirData {
    const ID: LogId = LogId::AirData;

    fn timestamp(&self) -> u32 {
        self.timestamp
    }

    fn decode(dat: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(dat);
        Ok(AirData {
            timestamp: r.u32()?,
            status: r.u16()?,
            pressure_abs: r.f32()?,
            altitude: r.f32()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_reports_short_payload() {
        let dat = [0u8; 5];
        let mut r = FieldReader::new(&dat);
        assert_eq!(r.u32().unwrap(), 0);
        let err = r.u16().unwrap_err();
        assert!(matches!(
            err,
            Error::NotEnoughData {
                actual: 5,
                minimum: 6
            }
        ));
    }

    #[test]
    fn utc_time_layout() {
        let dat = hex::decode(concat!(
            "40420f00", // ts 1_000_000
            "8000",     // status, clock valid
            "e507",     // 2021
            "06", "03", "0e", "05", "09",
            "80b2e60e", // 250_000_000 ns
            "10270000", // tow
        ))
        .unwrap();
        let utc = UtcTime::decode(&dat).unwrap();

        assert_eq!(utc.timestamp, 1_000_000);
        assert!(utc.clock_valid());
        assert_eq!(utc.fields.year, 2021);
        assert_eq!(utc.fields.hour, 14);
        assert_eq!(utc.fields.nanos, 250_000_000);
        assert_eq!(utc.gps_tow, 10_000);
    }

    #[test]
    fn utc_clock_status_bits() {
        let mut utc = UtcTime {
            timestamp: 0,
            status: 0,
            fields: UtcFields::default(),
            gps_tow: 0,
        };
        assert!(!utc.clock_valid());
        utc.status = 1 << 6;
        assert!(!utc.clock_valid());
        utc.status = (2 << 6) | 0x3f;
        assert!(utc.clock_valid());
    }

    #[test]
    fn ekf_nav_layout() {
        let mut dat = Vec::new();
        dat.extend_from_slice(&77u32.to_le_bytes());
        for v in [1.0f32, 2.0, 3.0, 0.1, 0.1, 0.1] {
            dat.extend_from_slice(&v.to_le_bytes());
        }
        for v in [48.5f64, 2.25, 120.0] {
            dat.extend_from_slice(&v.to_le_bytes());
        }
        for v in [0.0f32, 1.0, 1.0, 1.0] {
            dat.extend_from_slice(&v.to_le_bytes());
        }
        dat.extend_from_slice(&0x0000_0014u32.to_le_bytes());

        let nav = EkfNav::decode(&dat).unwrap();
        assert_eq!(nav.timestamp, 77);
        assert_eq!(nav.velocity, [1.0, 2.0, 3.0]);
        assert_eq!(nav.position, [48.5, 2.25, 120.0]);
        assert!(nav.solution_valid());

        assert!(EkfNav::decode(&dat[..dat.len() - 1]).is_err());
    }

    #[test]
    fn imu_short_layout() {
        let mut dat = Vec::new();
        dat.extend_from_slice(&9u32.to_le_bytes());
        dat.extend_from_slice(&0u16.to_le_bytes());
        for v in [1_048_576i32, -524_288, 0, 67_108_864, 0, -1] {
            dat.extend_from_slice(&v.to_le_bytes());
        }
        dat.extend_from_slice(&25i16.to_le_bytes());

        let imu = ImuShort::decode(&dat).unwrap();
        assert_eq!(imu.delta_velocity, [1_048_576, -524_288, 0]);
        assert_eq!(imu.delta_angle, [67_108_864, 0, -1]);
        assert_eq!(imu.temperature, 25);
    }
}
