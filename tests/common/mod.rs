#![allow(dead_code)]
use std::io::Write;
use std::path::PathBuf;

use navlog::integrity::{Checksum, Crc16Arc, Crc16Kermit, Crc8};
use navlog::timecode::UtcFields;

pub fn fixture_path(name: &str) -> PathBuf {
    let mut path =
        PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set"));
    path.push("tests/fixtures");
    path.push(name);
    path
}

pub fn write_temp(dat: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(dat).unwrap();
    file.flush().unwrap();
    file
}

pub fn teraranger_frame(mm: u16) -> Vec<u8> {
    let mut dat = vec![0x54];
    dat.extend_from_slice(&mm.to_be_bytes());
    dat.push(Crc8.compute(&dat) as u8);
    dat
}

pub fn zr_record(ts: u32, body: [u8; 6]) -> Vec<u8> {
    let mut dat = vec![0x5a, 0xa5];
    dat.extend_from_slice(&12u16.to_le_bytes());
    dat.extend_from_slice(&ts.to_le_bytes());
    dat.extend_from_slice(&body);
    let crc = Crc16Arc.compute(&dat);
    dat.extend_from_slice(&crc.to_le_bytes());
    dat
}

pub fn usd1_record(ts: u32, cm: u16, snr: u8) -> Vec<u8> {
    let [hi, lo] = cm.to_be_bytes();
    zr_record(ts, [0xa1, 0x01, hi, lo, snr, 0x00])
}

pub fn neo_record(ts: u32, mm: u16) -> Vec<u8> {
    let inner = teraranger_frame(mm);
    zr_record(ts, [inner[0], inner[1], inner[2], inner[3], 0x00, 0x00])
}

pub mod sbg {
    use super::*;

    pub const UTC_TIME: u8 = 2;
    pub const EKF_EULER: u8 = 6;
    pub const EKF_NAV: u8 = 8;
    pub const GPS1_POS: u8 = 14;
    pub const AIR_DATA: u8 = 36;
    pub const IMU_SHORT: u8 = 44;

    pub fn frame(id: u8, payload: &[u8]) -> Vec<u8> {
        frame_with_class(id, 0x00, payload)
    }

    pub fn frame_with_class(id: u8, class: u8, payload: &[u8]) -> Vec<u8> {
        let mut dat = vec![0xff, 0x5a, id, class];
        dat.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        dat.extend_from_slice(payload);
        let crc = Crc16Kermit.compute(&dat[2..]);
        dat.extend_from_slice(&crc.to_be_bytes());
        dat.push(0x33);
        dat
    }

    /// 2021-06-03 14:05:`second`
    pub fn fields(second: u8) -> UtcFields {
        UtcFields {
            year: 2021,
            month: 6,
            day: 3,
            hour: 14,
            minute: 5,
            second,
            nanos: 0,
        }
    }

    pub fn utc(ts: u32, valid: bool, fields: UtcFields) -> Vec<u8> {
        let mut dat = ts.to_le_bytes().to_vec();
        let status: u16 = if valid { 2 << 6 } else { 0 };
        dat.extend_from_slice(&status.to_le_bytes());
        dat.extend_from_slice(&fields.year.to_le_bytes());
        dat.extend_from_slice(&[
            fields.month,
            fields.day,
            fields.hour,
            fields.minute,
            fields.second,
        ]);
        dat.extend_from_slice(&fields.nanos.to_le_bytes());
        dat.extend_from_slice(&0u32.to_le_bytes());
        frame(UTC_TIME, &dat)
    }

    pub fn nav(ts: u32, valid: bool) -> Vec<u8> {
        let mut dat = ts.to_le_bytes().to_vec();
        for v in [1.0f32, 2.0, 3.0, 0.1, 0.1, 0.1] {
            dat.extend_from_slice(&v.to_le_bytes());
        }
        for v in [43.6f64, 1.44, 150.0] {
            dat.extend_from_slice(&v.to_le_bytes());
        }
        for v in [49.0f32, 0.5, 0.5, 1.0] {
            dat.extend_from_slice(&v.to_le_bytes());
        }
        let status: u32 = if valid { 4 } else { 1 };
        dat.extend_from_slice(&status.to_le_bytes());
        frame(EKF_NAV, &dat)
    }

    pub fn imu_short(ts: u32, delta_velocity: [i32; 3], delta_angle: [i32; 3]) -> Vec<u8> {
        let mut dat = ts.to_le_bytes().to_vec();
        dat.extend_from_slice(&0u16.to_le_bytes());
        for v in delta_velocity.into_iter().chain(delta_angle) {
            dat.extend_from_slice(&v.to_le_bytes());
        }
        dat.extend_from_slice(&2_500i16.to_le_bytes());
        frame(IMU_SHORT, &dat)
    }

    pub fn euler(ts: u32, rad: [f32; 3]) -> Vec<u8> {
        let mut dat = ts.to_le_bytes().to_vec();
        for v in rad.into_iter().chain([0.01f32; 3]) {
            dat.extend_from_slice(&v.to_le_bytes());
        }
        dat.extend_from_slice(&0u32.to_le_bytes());
        frame(EKF_EULER, &dat)
    }

    pub fn gps_pos(ts: u32, lat: f64, lon: f64, alt: f64) -> Vec<u8> {
        let mut dat = ts.to_le_bytes().to_vec();
        dat.extend_from_slice(&0u32.to_le_bytes());
        dat.extend_from_slice(&0u32.to_le_bytes());
        for v in [lat, lon, alt] {
            dat.extend_from_slice(&v.to_le_bytes());
        }
        for v in [49.0f32, 1.0, 1.0, 2.0] {
            dat.extend_from_slice(&v.to_le_bytes());
        }
        frame(GPS1_POS, &dat)
    }

    pub fn air_data(ts: u32, altitude: f32) -> Vec<u8> {
        let mut dat = ts.to_le_bytes().to_vec();
        dat.extend_from_slice(&0u16.to_le_bytes());
        for v in [101_325.0f32, altitude, 0.0, 0.0, 15.0] {
            dat.extend_from_slice(&v.to_le_bytes());
        }
        frame(AIR_DATA, &dat)
    }
}
