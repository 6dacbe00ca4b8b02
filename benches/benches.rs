use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use navlog::integrity::{Checksum, Crc16Arc, Crc16Kermit};
use navlog::rangefinder::ZrFormat;
use navlog::synchronizer::FrameScanner;
use navlog::{decode, DecodeConfig, Family};
use rand::Rng;

fn usd1_record(ts: u32) -> Vec<u8> {
    let mut dat = vec![0x5a, 0xa5, 0x0c, 0x00];
    dat.extend_from_slice(&ts.to_le_bytes());
    dat.extend_from_slice(&[0xa1, 0x01, 0x01, 0x2c, 0x20, 0x00]);
    let crc = Crc16Arc.compute(&dat);
    dat.extend_from_slice(&crc.to_le_bytes());
    dat
}

fn imu_short(ts: u32) -> Vec<u8> {
    let mut payload = ts.to_le_bytes().to_vec();
    payload.resize(32, 0);
    let mut dat = vec![0xff, 0x5a, 44, 0x00];
    dat.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    dat.extend_from_slice(&payload);
    let crc = Crc16Kermit.compute(&dat[2..]);
    dat.extend_from_slice(&crc.to_be_bytes());
    dat.push(0x33);
    dat
}

// 10k records with a little garbage between some of them.
fn usd1_stream() -> Vec<u8> {
    let mut rng = rand::thread_rng();
    let mut dat = Vec::new();
    for i in 0..10_000u32 {
        if rng.gen_ratio(1, 10) {
            dat.extend([0x00, 0xff, 0x13]);
        }
        dat.extend(usd1_record(i * 100_000));
    }
    dat
}

fn bench_scan_usd1(c: &mut Criterion) {
    let dat = usd1_stream();

    let mut group = c.benchmark_group("scan");
    group.throughput(Throughput::Bytes(dat.len() as u64));
    group.bench_function("zr_records", |b| {
        b.iter(|| {
            let scanner = FrameScanner::new(&dat[..], ZrFormat, 4096);
            scanner.filter_map(Result::ok).count()
        });
    });
    group.finish();
}

fn bench_decode_sbg(c: &mut Criterion) {
    let dat: Vec<u8> = (0..10_000u32).flat_map(|i| imu_short(i * 5_000)).collect();
    let config = DecodeConfig::default();

    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(dat.len() as u64));
    group.bench_function("sbg_imu_short", |b| {
        b.iter(|| decode(&dat[..], Family::Sbg, &config).unwrap());
    });
    group.finish();
}

criterion_group!(benches, bench_scan_usd1, bench_decode_sbg);
criterion_main!(benches);
