#![allow(dead_code)]

use std::path::PathBuf;

use marine::pd0::leader::{FIXED_LEADER, NAVIGATION, VARIABLE_LEADER};
use marine::pd0::HEADER_ID;
use marine::schema::Schema;

/// Write `dat` to `name` in a fresh temp dir. The dir must outlive the path.
pub fn write_temp(name: &str, dat: &[u8]) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, dat).unwrap();
    (dir, path)
}

/// Multibeam datagram: the 16 byte common header followed by `body`, which
/// must include the trailer. The length field does not count itself.
pub fn em_datagram(kind: u8, date: u32, time: u32, body: &[u8]) -> Vec<u8> {
    let mut dat = Vec::with_capacity(16 + body.len());
    dat.extend_from_slice(&((12 + body.len()) as u32).to_le_bytes());
    dat.push(0x02);
    dat.push(kind);
    dat.extend_from_slice(&2040u16.to_le_bytes());
    dat.extend_from_slice(&date.to_le_bytes());
    dat.extend_from_slice(&time.to_le_bytes());
    dat.extend_from_slice(body);
    dat
}

pub fn em_position(date: u32, time: u32, lat: f64, lng: f64) -> Vec<u8> {
    let input = b"$GPGGA";
    let mut body = Vec::new();
    body.extend_from_slice(&1u16.to_le_bytes());
    body.extend_from_slice(&100u16.to_le_bytes());
    body.extend_from_slice(&((lat * 20_000_000.0) as i32).to_le_bytes());
    body.extend_from_slice(&((lng * 10_000_000.0) as i32).to_le_bytes());
    body.extend_from_slice(&0u16.to_le_bytes());
    body.extend_from_slice(&250u16.to_le_bytes()); // 2.5 m/s
    body.extend_from_slice(&9000u16.to_le_bytes());
    body.extend_from_slice(&9050u16.to_le_bytes());
    body.push(0x81);
    body.push(input.len() as u8);
    body.extend_from_slice(input);
    body.extend_from_slice(&[0x03, 0x00, 0x00]);
    em_datagram(0x50, date, time, &body)
}

/// XYZ88 ping with one beam per `[x, y, z]`.
pub fn em_xyz88(date: u32, time: u32, beams: &[[f32; 3]]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&7u16.to_le_bytes());
    body.extend_from_slice(&100u16.to_le_bytes());
    body.extend_from_slice(&18000u16.to_le_bytes());
    body.extend_from_slice(&15000u16.to_le_bytes());
    body.extend_from_slice(&4.5f32.to_le_bytes());
    body.extend_from_slice(&(beams.len() as u16).to_le_bytes());
    body.extend_from_slice(&(beams.len() as u16).to_le_bytes());
    body.extend_from_slice(&12000.0f32.to_le_bytes());
    body.extend_from_slice(&[0, 0, 0, 0]);
    for [x, y, z] in beams {
        body.extend_from_slice(&z.to_le_bytes());
        body.extend_from_slice(&y.to_le_bytes());
        body.extend_from_slice(&x.to_le_bytes());
        body.extend_from_slice(&[0x10, 0x00, 0x05, 0x00, 0x01, 0x00, 0xf6, 0xff]);
    }
    body.extend_from_slice(&[0x00, 0x03, 0x00, 0x00]);
    em_datagram(0x58, date, time, &body)
}

fn put(dat: &mut [u8], schema: &Schema, name: &str, value: &[u8]) {
    let at = schema.offset_of(name).unwrap();
    dat[at..at + value.len()].copy_from_slice(value);
}

/// PD0 ensemble with a fixed leader in earth coordinates, a variable leader
/// stamped `time`, a velocity section of `cells` and a navigation section.
pub fn pd0_ensemble(
    sys_cfg: u16,
    time: [u8; 7],
    cells: &[[i16; 4]],
    fixes: [(i32, i32); 2],
) -> Vec<u8> {
    let mut fixed = vec![0u8; FIXED_LEADER.size()];
    put(&mut fixed, &FIXED_LEADER, "hID", &0x0000u16.to_le_bytes());
    put(&mut fixed, &FIXED_LEADER, "sysCfg", &sys_cfg.to_le_bytes());
    put(&mut fixed, &FIXED_LEADER, "noCells", &[cells.len() as u8]);
    put(&mut fixed, &FIXED_LEADER, "coordTransf", &[0b1_1111]);

    let mut variable = vec![0u8; VARIABLE_LEADER.size()];
    put(&mut variable, &VARIABLE_LEADER, "hID", &0x0080u16.to_le_bytes());
    put(&mut variable, &VARIABLE_LEADER, "tsYear", &time);

    let mut velocity = Vec::with_capacity(2 + 8 * cells.len());
    velocity.extend_from_slice(&0x0100u16.to_le_bytes());
    for cell in cells {
        for v in cell {
            velocity.extend_from_slice(&v.to_le_bytes());
        }
    }

    let mut nav = vec![0u8; NAVIGATION.size()];
    put(&mut nav, &NAVIGATION, "hID", &0x2000u16.to_le_bytes());
    put(&mut nav, &NAVIGATION, "firstLat", &fixes[0].0.to_le_bytes());
    put(&mut nav, &NAVIGATION, "firstLng", &fixes[0].1.to_le_bytes());
    put(&mut nav, &NAVIGATION, "lastLat", &fixes[1].0.to_le_bytes());
    put(&mut nav, &NAVIGATION, "lastLng", &fixes[1].1.to_le_bytes());

    let parts = [fixed, variable, velocity, nav];
    let head_len = 6 + 2 * parts.len();
    let mut dat = Vec::new();
    dat.extend_from_slice(&HEADER_ID.to_le_bytes());
    dat.extend_from_slice(&[0, 0, 0, parts.len() as u8]);
    let mut at = head_len;
    for part in &parts {
        dat.extend_from_slice(&(at as u16).to_le_bytes());
        at += part.len();
    }
    for part in &parts {
        dat.extend_from_slice(part);
    }
    let num_bytes = dat.len() as u16;
    dat[2..4].copy_from_slice(&num_bytes.to_le_bytes());
    let sum = dat.iter().fold(0u16, |acc, b| acc.wrapping_add(u16::from(*b)));
    dat.extend_from_slice(&sum.to_le_bytes());
    dat
}

/// Little-endian SEG-Y file with one trace per entry of `traces`, each
/// sample a raw 4 byte word.
pub fn segy_file(code: u16, traces: &[&[u32]]) -> Vec<u8> {
    let mut buf = Vec::new();
    for i in 0..40 {
        let card = format!("C{:<2} SURVEY LINE 42", i + 1);
        buf.extend_from_slice(format!("{card:<80}").as_bytes());
    }
    buf.resize(3600, 0);
    buf[3212..3214].copy_from_slice(&1u16.to_le_bytes());
    buf[3216..3218].copy_from_slice(&500u16.to_le_bytes());
    buf[3224..3226].copy_from_slice(&code.to_le_bytes());
    buf[3500] = 1;
    for (i, samples) in traces.iter().enumerate() {
        let mut h = vec![0u8; 240];
        h[0..4].copy_from_slice(&(i as u32 + 1).to_le_bytes());
        h[72..76].copy_from_slice(&(10_800_000i32 + i as i32 * 3600).to_le_bytes());
        h[76..80].copy_from_slice(&(-7_200_000i32).to_le_bytes());
        h[88..90].copy_from_slice(&2u16.to_le_bytes());
        h[114..116].copy_from_slice(&(samples.len() as u16).to_le_bytes());
        h[116..118].copy_from_slice(&500u16.to_le_bytes());
        h[156..158].copy_from_slice(&2021u16.to_le_bytes());
        h[158..160].copy_from_slice(&100u16.to_le_bytes());
        h[160..162].copy_from_slice(&6u16.to_le_bytes());
        h[162..164].copy_from_slice(&(i as u16).to_le_bytes());
        buf.extend(h);
        for s in *samples {
            buf.extend(s.to_le_bytes());
        }
    }
    buf
}

/// CTD `.hex` file with CRLF line ends.
pub fn ctd_hex(header: &[&str], lines: &[&str]) -> Vec<u8> {
    let mut text = String::new();
    for h in header {
        text.push_str(h);
        text.push_str("\r\n");
    }
    text.push_str("*END*\r\n");
    for line in lines {
        text.push_str(line);
        text.push_str("\r\n");
    }
    text.into_bytes()
}

/// Argo SBD packet of `kind` with `fill` as its payload prefix.
pub fn sbd_packet(kind: u8, fill: &[u8]) -> Vec<u8> {
    let mut packet = vec![0u8; 100];
    packet[0] = kind;
    packet[1..1 + fill.len()].copy_from_slice(fill);
    packet
}
