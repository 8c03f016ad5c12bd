//! End-to-end build / open / query coverage over real files.

use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tempfile::tempdir;

use pwned_gcs::format::{Footer, FOOTER_LEN, INDEX_PAIR_LEN};
use pwned_gcs::{u64_from_hex, Builder, Reader};

/// Builds from explicit values and returns the raw file bytes.
fn build_bytes(values: &[u64], probability: u64, granularity: u64) -> Vec<u8> {
    let mut builder = Builder::new(probability, granularity);
    for &v in values {
        builder.add(v);
    }
    let mut out = Vec::new();
    builder.finalize(&mut out).unwrap();
    out
}

fn write_file(path: &Path, bytes: &[u8]) {
    let mut file = File::create(path).unwrap();
    file.write_all(bytes).unwrap();
}

#[test]
fn test_empty_build() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.gcs");

    let builder = Builder::new(100, 16);
    let mut out = Vec::new();
    let summary = builder.finalize(&mut out).unwrap();

    assert_eq!(summary.entries, 0);
    assert_eq!(summary.index_len, 0);
    // The terminating zero delta is 1 + log2(100) = 8 bits, one byte.
    assert_eq!(summary.end_of_data, 1);
    assert_eq!(out.len(), 1 + FOOTER_LEN);

    write_file(&path, &out);
    let reader = Reader::open(&path).unwrap();
    assert!(!reader.exists(0).unwrap());
    assert!(!reader.exists(0x5BAA61E4C9B93F3F).unwrap());
    assert!(!reader.exists(u64::MAX).unwrap());
}

#[test]
fn test_single_entry_build() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("single.txt");
    let out_path = dir.path().join("single.gcs");

    // SHA-1 of "password".
    write_file(
        &input_path,
        b"5BAA61E4C9B93F3F0682250B6CF8331B7EE68FD8\r\n",
    );

    let mut builder = Builder::new(100, 16);
    builder.ingest(File::open(&input_path).unwrap()).unwrap();
    assert_eq!(builder.len(), 1);

    let mut out = Vec::new();
    let summary = builder.finalize(&mut out).unwrap();
    assert_eq!(summary.entries, 1);
    write_file(&out_path, &out);

    let reader = Reader::open(&out_path).unwrap();
    assert!(reader.exists(u64_from_hex(b"5BAA61E4C9B93F3F")).unwrap());
    assert!(!reader.exists(u64_from_hex(b"0000000000000000")).unwrap());
}

/// 103 entries with known residues: `v mod (103 * 100)` is `1 + 100 * i`,
/// so every delta after the first is exactly 100 and the encoded layout is
/// predictable end to end.
fn sample_values() -> Vec<u64> {
    const NP: u64 = 103 * 100;
    (0..103u64).map(|i| (1 + 100 * i) + NP * (31 * i + 7)).collect()
}

#[test]
fn test_sample_fixture() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("sample.txt");
    let out_path = dir.path().join("sample.gcs");

    let values = sample_values();
    let mut dump = Vec::new();
    for v in &values {
        writeln!(dump, "{:016X}:1", v).unwrap();
    }
    write_file(&input_path, &dump);

    let mut builder = Builder::new(100, 16);
    builder.ingest(File::open(&input_path).unwrap()).unwrap();
    let mut out = Vec::new();
    let summary = builder.finalize(&mut out).unwrap();
    write_file(&out_path, &out);

    assert_eq!(summary.entries, 103);
    assert_eq!(summary.unique, 103);
    assert_eq!(summary.index_len, 7);
    // First delta is 1 (8 bits at P=100), the other 102 are 100 (9 bits),
    // plus an 8-bit terminator: 934 bits padded to 117 bytes.
    assert_eq!(summary.end_of_data, 117);
    assert_eq!(
        out.len(),
        summary.end_of_data as usize + 7 * INDEX_PAIR_LEN + FOOTER_LEN
    );

    // Parse the footer straight off the tail of the file.
    let footer = Footer::parse(&out[out.len() - FOOTER_LEN..]).unwrap();
    assert_eq!(footer.num, 103);
    assert_eq!(footer.probability, 100);
    assert_eq!(footer.end_of_data, 117);
    assert_eq!(footer.index_len, 7);

    // Stored index pairs are strictly increasing in both coordinates.
    let index_bytes = &out[footer.end_of_data as usize..out.len() - FOOTER_LEN];
    let pairs: Vec<(u64, u64)> = index_bytes
        .chunks_exact(INDEX_PAIR_LEN)
        .map(|c| {
            (
                u64::from_be_bytes(c[..8].try_into().unwrap()),
                u64::from_be_bytes(c[8..].try_into().unwrap()),
            )
        })
        .collect();
    assert_eq!(pairs.len(), 7);
    for window in pairs.windows(2) {
        assert!(window[0].0 < window[1].0, "index values must increase");
        assert!(window[0].1 < window[1].1, "index bit positions must increase");
    }

    let reader = Reader::open(&out_path).unwrap();
    assert_eq!(reader.num(), 103);
    assert_eq!(reader.probability(), 100);
    for v in &values {
        assert!(reader.exists(*v).unwrap(), "stored value {:#x} must be found", v);
    }
    // Residues between the stored ones are definitively absent.
    for absent in [2u64, 50, 150, 10250] {
        assert!(!reader.exists(absent).unwrap(), "residue {} must be absent", absent);
    }
}

#[test]
fn test_build_determinism() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut values: Vec<u64> = (0..5000).map(|_| rng.gen()).collect();
    // Duplicates in the input multiset must not affect the output either.
    let dupes = values[..100].to_vec();
    values.extend_from_slice(&dupes);

    let reference = build_bytes(&values, 1000, 64);
    for round in 0..3 {
        let mut shuffled = values.clone();
        shuffled.shuffle(&mut rng);
        assert_eq!(
            build_bytes(&shuffled, 1000, 64),
            reference,
            "permutation {} must produce identical bytes",
            round
        );
    }
}

#[test]
fn test_membership_and_false_positive_rate() {
    const N: u64 = 1000;
    const P: u64 = 100;
    const NP: u64 = N * P;

    let dir = tempdir().unwrap();
    let path = dir.path().join("fp.gcs");

    let mut rng = StdRng::seed_from_u64(4242);
    let mut values = Vec::with_capacity(N as usize);
    while values.len() < N as usize {
        let v: u64 = rng.gen();
        // A residue of zero is unrepresentable by construction; keep the
        // fixture clear of it.
        if v % NP != 0 {
            values.push(v);
        }
    }

    write_file(&path, &build_bytes(&values, P, 64));
    let reader = Reader::open(&path).unwrap();

    for v in &values {
        assert!(reader.exists(*v).unwrap(), "inserted value {:#x} must be found", v);
    }

    let probes = 100_000u32;
    let mut positives = 0u32;
    for _ in 0..probes {
        if reader.exists(rng.gen()).unwrap() {
            positives += 1;
        }
    }

    // Expected ~1-in-100, so ~1000 of 100k; generous statistical slack.
    assert!(positives > 500, "false-positive rate implausibly low: {}", positives);
    assert!(positives < 1500, "false-positive rate too high: {}", positives);
}

#[test]
fn test_zero_granularity_scans_whole_stream() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("noindex.gcs");

    let mut rng = StdRng::seed_from_u64(7);
    let values: Vec<u64> = (0..200).map(|_| rng.gen()).collect();
    let bytes = build_bytes(&values, 100, 0);

    let footer = Footer::parse(&bytes[bytes.len() - FOOTER_LEN..]).unwrap();
    assert_eq!(footer.index_len, 0);

    write_file(&path, &bytes);
    let reader = Reader::open(&path).unwrap();
    for v in &values {
        if v % (200 * 100) == 0 {
            continue;
        }
        assert!(reader.exists(*v).unwrap());
    }
}

#[test]
fn test_ingest_skips_short_lines() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("ragged.txt");

    write_file(
        &input_path,
        b"5BAA61E4C9B93F3F0682250B6CF8331B7EE68FD8:3\n\
          short\n\
          \n\
          CBFDAC6008F9CAB4083784CBD1874F76618D2A97\n",
    );

    let mut builder = Builder::new(100, 16);
    builder.ingest(File::open(&input_path).unwrap()).unwrap();
    assert_eq!(builder.len(), 2);
}

#[test]
fn test_concurrent_lookups_share_one_reader() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shared.gcs");

    let values = sample_values();
    write_file(&path, &build_bytes(&values, 100, 16));
    let reader = Arc::new(Reader::open(&path).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let reader = Arc::clone(&reader);
            let values = values.clone();
            std::thread::spawn(move || {
                for v in &values {
                    assert!(reader.exists(*v).unwrap());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_footer_seek_from_end() {
    // The footer must be parseable by seeking to -40 from the end, the way
    // an external tool would.
    let dir = tempdir().unwrap();
    let path = dir.path().join("seek.gcs");
    write_file(&path, &build_bytes(&sample_values(), 100, 16));

    let mut file = File::open(&path).unwrap();
    file.seek(SeekFrom::End(-(FOOTER_LEN as i64))).unwrap();
    let mut tail = [0u8; FOOTER_LEN];
    std::io::Read::read_exact(&mut file, &mut tail).unwrap();

    let footer = Footer::parse(&tail).unwrap();
    assert_eq!(footer.num, 103);
    assert_eq!(footer.probability, 100);
    assert_eq!(footer.index_len, 7);
}
