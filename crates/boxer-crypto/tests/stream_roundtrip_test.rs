//! End-to-end encrypt → decrypt tests over in-memory and file transports.

use std::io::{Read, Seek, SeekFrom, Write};

use boxer_crypto::{BaseNonce, Decryptor, Encryptor, StreamKey, DEFAULT_CHUNK_SIZE};
use proptest::prelude::*;
use rand::RngCore;
use sha2::{Digest, Sha256};

fn key() -> StreamKey {
    StreamKey::from_bytes([0u8; 32])
}

fn nonce() -> BaseNonce {
    BaseNonce::from_bytes([4u8; 16])
}

fn encrypt(data: &[u8], chunk_size: usize) -> Vec<u8> {
    let mut enc = Encryptor::with_chunk_size(Vec::new(), &nonce(), &key(), chunk_size)
        .expect("valid chunk size");
    enc.write_all(data).expect("encrypt");
    enc.finish().expect("close")
}

fn decrypt(wire: &[u8]) -> Vec<u8> {
    let mut dec = Decryptor::new(wire, &nonce(), &key());
    let mut out = Vec::new();
    dec.read_to_end(&mut out).expect("decrypt");
    out
}

/// The system word list when present, 64 KiB of random bytes otherwise.
fn word_list() -> Vec<u8> {
    std::fs::read("/usr/share/dict/words").unwrap_or_else(|_| {
        let mut data = vec![0u8; 1 << 16];
        rand::thread_rng().fill_bytes(&mut data);
        data
    })
}

#[test]
fn word_list_roundtrip_default_chunk() {
    let data = word_list();
    let mut buf = Vec::new();
    let mut enc = Encryptor::new(&mut buf, &nonce(), &key());
    enc.write_all(&data).unwrap();
    enc.close().unwrap();
    drop(enc);

    assert_eq!(decrypt(&buf), data);
}

#[test]
fn word_list_roundtrip_32k_chunk() {
    let data = word_list();
    let wire = encrypt(&data, 2 << 14);
    let out = decrypt(&wire);
    assert_eq!(out.len(), data.len(), "data len == {}, got len == {}", data.len(), out.len());
    assert_eq!(out, data);
}

#[test]
fn file_backed_roundtrip() {
    let mut file = tempfile::tempfile().unwrap();
    let mut data = vec![0u8; 3 * DEFAULT_CHUNK_SIZE + 123];
    rand::thread_rng().fill_bytes(&mut data);

    let mut enc = Encryptor::new(&mut file, &nonce(), &key());
    enc.write_all(&data).unwrap();
    enc.close().unwrap();
    drop(enc);

    file.seek(SeekFrom::Start(0)).unwrap();
    let mut dec = Decryptor::new(&mut file, &nonce(), &key());
    let mut out = Vec::new();
    dec.read_to_end(&mut out).unwrap();
    dec.close().unwrap();

    assert_eq!(out, data);
}

#[test]
fn chunk_size_is_not_transmitted() {
    let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
    let reference = decrypt(&encrypt(&data, DEFAULT_CHUNK_SIZE));
    for chunk_size in [1, 2, 15, 16, 17, 1000, 9_999, 10_000, 10_001] {
        assert_eq!(decrypt(&encrypt(&data, chunk_size)), reference, "chunk size {chunk_size}");
    }
}

/// Encrypt and decrypt 1 GiB of random data through a temp file and compare
/// SHA-256 digests. Slow; run with `cargo test -- --ignored`.
#[test]
#[ignore]
fn large_stream_checksum() {
    const TOTAL: u64 = 1 << 30;

    let mut file = tempfile::tempfile().unwrap();
    let mut h1 = Sha256::new();
    let mut rng = rand::thread_rng();
    let mut block = vec![0u8; 1 << 20];

    let mut enc = Encryptor::new(&mut file, &nonce(), &key());
    let mut written = 0u64;
    while written < TOTAL {
        rng.fill_bytes(&mut block);
        h1.update(&block);
        enc.write_all(&block).unwrap();
        written += block.len() as u64;
    }
    enc.close().unwrap();
    drop(enc);

    file.seek(SeekFrom::Start(0)).unwrap();
    let mut h2 = Sha256::new();
    let mut dec = Decryptor::new(&mut file, &nonce(), &key());
    let copied = std::io::copy(&mut dec, &mut h2).unwrap();
    dec.close().unwrap();

    assert_eq!(copied, TOTAL);
    assert_eq!(h1.finalize(), h2.finalize());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Any input survives encryption and decryption for any chunk size.
    #[test]
    fn roundtrip_any_chunk_size(
        data in proptest::collection::vec(any::<u8>(), 0..=8192),
        chunk_size in 1usize..=2048,
    ) {
        prop_assert_eq!(decrypt(&encrypt(&data, chunk_size)), data);
    }

    /// Two encoders with different chunk sizes decode to the same bytes.
    #[test]
    fn chunk_size_independence(
        data in proptest::collection::vec(any::<u8>(), 0..=8192),
        a in 1usize..=4096,
        b in 1usize..=4096,
    ) {
        prop_assert_eq!(decrypt(&encrypt(&data, a)), decrypt(&encrypt(&data, b)));
    }

    /// `write` emits one frame per full chunk; `close` adds exactly one more.
    #[test]
    fn frame_count_matches_chunking(
        len in 0usize..=4096,
        chunk_size in 1usize..=512,
    ) {
        let mut enc = Encryptor::with_chunk_size(Vec::new(), &nonce(), &key(), chunk_size).unwrap();
        enc.write_all(&vec![0u8; len]).unwrap();
        prop_assert_eq!(enc.frames_written(), (len / chunk_size) as u64);
        enc.close().unwrap();
        prop_assert_eq!(enc.frames_written(), (len / chunk_size) as u64 + 1);
    }
}
