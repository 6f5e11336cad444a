//! XOR-delta run-length compression for Quetzal `CMem` chunks.
//!
//! Grounded in `gruesome::quetzal::compressed_memory::{compress_memory,
//! decompress_memory}`, reworked to return `CoreResult` instead of
//! panicking on a size mismatch and to be strict about truncated input
//! (the teacher silently pads from the original on premature EOF; this
//! spec treats that as corruption rather than tolerance — see DESIGN.md).

use crate::error::{CoreError, CoreResult};

/// XOR `current` against `baseline` and run-length encode the zero bytes.
/// A non-zero delta byte is emitted as itself; a run of `k` zero deltas
/// (1..=256) is emitted as `0x00, k-1`, with runs longer than 256 split.
pub fn compress_memory(baseline: &[u8], current: &[u8]) -> CoreResult<Vec<u8>> {
    if baseline.len() != current.len() {
        return Err(CoreError::QuetzalCorrupted(format!(
            "baseline/current memory size mismatch: {} vs {}",
            baseline.len(),
            current.len()
        )));
    }

    let mut compressed = Vec::new();
    let mut i = 0usize;
    while i < current.len() {
        let delta = baseline[i] ^ current[i];
        if delta == 0 {
            let start = i;
            while i < current.len() && (baseline[i] ^ current[i]) == 0 {
                i += 1;
            }
            let mut remaining = i - start;
            while remaining > 256 {
                compressed.push(0x00);
                compressed.push(255);
                remaining -= 256;
            }
            compressed.push(0x00);
            compressed.push((remaining - 1) as u8);
        } else {
            compressed.push(delta);
            i += 1;
        }
    }

    log::debug!(
        "compressed {} bytes of dynamic memory to {} bytes",
        current.len(),
        compressed.len()
    );
    Ok(compressed)
}

/// Invert `compress_memory`: walk the compressed stream, XORing non-zero
/// bytes into the corresponding `baseline` byte and copying `baseline`
/// verbatim across zero-runs, until `baseline.len()` bytes are produced.
pub fn decompress_memory(compressed: &[u8], baseline: &[u8]) -> CoreResult<Vec<u8>> {
    let mut restored = Vec::with_capacity(baseline.len());
    let mut ci = 0usize;

    while restored.len() < baseline.len() {
        let byte = *compressed.get(ci).ok_or_else(|| {
            CoreError::QuetzalCorrupted(
                "compressed memory ended before original size was reached".into(),
            )
        })?;
        ci += 1;

        if byte == 0 {
            let run_len = *compressed.get(ci).ok_or_else(|| {
                CoreError::QuetzalCorrupted("truncated zero-run in compressed memory".into())
            })? as usize
                + 1;
            ci += 1;
            for _ in 0..run_len {
                let j = restored.len();
                if j >= baseline.len() {
                    return Err(CoreError::QuetzalCorrupted(
                        "zero-run overruns dynamic memory".into(),
                    ));
                }
                restored.push(baseline[j]);
            }
        } else {
            let j = restored.len();
            if j >= baseline.len() {
                return Err(CoreError::QuetzalCorrupted(
                    "delta byte overruns dynamic memory".into(),
                ));
            }
            restored.push(baseline[j] ^ byte);
        }
    }

    log::debug!(
        "decompressed {} bytes of compressed memory to {} bytes",
        compressed.len(),
        restored.len()
    );
    Ok(restored)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// S5: orig = [0,0,0,0,0], cur = [0,0,5,0,0].
    #[test]
    fn s5_xor_delta_matches_spec_example() {
        let orig = vec![0u8, 0, 0, 0, 0];
        let cur = vec![0u8, 0, 5, 0, 0];
        let compressed = compress_memory(&orig, &cur).unwrap();
        assert_eq!(compressed, vec![0x00, 0x01, 0x05, 0x00, 0x01]);

        let restored = decompress_memory(&compressed, &orig).unwrap();
        assert_eq!(restored, cur);
    }

    #[test]
    fn identical_buffers_compress_to_one_run() {
        let buf = vec![0x42u8; 10];
        let compressed = compress_memory(&buf, &buf).unwrap();
        assert_eq!(compressed, vec![0x00, 9]);
    }

    #[test]
    fn runs_longer_than_256_are_split() {
        let orig = vec![0u8; 600];
        let cur = orig.clone();
        let compressed = compress_memory(&orig, &cur).unwrap();
        // 600 = 256 + 256 + 88 -> three run records.
        assert_eq!(
            compressed,
            vec![0x00, 255, 0x00, 255, 0x00, 87]
        );
        let restored = decompress_memory(&compressed, &orig).unwrap();
        assert_eq!(restored, cur);
    }

    #[test]
    fn mismatched_sizes_is_quetzal_corrupted() {
        let orig = vec![0u8; 4];
        let cur = vec![0u8; 5];
        assert!(matches!(
            compress_memory(&orig, &cur),
            Err(CoreError::QuetzalCorrupted(_))
        ));
    }

    #[test]
    fn truncated_compressed_stream_is_quetzal_corrupted() {
        let orig = vec![0xAAu8; 10];
        let compressed = vec![0x00]; // claims a zero-run but has no count byte
        assert!(matches!(
            decompress_memory(&compressed, &orig),
            Err(CoreError::QuetzalCorrupted(_))
        ));
    }

    #[test]
    fn delta_inverse_property_on_random_like_pattern() {
        let orig: Vec<u8> = (0..64).map(|i| (i * 7) as u8).collect();
        let cur: Vec<u8> = orig
            .iter()
            .enumerate()
            .map(|(i, &b)| if i % 5 == 0 { b.wrapping_add(1) } else { b })
            .collect();
        let compressed = compress_memory(&orig, &cur).unwrap();
        let restored = decompress_memory(&compressed, &orig).unwrap();
        assert_eq!(restored, cur);
    }
}
