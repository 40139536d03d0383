use super::segment::{BitBuffer, Segment, make_segments, total_bits};
use crate::common::reed_solomon::ReedSolomonEncoder;
use crate::common::tables::{data_capacity_bits, ec_block_info};
use crate::error::EncodeError;
use crate::models::{ECLevel, EcPolicy, EncodingRequest, Version, VersionChoice};
use tracing::debug;

/// Outcome of version and level resolution
#[derive(Debug, Clone)]
pub struct Resolved {
    /// Chosen version
    pub version: Version,
    /// Chosen level (possibly boosted)
    pub ec_level: ECLevel,
    /// Segments laid out for the chosen version
    pub segments: Vec<Segment>,
    /// Payload bits including headers
    pub data_bits: usize,
}

// Segmentation only changes between the three count-field size classes
fn class_representative(version: Version) -> Version {
    let n = match version.number() {
        1..=9 => 9,
        10..=26 => 26,
        _ => 40,
    };
    Version::new(n).unwrap_or(version)
}

/// Pick version and level for a request
pub fn resolve(request: &EncodingRequest) -> Result<Resolved, EncodeError> {
    let mut by_class: Vec<(Version, Vec<Segment>)> = Vec::with_capacity(3);
    let mut segments_for = |version: Version| -> Vec<Segment> {
        let rep = class_representative(version);
        if let Some((_, segs)) = by_class.iter().find(|(v, _)| *v == rep) {
            return segs.clone();
        }
        let segs = make_segments(&request.payload, rep, request.allow_kanji);
        by_class.push((rep, segs.clone()));
        segs
    };

    let (version, segments, data_bits) = match request.version {
        VersionChoice::Fixed(n) => {
            let version = Version::new(n).ok_or_else(|| {
                EncodeError::InvalidRequest(format!("version {} outside 1..=40", n))
            })?;
            let segments = segments_for(version);
            let capacity = data_capacity_bits(version, request.ec_level);
            match total_bits(&segments, version) {
                Some(bits) if bits <= capacity => (version, segments, bits),
                needed => {
                    return Err(EncodeError::InvalidRequest(format!(
                        "payload needs {} bits but version {} at level {} holds {}",
                        needed.map_or_else(|| "too many".to_string(), |b| b.to_string()),
                        version,
                        request.ec_level,
                        capacity
                    )));
                }
            }
        }
        VersionChoice::Auto => {
            let mut found = None;
            let mut smallest_need = usize::MAX;
            for version in Version::all() {
                let segments = segments_for(version);
                if let Some(bits) = total_bits(&segments, version) {
                    smallest_need = smallest_need.min(bits);
                    if bits <= data_capacity_bits(version, request.ec_level) {
                        found = Some((version, segments, bits));
                        break;
                    }
                }
            }
            found.ok_or(EncodeError::PayloadTooLarge {
                needed_bits: smallest_need,
                ec_level: request.ec_level,
            })?
        }
    };

    let mut ec_level = request.ec_level;
    if request.ec_policy == EcPolicy::BoostWhenFree {
        while let Some(next) = ec_level.boosted() {
            if data_bits > data_capacity_bits(version, next) {
                break;
            }
            ec_level = next;
        }
    }

    debug!(
        version = version.number(),
        ?ec_level,
        data_bits,
        segments = segments.len(),
        "resolved symbol parameters"
    );

    Ok(Resolved {
        version,
        ec_level,
        segments,
        data_bits,
    })
}

/// Header, data, terminator and pad bytes filling the data capacity exactly
pub fn data_codewords(resolved: &Resolved) -> Vec<u8> {
    let version = resolved.version;
    let capacity = data_capacity_bits(version, resolved.ec_level);
    let mut bits = BitBuffer::new();
    for seg in &resolved.segments {
        bits.append_bits(seg.mode.indicator(), 4);
        bits.append_bits(seg.num_chars as u32, seg.mode.char_count_bits(version));
        bits.extend(&seg.data);
    }

    let terminator = (capacity - bits.len()).min(4);
    bits.append_bits(0, terminator);
    let pad = (8 - bits.len() % 8) % 8;
    bits.append_bits(0, pad);

    let mut bytes = bits.to_bytes();
    for pad_byte in [0xECu8, 0x11].into_iter().cycle() {
        if bytes.len() * 8 >= capacity {
            break;
        }
        bytes.push(pad_byte);
    }
    bytes
}

/// Split into blocks, append EC codewords and interleave
pub fn add_ecc_and_interleave(data: &[u8], version: Version, ec_level: ECLevel) -> Vec<u8> {
    let info = ec_block_info(version, ec_level);
    let rs = ReedSolomonEncoder::new(info.ecc_per_block);

    let mut blocks: Vec<(Vec<u8>, Vec<u8>)> = Vec::with_capacity(info.num_blocks);
    let mut offset = 0;
    for i in 0..info.num_blocks {
        let len = info.data_len(i);
        let block = data[offset..offset + len].to_vec();
        offset += len;
        let ecc = rs.ecc(&block);
        blocks.push((block, ecc));
    }

    let longest = info.short_block_data + 1;
    let mut result = Vec::with_capacity(data.len() + info.num_blocks * info.ecc_per_block);
    for i in 0..longest {
        for (block, _) in &blocks {
            if let Some(&b) = block.get(i) {
                result.push(b);
            }
        }
    }
    for i in 0..info.ecc_per_block {
        for (_, ecc) in &blocks {
            result.push(ecc[i]);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::tables::{data_codewords as table_data_codewords, total_codewords};

    #[test]
    fn test_hello_world_resolves_to_version_1() {
        let req = EncodingRequest::new("HELLO WORLD").with_ec_level(ECLevel::M);
        let resolved = resolve(&req).unwrap();
        assert_eq!(resolved.version.number(), 1);
        assert_eq!(resolved.ec_level, ECLevel::M);
    }

    #[test]
    fn test_hello_world_codewords() {
        // Well-known 1-M layout for "HELLO WORLD"
        let req = EncodingRequest::new("HELLO WORLD").with_ec_level(ECLevel::M);
        let resolved = resolve(&req).unwrap();
        let data = data_codewords(&resolved);
        assert_eq!(
            data,
            vec![
                0x20, 0x5B, 0x0B, 0x78, 0xD1, 0x72, 0xDC, 0x4D, 0x43, 0x40, 0xEC, 0x11, 0xEC,
                0x11, 0xEC, 0x11
            ]
        );
        let all = add_ecc_and_interleave(&data, resolved.version, resolved.ec_level);
        assert_eq!(all.len(), 26);
        assert_eq!(
            &all[16..],
            &[0xC4, 0x23, 0x27, 0x77, 0xEB, 0xD7, 0xE7, 0xE2, 0x5D, 0x17]
        );
    }

    #[test]
    fn test_fixed_version_too_small_is_invalid_request() {
        let req = EncodingRequest::new(vec![b'x'; 100])
            .with_version(VersionChoice::Fixed(1))
            .with_ec_level(ECLevel::L);
        assert!(matches!(resolve(&req), Err(EncodeError::InvalidRequest(_))));
        let bad = EncodingRequest::new("x").with_version(VersionChoice::Fixed(41));
        assert!(matches!(resolve(&bad), Err(EncodeError::InvalidRequest(_))));
    }

    #[test]
    fn test_payload_too_large() {
        let req = EncodingRequest::new(vec![b'x'; 2954]).with_ec_level(ECLevel::L);
        assert!(matches!(
            resolve(&req),
            Err(EncodeError::PayloadTooLarge {
                ec_level: ECLevel::L,
                ..
            })
        ));
        let max = EncodingRequest::new(vec![b'x'; 2953]).with_ec_level(ECLevel::L);
        assert_eq!(resolve(&max).map(|r| r.version.number()), Ok(40));
    }

    #[test]
    fn test_boost_when_free() {
        let req = EncodingRequest::new("HELLO WORLD")
            .with_ec_level(ECLevel::L)
            .with_ec_policy(EcPolicy::BoostWhenFree);
        let resolved = resolve(&req).unwrap();
        assert_eq!(resolved.version.number(), 1);
        // 74 bits fit 1-Q (104 bits) but not 1-H (72 bits)
        assert_eq!(resolved.ec_level, ECLevel::Q);

        let exact = EncodingRequest::new("HELLO WORLD").with_ec_level(ECLevel::L);
        assert_eq!(resolve(&exact).unwrap().ec_level, ECLevel::L);
    }

    #[test]
    fn test_codeword_lengths_match_tables() {
        for n in [1u8, 5, 10, 27, 40] {
            let version = Version::new(n).unwrap();
            for level in ECLevel::ALL {
                let req = EncodingRequest::new("123")
                    .with_version(VersionChoice::Fixed(n))
                    .with_ec_level(level);
                let resolved = resolve(&req).unwrap();
                let data = data_codewords(&resolved);
                assert_eq!(data.len(), table_data_codewords(version, level));
                let all = add_ecc_and_interleave(&data, version, level);
                assert_eq!(all.len(), total_codewords(version));
            }
        }
    }
}
