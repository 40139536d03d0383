/// Codeword extraction, de-interleaving and block correction
use crate::common::reed_solomon::ReedSolomonDecoder;
use crate::common::tables::{ec_block_info, total_codewords};
use crate::common::FunctionMask;
use crate::models::{BitMatrix, ECLevel, MaskPattern, Version};

/// Unmask the grid and read every codeword along the zig-zag path (MSB first)
pub fn read_codewords(grid: &BitMatrix, version: Version, mask: MaskPattern) -> Vec<u8> {
    let func = FunctionMask::new(version);
    let total = total_codewords(version);
    let mut codewords = vec![0u8; total];
    for (i, (x, y)) in func.zigzag().into_iter().enumerate().take(total * 8) {
        let bit = grid.get(x, y) ^ mask.is_masked(y, x);
        if bit {
            codewords[i >> 3] |= 1 << (7 - (i & 7));
        }
    }
    codewords
}

/// Data codewords after correction, with repair statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectedData {
    /// Data codewords in block order
    pub data: Vec<u8>,
    /// Codewords repaired across all blocks
    pub corrected: usize,
    /// Codewords the blocks could repair in total
    pub capacity: usize,
}

/// Split interleaved codewords into blocks (short blocks first), correct each one and
/// concatenate the data portions. `Err(block)` names the first uncorrectable block.
pub fn deinterleave_and_correct(
    codewords: &[u8],
    version: Version,
    ec_level: ECLevel,
) -> Result<CorrectedData, usize> {
    let info = ec_block_info(version, ec_level);
    let long_len = info.short_block_data + 1;

    let mut blocks: Vec<Vec<u8>> = (0..info.num_blocks)
        .map(|b| Vec::with_capacity(info.data_len(b) + info.ecc_per_block))
        .collect();

    let mut stream = codewords.iter().copied();
    for i in 0..long_len {
        for (b, block) in blocks.iter_mut().enumerate() {
            if i < info.data_len(b) {
                block.push(stream.next().ok_or(0usize)?);
            }
        }
    }
    for _ in 0..info.ecc_per_block {
        for block in blocks.iter_mut() {
            block.push(stream.next().ok_or(0usize)?);
        }
    }

    let rs = ReedSolomonDecoder::new(info.ecc_per_block);
    let mut data = Vec::new();
    let mut corrected = 0;
    for (b, block) in blocks.iter_mut().enumerate() {
        corrected += rs.decode(block).map_err(|_| b)?;
        data.extend_from_slice(&block[..info.data_len(b)]);
    }

    Ok(CorrectedData {
        data,
        corrected,
        capacity: info.num_blocks * info.correctable_per_block(),
    })
}
