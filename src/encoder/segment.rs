use crate::common::Mode;
use crate::models::Version;

/// Characters representable in alphanumeric mode, in value order
pub const ALPHANUMERIC_CHARSET: &[u8; 45] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

/// Append-only bit sequence, most significant bit first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitBuffer(Vec<bool>);

impl BitBuffer {
    /// Empty buffer
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append the low `len` bits of `val`, most significant first
    pub fn append_bits(&mut self, val: u32, len: usize) {
        debug_assert!(len <= 31 && val >> len == 0);
        self.0.extend((0..len).rev().map(|i| (val >> i) & 1 != 0));
    }

    /// Append another buffer
    pub fn extend(&mut self, other: &BitBuffer) {
        self.0.extend_from_slice(&other.0);
    }

    /// Number of bits
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pack into bytes; the final partial byte is zero-padded
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0
            .chunks(8)
            .map(|chunk| {
                chunk
                    .iter()
                    .enumerate()
                    .fold(0u8, |acc, (i, &bit)| acc | ((bit as u8) << (7 - i)))
            })
            .collect()
    }
}

/// A run of payload encoded under one mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Encoding mode
    pub mode: Mode,
    /// Character count written to the count field
    pub num_chars: usize,
    /// Encoded data bits (without header)
    pub data: BitBuffer,
}

impl Segment {
    /// Digits only
    pub fn numeric(digits: &[u8]) -> Self {
        let mut data = BitBuffer::new();
        for chunk in digits.chunks(3) {
            let value = chunk
                .iter()
                .fold(0u32, |acc, &d| acc * 10 + (d - b'0') as u32);
            data.append_bits(value, chunk.len() * 3 + 1);
        }
        Self {
            mode: Mode::Numeric,
            num_chars: digits.len(),
            data,
        }
    }

    /// Characters from [`ALPHANUMERIC_CHARSET`]
    pub fn alphanumeric(text: &[u8]) -> Self {
        let mut data = BitBuffer::new();
        for pair in text.chunks(2) {
            let values: Vec<u32> = pair.iter().map(|&c| alnum_value(c).unwrap_or(0)).collect();
            if values.len() == 2 {
                data.append_bits(values[0] * 45 + values[1], 11);
            } else {
                data.append_bits(values[0], 6);
            }
        }
        Self {
            mode: Mode::Alphanumeric,
            num_chars: text.len(),
            data,
        }
    }

    /// Raw bytes
    pub fn bytes(bytes: &[u8]) -> Self {
        let mut data = BitBuffer::new();
        for &b in bytes {
            data.append_bits(b as u32, 8);
        }
        Self {
            mode: Mode::Byte,
            num_chars: bytes.len(),
            data,
        }
    }

    /// Shift-JIS double-byte pairs; `bytes.len()` must be even
    pub fn kanji(bytes: &[u8]) -> Self {
        let mut data = BitBuffer::new();
        for pair in bytes.chunks_exact(2) {
            data.append_bits(kanji_value(pair[0], pair[1]).unwrap_or(0), 13);
        }
        Self {
            mode: Mode::Kanji,
            num_chars: bytes.len() / 2,
            data,
        }
    }

    /// Header plus data bits at `version`, `None` if the count overflows its field
    pub fn encoded_bits(&self, version: Version) -> Option<usize> {
        let cc_bits = self.mode.char_count_bits(version);
        if self.num_chars >= 1 << cc_bits {
            return None;
        }
        Some(4 + cc_bits + self.data.len())
    }
}

/// Total bits of all segments at `version`
pub fn total_bits(segments: &[Segment], version: Version) -> Option<usize> {
    segments
        .iter()
        .try_fold(0usize, |acc, seg| Some(acc + seg.encoded_bits(version)?))
}

/// Value of an alphanumeric character
pub fn alnum_value(c: u8) -> Option<u32> {
    ALPHANUMERIC_CHARSET
        .iter()
        .position(|&x| x == c)
        .map(|p| p as u32)
}

/// 13-bit Kanji value of a Shift-JIS pair
pub fn kanji_value(hi: u8, lo: u8) -> Option<u32> {
    let code = ((hi as u32) << 8) | lo as u32;
    if lo == 0x7F || !(0x40..=0xFC).contains(&lo) {
        return None;
    }
    let offset = match code {
        0x8140..=0x9FFC => code - 0x8140,
        0xE040..=0xEBBF => code - 0xC140,
        _ => return None,
    };
    Some((offset >> 8) * 0xC0 + (offset & 0xFF))
}

const MODES: [Mode; 4] = [Mode::Numeric, Mode::Alphanumeric, Mode::Byte, Mode::Kanji];

// Per-character cost in sixths of a bit
fn unit_cost(mode: Mode) -> u64 {
    match mode {
        Mode::Numeric => 20,
        Mode::Alphanumeric => 33,
        Mode::Byte => 48,
        Mode::Kanji => 78,
        Mode::Eci => 0,
    }
}

fn unit_len(mode: Mode) -> usize {
    if mode == Mode::Kanji { 2 } else { 1 }
}

fn fits(mode: Mode, bytes: &[u8], pos: usize) -> bool {
    match mode {
        Mode::Numeric => bytes[pos].is_ascii_digit(),
        Mode::Alphanumeric => alnum_value(bytes[pos]).is_some(),
        Mode::Byte => true,
        Mode::Kanji => pos + 1 < bytes.len() && kanji_value(bytes[pos], bytes[pos + 1]).is_some(),
        Mode::Eci => false,
    }
}

/// Split `bytes` into segments with the fewest total bits for the character count
/// widths of `version`'s size class.
///
/// Costs are tracked in sixths of a bit so numeric (10/3 bits per digit) and
/// alphanumeric (11/2 bits per char) runs compare exactly; partial groups are rounded
/// up whenever a segment is closed.
pub fn make_segments(bytes: &[u8], version: Version, allow_kanji: bool) -> Vec<Segment> {
    if bytes.is_empty() {
        return Vec::new();
    }
    let n = bytes.len();
    let modes: Vec<Mode> = MODES
        .iter()
        .copied()
        .filter(|&m| allow_kanji || m != Mode::Kanji)
        .collect();
    let header = |m: Mode| ((4 + m.char_count_bits(version)) * 6) as u64;
    let closed = |c: u64| c.div_ceil(6) * 6;

    const INF: u64 = u64::MAX / 4;
    // cost[p][k]: cheapest encoding of bytes[..p] whose last segment has mode k and is open
    let mut cost = vec![[INF; 4]; n + 1];
    // back[p][k]: (start of last unit, mode of the state it extended; None = start)
    let mut back: Vec<[(usize, Option<usize>); 4]> = vec![[(0, None); 4]; n + 1];
    let mut best_closed = vec![(INF, None::<usize>); n + 1];
    best_closed[0] = (0, None);

    for pos in 0..n {
        let (switch_cost, switch_from) = best_closed[pos];
        if switch_cost < INF {
            for (k, &mode) in modes.iter().enumerate() {
                if !fits(mode, bytes, pos) {
                    continue;
                }
                let end = pos + unit_len(mode);
                let mut candidate = (switch_cost + header(mode), switch_from);
                if cost[pos][k] < INF && cost[pos][k] <= candidate.0 {
                    candidate = (cost[pos][k], Some(k));
                }
                let total = candidate.0 + unit_cost(mode);
                if total < cost[end][k] {
                    cost[end][k] = total;
                    back[end][k] = (pos, candidate.1);
                }
            }
        }
        let next = pos + 1;
        for k in 0..modes.len() {
            if cost[next][k] < INF && closed(cost[next][k]) < best_closed[next].0 {
                best_closed[next] = (closed(cost[next][k]), Some(k));
            }
        }
    }

    // Walk back from the cheapest final state
    let mut units: Vec<(usize, usize, usize)> = Vec::new();
    let mut pos = n;
    let mut state = best_closed[n].1;
    while let Some(k) = state {
        if pos == 0 {
            break;
        }
        let (start, prev) = back[pos][k];
        units.push((start, pos, k));
        pos = start;
        state = prev;
    }
    units.reverse();

    let mut segments = Vec::new();
    let mut i = 0;
    while i < units.len() {
        let k = units[i].2;
        let start = units[i].0;
        let mut end = units[i].1;
        while i + 1 < units.len() && units[i + 1].2 == k {
            i += 1;
            end = units[i].1;
        }
        let slice = &bytes[start..end];
        segments.push(match modes[k] {
            Mode::Numeric => Segment::numeric(slice),
            Mode::Alphanumeric => Segment::alphanumeric(slice),
            Mode::Kanji => Segment::kanji(slice),
            _ => Segment::bytes(slice),
        });
        i += 1;
    }
    segments
}
