//! Reed-Solomon coding over GF(256)
//!
//! QR codes use the field with primitive polynomial x^8 + x^4 + x^3 + x^2 + 1 (0x11D)
//! and generator polynomials with roots alpha^0 .. alpha^(n-1). Codeword slices are
//! highest-degree coefficient first, the order they appear in the symbol.

use thiserror::Error;

/// GF(256) field operations using log/exp tables
pub struct Gf256;

static LOG_TABLE: [u8; 256] = [
    0, 0, 1, 25, 2, 50, 26, 198, 3, 223, 51, 238, 27, 104, 199, 75, 4, 100, 224, 14, 52, 141, 239,
    129, 28, 193, 105, 248, 200, 8, 76, 113, 5, 138, 101, 47, 225, 36, 15, 33, 53, 147, 142, 218,
    240, 18, 130, 69, 29, 181, 194, 125, 106, 39, 249, 185, 201, 154, 9, 120, 77, 228, 114, 166, 6,
    191, 139, 98, 102, 221, 48, 253, 226, 152, 37, 179, 16, 145, 34, 136, 54, 208, 148, 206, 143,
    150, 219, 189, 241, 210, 19, 92, 131, 56, 70, 64, 30, 66, 182, 163, 195, 72, 126, 110, 107, 58,
    40, 84, 250, 133, 186, 61, 202, 94, 155, 159, 10, 21, 121, 43, 78, 212, 229, 172, 115, 243,
    167, 87, 7, 112, 192, 247, 140, 128, 99, 13, 103, 74, 222, 237, 49, 197, 254, 24, 227, 165,
    153, 119, 38, 184, 180, 124, 17, 68, 146, 217, 35, 32, 137, 46, 55, 63, 209, 91, 149, 188, 207,
    205, 144, 135, 151, 178, 220, 252, 190, 97, 242, 86, 211, 171, 20, 42, 93, 158, 132, 60, 57,
    83, 71, 109, 65, 162, 31, 45, 67, 216, 183, 123, 164, 118, 196, 23, 73, 236, 127, 12, 111, 246,
    108, 161, 59, 82, 41, 157, 85, 170, 251, 96, 134, 177, 187, 204, 62, 90, 203, 89, 95, 176, 156,
    169, 160, 81, 11, 245, 22, 235, 122, 117, 44, 215, 79, 174, 213, 233, 230, 231, 173, 232, 116,
    214, 244, 234, 168, 80, 88, 175,
];

static EXP_TABLE: [u8; 256] = [
    1, 2, 4, 8, 16, 32, 64, 128, 29, 58, 116, 232, 205, 135, 19, 38, 76, 152, 45, 90, 180, 117,
    234, 201, 143, 3, 6, 12, 24, 48, 96, 192, 157, 39, 78, 156, 37, 74, 148, 53, 106, 212, 181,
    119, 238, 193, 159, 35, 70, 140, 5, 10, 20, 40, 80, 160, 93, 186, 105, 210, 185, 111, 222, 161,
    95, 190, 97, 194, 153, 47, 94, 188, 101, 202, 137, 15, 30, 60, 120, 240, 253, 231, 211, 187,
    107, 214, 177, 127, 254, 225, 223, 163, 91, 182, 113, 226, 217, 175, 67, 134, 17, 34, 68, 136,
    13, 26, 52, 104, 208, 189, 103, 206, 129, 31, 62, 124, 248, 237, 199, 147, 59, 118, 236, 197,
    151, 51, 102, 204, 133, 23, 46, 92, 184, 109, 218, 169, 79, 158, 33, 66, 132, 21, 42, 84, 168,
    77, 154, 41, 82, 164, 85, 170, 73, 146, 57, 114, 228, 213, 183, 115, 230, 209, 191, 99, 198,
    145, 63, 126, 252, 229, 215, 179, 123, 246, 241, 255, 227, 219, 171, 75, 150, 49, 98, 196, 149,
    55, 110, 220, 165, 87, 174, 65, 130, 25, 50, 100, 200, 141, 7, 14, 28, 56, 112, 224, 221, 167,
    83, 166, 81, 162, 89, 178, 121, 242, 249, 239, 195, 155, 43, 86, 172, 69, 138, 9, 18, 36, 72,
    144, 61, 122, 244, 245, 247, 243, 251, 235, 203, 139, 11, 22, 44, 88, 176, 125, 250, 233, 207,
    131, 27, 54, 108, 216, 173, 71, 142, 1,
];

impl Gf256 {
    /// Product of two field elements
    pub fn mul(a: u8, b: u8) -> u8 {
        if a == 0 || b == 0 {
            return 0;
        }
        let log_a = LOG_TABLE[a as usize] as usize;
        let log_b = LOG_TABLE[b as usize] as usize;
        EXP_TABLE[(log_a + log_b) % 255]
    }

    /// Quotient `a / b`; callers guarantee `b != 0` (zero yields zero)
    pub fn div(a: u8, b: u8) -> u8 {
        if a == 0 || b == 0 {
            return 0;
        }
        let log_a = LOG_TABLE[a as usize] as usize;
        let log_b = LOG_TABLE[b as usize] as usize;
        EXP_TABLE[(log_a + 255 - log_b) % 255]
    }

    /// alpha^n
    pub fn exp(n: usize) -> u8 {
        EXP_TABLE[n % 255]
    }

    /// Multiplicative inverse of a nonzero element
    pub fn inv(a: u8) -> u8 {
        Self::div(1, a)
    }

    /// Evaluate a lowest-degree-first polynomial at `x`
    fn eval_low_first(poly: &[u8], x: u8) -> u8 {
        poly.iter()
            .rev()
            .fold(0u8, |acc, &coef| Self::mul(acc, x) ^ coef)
    }
}

/// Computes EC codewords for data blocks of a fixed EC length
pub struct ReedSolomonEncoder {
    // Generator coefficients, highest degree first, leading 1 omitted
    divisor: Vec<u8>,
}

impl ReedSolomonEncoder {
    /// Encoder producing `degree` EC codewords per block
    pub fn new(degree: usize) -> Self {
        let mut divisor = vec![0u8; degree];
        if degree == 0 {
            return Self { divisor };
        }
        divisor[degree - 1] = 1;
        // Multiply by (x - alpha^i) for i in 0..degree
        let mut root = 1u8;
        for _ in 0..degree {
            for j in 0..degree {
                divisor[j] = Gf256::mul(divisor[j], root);
                if j + 1 < degree {
                    divisor[j] ^= divisor[j + 1];
                }
            }
            root = Gf256::mul(root, 0x02);
        }
        Self { divisor }
    }

    /// Remainder of `data * x^degree` divided by the generator
    pub fn ecc(&self, data: &[u8]) -> Vec<u8> {
        let mut result = vec![0u8; self.divisor.len()];
        if result.is_empty() {
            return result;
        }
        for &byte in data {
            let factor = byte ^ result[0];
            result.rotate_left(1);
            let last = result.len() - 1;
            result[last] = 0;
            for (r, &d) in result.iter_mut().zip(&self.divisor) {
                *r ^= Gf256::mul(d, factor);
            }
        }
        result
    }
}

/// Raised when a block holds more errors than its EC codewords can fix
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("too many errors in Reed-Solomon block")]
pub struct TooManyErrors;

/// Reed-Solomon decoder for QR codes
pub struct ReedSolomonDecoder {
    num_ecc_codewords: usize,
}

impl ReedSolomonDecoder {
    /// Decoder for blocks carrying `num_ecc_codewords` EC codewords
    pub fn new(num_ecc_codewords: usize) -> Self {
        Self { num_ecc_codewords }
    }

    /// Correct `received` in place and return how many codewords were repaired.
    ///
    /// Fails without touching the block when the error locator is inconsistent or
    /// the corrected block still has nonzero syndromes.
    pub fn decode(&self, received: &mut [u8]) -> Result<usize, TooManyErrors> {
        let n = received.len();
        if n <= self.num_ecc_codewords || n > 255 {
            return Err(TooManyErrors);
        }

        let syndrome = self.calculate_syndrome(received);
        if syndrome.iter().all(|&s| s == 0) {
            return Ok(0);
        }

        let lambda = self.find_error_locator(&syndrome)?;
        let errors = lambda.len() - 1;
        if errors * 2 > self.num_ecc_codewords {
            return Err(TooManyErrors);
        }

        // Chien search: position i holds the coefficient of x^(n-1-i)
        let positions: Vec<usize> = (0..n)
            .filter(|&i| {
                let x_inv = Gf256::inv(Gf256::exp(n - 1 - i));
                Gf256::eval_low_first(&lambda, x_inv) == 0
            })
            .collect();
        if positions.len() != errors {
            return Err(TooManyErrors);
        }

        // Omega(x) = S(x) * Lambda(x) mod x^nsym
        let mut omega = vec![0u8; self.num_ecc_codewords];
        for (i, &s) in syndrome.iter().enumerate() {
            for (j, &l) in lambda.iter().enumerate() {
                if i + j < omega.len() {
                    omega[i + j] ^= Gf256::mul(s, l);
                }
            }
        }

        // Formal derivative keeps odd-power terms
        let lambda_prime: Vec<u8> = lambda
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, &c)| if i % 2 == 1 { c } else { 0 })
            .collect();

        let mut corrected = received.to_vec();
        for &pos in &positions {
            let x = Gf256::exp(n - 1 - pos);
            let x_inv = Gf256::inv(x);
            let denom = Gf256::eval_low_first(&lambda_prime, x_inv);
            if denom == 0 {
                return Err(TooManyErrors);
            }
            let numer = Gf256::mul(x, Gf256::eval_low_first(&omega, x_inv));
            corrected[pos] ^= Gf256::div(numer, denom);
        }

        if self.calculate_syndrome(&corrected).iter().any(|&s| s != 0) {
            return Err(TooManyErrors);
        }
        received.copy_from_slice(&corrected);
        Ok(errors)
    }

    fn calculate_syndrome(&self, received: &[u8]) -> Vec<u8> {
        (0..self.num_ecc_codewords)
            .map(|i| {
                // Horner over the descending coefficients at alpha^i
                let x = Gf256::exp(i);
                received
                    .iter()
                    .fold(0u8, |acc, &c| Gf256::mul(acc, x) ^ c)
            })
            .collect()
    }

    /// Berlekamp-Massey; returns Lambda lowest degree first, trimmed to its degree
    fn find_error_locator(&self, syndrome: &[u8]) -> Result<Vec<u8>, TooManyErrors> {
        let mut lambda = vec![1u8];
        let mut prev = vec![1u8];
        let mut prev_delta: u8 = 1;
        let mut l = 0usize;
        let mut m = 1usize;

        for i in 0..syndrome.len() {
            let mut delta = syndrome[i];
            for j in 1..=l.min(lambda.len() - 1) {
                delta ^= Gf256::mul(lambda[j], syndrome[i - j]);
            }

            if delta == 0 {
                m += 1;
                continue;
            }

            let coef = Gf256::div(delta, prev_delta);
            let snapshot = lambda.clone();
            if lambda.len() < prev.len() + m {
                lambda.resize(prev.len() + m, 0);
            }
            for (j, &b) in prev.iter().enumerate() {
                lambda[j + m] ^= Gf256::mul(coef, b);
            }

            if 2 * l <= i {
                l = i + 1 - l;
                prev = snapshot;
                prev_delta = delta;
                m = 1;
            } else {
                m += 1;
            }
        }

        while lambda.len() > 1 && lambda.last() == Some(&0) {
            lambda.pop();
        }
        if lambda.len() - 1 != l {
            return Err(TooManyErrors);
        }
        Ok(lambda)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gf_arithmetic() {
        assert_eq!(Gf256::mul(0, 7), 0);
        assert_eq!(Gf256::mul(2, 0x80), 0x1d);
        for a in 1..=255u8 {
            assert_eq!(Gf256::mul(a, Gf256::inv(a)), 1);
        }
        assert_eq!(Gf256::div(Gf256::mul(37, 91), 91), 37);
    }

    #[test]
    fn test_encoder_known_block() {
        // Version 1-M "01234567" example from ISO/IEC 18004 annex
        let data = [
            0x10, 0x20, 0x0C, 0x56, 0x61, 0x80, 0xEC, 0x11, 0xEC, 0x11, 0xEC, 0x11, 0xEC, 0x11,
            0xEC, 0x11,
        ];
        let ecc = ReedSolomonEncoder::new(10).ecc(&data);
        assert_eq!(
            ecc,
            vec![0xA5, 0x24, 0xD4, 0xC1, 0xED, 0x36, 0xC7, 0x87, 0x2C, 0x55]
        );
    }

    fn codeword(data: &[u8], ecc_len: usize) -> Vec<u8> {
        let mut block = data.to_vec();
        block.extend(ReedSolomonEncoder::new(ecc_len).ecc(data));
        block
    }

    #[test]
    fn test_clean_block() {
        let mut block = codeword(b"hello world", 10);
        assert_eq!(ReedSolomonDecoder::new(10).decode(&mut block), Ok(0));
    }

    #[test]
    fn test_corrects_up_to_half_ecc() {
        let original = codeword(b"The quick brown fox", 10);
        let mut block = original.clone();
        for (k, pos) in [0usize, 4, 9, 17, 28].iter().enumerate() {
            block[*pos] ^= 0x5A + k as u8;
        }
        assert_eq!(ReedSolomonDecoder::new(10).decode(&mut block), Ok(5));
        assert_eq!(block, original);
    }

    #[test]
    fn test_rejects_beyond_capacity_without_modifying() {
        let original = codeword(b"The quick brown fox", 10);
        let mut block = original.clone();
        for pos in [1usize, 3, 5, 7, 9, 11] {
            block[pos] ^= 0xFF;
        }
        let damaged = block.clone();
        let decoder = ReedSolomonDecoder::new(10);
        if decoder.decode(&mut block).is_ok() {
            // A miscorrection can only land on another valid codeword, never the original
            assert_ne!(block, original);
        } else {
            assert_eq!(block, damaged);
        }
    }
}
