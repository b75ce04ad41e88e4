// Temperature sampling
// Injectable pseudo-random source so the retry loop stays reproducible under test.

use uuid::Uuid;

pub trait Sampler: Send {
    /// Uniform value in [0, 1).
    fn next_unit(&mut self) -> f64;

    /// Uniform draw from `[lo, hi)`, rounded to two decimals.
    fn temperature(&mut self, range: (f64, f64)) -> f64 {
        let (lo, hi) = range;
        let t = lo + self.next_unit() * (hi - lo);
        (t * 100.0).round() / 100.0
    }

    /// Uniform index into a collection of `len` items; `len` must be non-zero.
    fn pick(&mut self, len: usize) -> usize {
        ((self.next_unit() * len as f64) as usize).min(len.saturating_sub(1))
    }
}

/// SplitMix64; small, fast and good enough for picking sampling parameters.
#[derive(Debug, Clone)]
pub struct SeededSampler {
    state: u64,
}

impl SeededSampler {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seeded from a v4 UUID's random bits.
    pub fn from_entropy() -> Self {
        let bits = Uuid::new_v4().as_u128();
        Self::new((bits >> 64) as u64 ^ bits as u64)
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

impl Sampler for SeededSampler {
    fn next_unit(&mut self) -> f64 {
        // Top 53 bits map exactly onto the f64 mantissa.
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Always returns the same unit value.
#[derive(Debug, Clone, Copy)]
pub struct FixedSampler(pub f64);

impl Sampler for FixedSampler {
    fn next_unit(&mut self) -> f64 {
        self.0.clamp(0.0, 1.0 - f64::EPSILON)
    }
}
