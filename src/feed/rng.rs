// Seeded pseudo-random source shared by the pacing controller and the
// synthetic trade generator.

const MULTIPLIER: u64 = 9301;
const INCREMENT: u64 = 49297;
const MODULUS: u64 = 233280;

/// Anything that can hand out uniform draws in [0, 1).
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;

    /// Pick an index in `0..len` from a single draw. `len` must be > 0.
    fn pick(&mut self, len: usize) -> usize {
        let idx = (self.next_f64() * len as f64) as usize;
        idx.min(len.saturating_sub(1))
    }

    /// Uniform integer in `[low, low + span)`.
    fn uniform(&mut self, low: u64, span: u64) -> u64 {
        low + (self.next_f64() * span as f64) as u64
    }
}

/// Linear congruential generator: `state = (state * 9301 + 49297) mod 233280`.
///
/// Two generators built from the same seed yield the same sequence, which is
/// what lets physically separate displays agree on synthetic content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededRng {
    state: u64,
    draws: u64,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        // (seed * a + c) mod m == ((seed mod m) * a + c) mod m, and reducing
        // first keeps the multiplication inside u64.
        Self { state: seed % MODULUS, draws: 0 }
    }

    /// Number of values handed out so far.
    pub fn draws(&self) -> u64 {
        self.draws
    }
}

impl RandomSource for SeededRng {
    fn next_f64(&mut self) -> f64 {
        self.state = (self.state * MULTIPLIER + INCREMENT) % MODULUS;
        self.draws += 1;
        self.state as f64 / MODULUS as f64
    }
}

impl Iterator for SeededRng {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        Some(self.next_f64())
    }
}
