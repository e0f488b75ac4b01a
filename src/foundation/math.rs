pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Map a normalized value `t` onto `[lo, hi)` index slots, i.e. `min(floor(t * n), n - 1)`.
///
/// The result is exact at slot boundaries: `t == i / n` always yields `i`, even when
/// `t * n` lands one ulp below the integer.
pub(crate) fn slot_index(t: f64, n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let t = if t.is_finite() { t.max(0.0) } else { 0.0 };
    let nf = n as f64;
    let mut idx = ((t * nf).floor() as usize).min(n - 1);
    while idx + 1 < n && t >= (idx + 1) as f64 / nf {
        idx += 1;
    }
    while idx > 0 && t < idx as f64 / nf {
        idx -= 1;
    }
    idx
}

/// Deterministic xorshift64* generator for decorative randomness.
#[derive(Clone, Debug)]
pub(crate) struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    pub(crate) fn new(seed: u64) -> Self {
        // splitmix64 scramble so small seeds still produce well-mixed state
        let mut z = seed.wrapping_add(0x9e37_79b9_7f4a_7c15);
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^= z >> 31;
        Self {
            state: if z == 0 { 0x2545_f491_4f6c_dd1d } else { z },
        }
    }

    pub(crate) fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_f491_4f6c_dd1d)
    }

    /// Uniform `f64` in `[0, 1)`.
    pub(crate) fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Uniform `f64` in `[lo, hi)`.
    pub(crate) fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
