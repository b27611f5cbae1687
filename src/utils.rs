//! Test helpers: a small pseudorandom generator and operand builders.

// Linear-feedback shift register. We use this as a random number
// generator for tests, so runs are reproducible.
pub struct Lfsr {
    state: u32,
}

impl Lfsr {
    pub fn new() -> Lfsr {
        Lfsr { state: 0x13371337 }
    }

    pub fn new_with_seed(seed: u32) -> Lfsr {
        Lfsr {
            state: 0x13371337 ^ seed,
        }
    }

    fn step(&mut self) {
        let a = (self.state >> 24) & 1;
        let b = (self.state >> 23) & 1;
        let c = (self.state >> 22) & 1;
        let d = (self.state >> 17) & 1;
        let n = a ^ b ^ c ^ d ^ 1;
        self.state <<= 1;
        self.state |= n;
    }

    fn get(&mut self) -> u32 {
        let mut res: u32 = 0;
        for _ in 0..32 {
            self.step();
            res <<= 1;
            res ^= self.state & 0x1;
        }
        res
    }

    pub fn get64(&mut self) -> u64 {
        ((self.get() as u64) << 32) | self.get() as u64
    }
}

/// A finite random double with its exponent squeezed into the middle of
/// the range, so sums and differences of two of them stay normal.
pub fn moderate_f64(lfsr: &mut Lfsr) -> f64 {
    let bits = lfsr.get64();
    let e = 512 + (bits >> 52) % 1024;
    f64::from_bits((bits & !(0x7ffu64 << 52)) | (e << 52))
}

/// Build a random normal float: random mantissa words with the top bit
/// forced on and the padding cleared, and an exponent from the caller.
pub fn random_normal(
    lfsr: &mut Lfsr,
    prec: usize,
    sign: bool,
    exp: i64,
) -> crate::Float {
    use crate::limb;
    let n = limb::limbs_for(prec);
    let mut limbs: Vec<u64> = (0..n).map(|_| lfsr.get64()).collect();
    limbs[n - 1] |= limb::HIGH_BIT;
    limbs[0] &= !limb::low_mask(limb::pad_bits(prec));
    crate::Float::new(prec, sign, exp, limbs)
}

#[test]
fn test_lfsr_balance() {
    let mut lfsr = Lfsr::new();

    // Count the number of items, and the number of 1s.
    let mut items = 0;
    let mut ones = 0;

    for _ in 0..10000 {
        let mut u = lfsr.get();
        for _ in 0..32 {
            items += 1;
            ones += u & 1;
            u >>= 1;
        }
    }
    // Make sure that we have around 50% 1s and 50% zeros.
    assert!((ones as f64) < (0.55 * items as f64));
    assert!((ones as f64) > (0.45 * items as f64));
}

#[test]
fn test_random_normal_invariants() {
    let mut lfsr = Lfsr::new_with_seed(7);
    for p in [2, 53, 64, 65, 129] {
        for _ in 0..50 {
            let x = random_normal(&mut lfsr, p, false, 0);
            x.check_invariants();
        }
    }
}
