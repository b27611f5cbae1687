extern crate alloc;

use alloc::vec::Vec;
use core::cmp::Ordering;

use super::limb::{self, HIGH_BIT};

/// Defines the supported rounding modes.
/// See IEEE754-2019 Section 4.3 Rounding-direction attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundingMode {
    NearestTiesToEven,
    Zero,
    AwayFromZero,
    Positive,
    Negative,
}

/// A rounding direction with the sign folded away: the arithmetic kernels
/// operate on magnitudes and resolve the directed modes up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AbsRound {
    Nearest,
    Toward,
    Away,
}

impl RoundingMode {
    /// Resolve this mode against the sign of the value being rounded.
    /// `negative` is that sign.
    pub(crate) fn for_magnitude(&self, negative: bool) -> AbsRound {
        match self {
            RoundingMode::NearestTiesToEven => AbsRound::Nearest,
            RoundingMode::Zero => AbsRound::Toward,
            RoundingMode::AwayFromZero => AbsRound::Away,
            RoundingMode::Positive => {
                if negative {
                    AbsRound::Toward
                } else {
                    AbsRound::Away
                }
            }
            RoundingMode::Negative => {
                if negative {
                    AbsRound::Away
                } else {
                    AbsRound::Toward
                }
            }
        }
    }

    /// Returns true if this mode moves a value of the given sign toward
    /// zero. Nearest never does: at the underflow boundary it is the
    /// caller's job to demote it first.
    pub(crate) fn is_like_toward_zero(&self, negative: bool) -> bool {
        *self != RoundingMode::NearestTiesToEven
            && self.for_magnitude(negative) == AbsRound::Toward
    }
}

/// Declare the different categories of the floating point number. These
/// categories are internal to the float, and can be accessed by the
/// accessors: is_inf, is_zero, is_nan, is_normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Infinity,
    NaN,
    Normal,
    Zero,
}

/// This is the main data structure of this library. It represents a
/// fixed-precision binary floating-point number. The precision is chosen
/// when the value is created and never changes in place.
///
/// The magnitude of a finite nonzero value lies in `[2^(exp-1), 2^exp)`:
/// the mantissa is a fraction in `[1/2, 1)` scaled by `2^exp`. The mantissa
/// words are stored least-significant first, left-aligned, so the top bit
/// of the top word is always set for normal values and the low
/// `64*n - prec` bits of word 0 are zero.
#[derive(Debug, Clone)]
pub struct Float {
    // The precision, in bits.
    prec: usize,
    // The sign bit. True means negative.
    sign: bool,
    // The exponent.
    exp: i64,
    // The mantissa words, least significant first, left-aligned.
    limbs: Vec<u64>,
    // The kind of number this float represents.
    category: Category,
}

impl Float {
    /// Create a new normal floating point number. The mantissa must be
    /// normalized and carry zero padding bits.
    pub fn new(prec: usize, sign: bool, exp: i64, limbs: Vec<u64>) -> Self {
        let a = Float {
            prec,
            sign,
            exp,
            limbs,
            category: Category::Normal,
        };
        a.check_invariants();
        a
    }

    /// Returns a new zero float.
    pub fn zero(prec: usize, sign: bool) -> Self {
        debug_assert!(prec >= 1);
        Float {
            prec,
            sign,
            exp: 0,
            limbs: vec![0; limb::limbs_for(prec)],
            category: Category::Zero,
        }
    }

    /// Returns a new float with the value one.
    pub fn one(prec: usize, sign: bool) -> Self {
        let n = limb::limbs_for(prec);
        let mut limbs = vec![0; n];
        limbs[n - 1] = HIGH_BIT;
        Float::new(prec, sign, 1, limbs)
    }

    /// Returns a new infinity float.
    pub fn inf(prec: usize, sign: bool) -> Self {
        Float {
            prec,
            sign,
            exp: 0,
            limbs: vec![0; limb::limbs_for(prec)],
            category: Category::Infinity,
        }
    }

    /// Returns a new NaN float.
    pub fn nan(prec: usize, sign: bool) -> Self {
        Float {
            prec,
            sign,
            exp: 0,
            limbs: vec![0; limb::limbs_for(prec)],
            category: Category::NaN,
        }
    }

    /// The smallest positive normal magnitude at the bottom of the
    /// exponent range, with the requested sign.
    pub(crate) fn smallest(prec: usize, sign: bool, emin: i64) -> Self {
        let n = limb::limbs_for(prec);
        let mut limbs = vec![0; n];
        limbs[n - 1] = HIGH_BIT;
        Float::new(prec, sign, emin, limbs)
    }

    /// The largest finite magnitude at the top of the exponent range, with
    /// the requested sign.
    pub(crate) fn largest(prec: usize, sign: bool, emax: i64) -> Self {
        let n = limb::limbs_for(prec);
        let mut limbs = vec![u64::MAX; n];
        limbs[0] &= !limb::low_mask(limb::pad_bits(prec));
        Float::new(prec, sign, emax, limbs)
    }

    /// Returns the precision in bits.
    pub fn prec(&self) -> usize {
        self.prec
    }

    /// Returns the sign of the float. True means negative.
    pub fn sign(&self) -> bool {
        self.sign
    }

    /// Returns the exponent of the float.
    pub fn exp(&self) -> i64 {
        self.exp
    }

    /// Returns the mantissa words, least significant first.
    pub fn limbs(&self) -> &[u64] {
        &self.limbs
    }

    /// Returns the category of the float.
    pub fn category(&self) -> Category {
        self.category
    }

    /// Returns true if the Float is negative.
    pub fn is_negative(&self) -> bool {
        self.sign
    }

    /// Returns true if the Float is +-Inf.
    pub fn is_inf(&self) -> bool {
        matches!(self.category, Category::Infinity)
    }

    /// Returns true if the Float is a NaN.
    pub fn is_nan(&self) -> bool {
        matches!(self.category, Category::NaN)
    }

    /// Returns true if the Float is +-zero.
    pub fn is_zero(&self) -> bool {
        matches!(self.category, Category::Zero)
    }

    /// Returns true if this number is normal (not Zero, NaN, Inf).
    pub fn is_normal(&self) -> bool {
        matches!(self.category, Category::Normal)
    }

    /// Returns a new float which has a flipped sign (negated value).
    pub fn neg(&self) -> Self {
        let mut a = self.clone();
        a.sign = !a.sign;
        a
    }

    /// Returns true if the mantissa is an exact power of two.
    pub(crate) fn is_power_of_two(&self) -> bool {
        debug_assert!(self.is_normal());
        let n = self.limbs.len();
        self.limbs[n - 1] == HIGH_BIT && limb::is_zero(&self.limbs[..n - 1])
    }

    /// Compare the magnitudes of two normal values of the same precision.
    pub(crate) fn cmp_abs(&self, other: &Self) -> Ordering {
        debug_assert!(self.is_normal() && other.is_normal());
        debug_assert_eq!(self.prec, other.prec);
        match self.exp.cmp(&other.exp) {
            Ordering::Equal => {}
            ord => return ord,
        }
        // Compare the words from the most significant down.
        for i in (0..self.limbs.len()).rev() {
            match self.limbs[i].cmp(&other.limbs[i]) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        Ordering::Equal
    }

    /// Verify the representation invariants: normal values are left
    /// aligned with their padding bits clear.
    pub(crate) fn check_invariants(&self) {
        debug_assert!(self.prec >= 1);
        debug_assert_eq!(self.limbs.len(), limb::limbs_for(self.prec));
        if let Category::Normal = self.category {
            let n = self.limbs.len();
            debug_assert!(
                self.limbs[n - 1] & HIGH_BIT != 0,
                "mantissa is not normalized"
            );
            let pad = limb::pad_bits(self.prec);
            debug_assert_eq!(
                self.limbs[0] & limb::low_mask(pad),
                0,
                "padding bits must be zero"
            );
        }
    }

    /// Prints the number using the internal representation.
    #[cfg(feature = "std")]
    pub fn dump(&self) {
        use std::{print, println};
        let sign = if self.sign { "-" } else { "+" };
        match self.category {
            Category::NaN => println!("[{}NaN]", sign),
            Category::Infinity => println!("[{}Inf]", sign),
            Category::Zero => println!("[{}0.0]", sign),
            Category::Normal => {
                print!("FP[{} E={:4} M=", sign, self.exp);
                for w in self.limbs.iter().rev() {
                    print!("{:016x}", w);
                }
                println!("]");
            }
        }
    }
}

impl PartialEq for Float {
    fn eq(&self, other: &Self) -> bool {
        let bitwise = self.sign == other.sign
            && self.exp == other.exp
            && self.limbs == other.limbs
            && self.category == other.category;

        match self.category {
            Category::Infinity | Category::Normal => bitwise,
            Category::Zero => other.is_zero(),
            Category::NaN => false,
        }
    }
}

impl PartialOrd for Float {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        debug_assert_eq!(self.prec, other.prec);
        let bool_to_ord = |ord: bool| -> Option<Ordering> {
            if ord {
                Some(Ordering::Less)
            } else {
                Some(Ordering::Greater)
            }
        };

        match (self.category, other.category) {
            (Category::NaN, _) | (_, Category::NaN) => None,
            (Category::Zero, Category::Zero) => Some(Ordering::Equal),
            (Category::Infinity, Category::Infinity) => {
                if self.sign == other.sign {
                    Some(Ordering::Equal)
                } else {
                    bool_to_ord(self.sign)
                }
            }
            (Category::Infinity, Category::Normal)
            | (Category::Infinity, Category::Zero)
            | (Category::Normal, Category::Zero) => bool_to_ord(self.sign),

            (Category::Normal, Category::Infinity)
            | (Category::Zero, Category::Infinity)
            | (Category::Zero, Category::Normal) => bool_to_ord(!other.sign),

            (Category::Normal, Category::Normal) => {
                if self.sign != other.sign {
                    bool_to_ord(self.sign)
                } else if self.sign {
                    Some(self.cmp_abs(other).reverse())
                } else {
                    Some(self.cmp_abs(other))
                }
            }
        }
    }
}
