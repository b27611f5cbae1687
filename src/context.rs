//! The arithmetic context: the exponent range shared by every operation
//! and the accumulated exception flags. Callers thread one context through
//! each call chain; the library never touches hidden global state, so
//! concurrent use only requires one context per execution context (or an
//! external single-writer discipline around a shared one).

use core::cmp::Ordering;

use bitflags::bitflags;

use super::float::{Float, RoundingMode};

bitflags! {
    /// Exception flags accumulated by arithmetic operations. Flags are
    /// sticky: operations only ever set them.
    pub struct Flags: u32 {
        const INEXACT = 0b001;
        const UNDERFLOW = 0b010;
        const OVERFLOW = 0b100;
    }
}

impl Default for Flags {
    fn default() -> Flags {
        Flags::empty()
    }
}

/// Default lower bound of the exponent range.
pub const EMIN_DEFAULT: i64 = -(1 << 62);
/// Default upper bound of the exponent range.
pub const EMAX_DEFAULT: i64 = 1 << 62;

/// The exponent range and exception flags for a chain of operations.
#[derive(Debug, Clone)]
pub struct Context {
    emin: i64,
    emax: i64,
    flags: Flags,
}

impl Default for Context {
    fn default() -> Self {
        Context::new(EMIN_DEFAULT, EMAX_DEFAULT)
    }
}

impl Context {
    /// Create a context with the exponent range `[emin, emax]` and no
    /// flags raised.
    pub fn new(emin: i64, emax: i64) -> Self {
        assert!(emin < emax, "invalid exponent range");
        Context {
            emin,
            emax,
            flags: Flags::empty(),
        }
    }

    /// The smallest exponent a finite nonzero value may carry.
    pub fn emin(&self) -> i64 {
        self.emin
    }

    /// The largest exponent a finite nonzero value may carry.
    pub fn emax(&self) -> i64 {
        self.emax
    }

    /// Returns the accumulated exception flags.
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Replace the accumulated flags, e.g. to restore a previously saved
    /// state around an internal computation.
    pub fn set_flags(&mut self, flags: Flags) {
        self.flags = flags;
    }

    /// Clear all accumulated flags.
    pub fn clear_flags(&mut self) {
        self.flags = Flags::empty();
    }

    pub(crate) fn raise(&mut self, flags: Flags) {
        self.flags |= flags;
    }

    /// Re-round a result whose exponent fell below `emin`. The caller has
    /// already rounded with an unbounded exponent range and demoted
    /// nearest-even to toward-zero when the magnitude is at or below half
    /// the smallest representable step; from here on, modes that round the
    /// given sign toward zero produce a signed zero and every other mode
    /// produces the smallest normal magnitude.
    pub(crate) fn underflow(
        &mut self,
        prec: usize,
        rnd: RoundingMode,
        sign: bool,
    ) -> (Float, Ordering) {
        self.raise(Flags::UNDERFLOW | Flags::INEXACT);
        if rnd.is_like_toward_zero(sign) {
            let t = if sign {
                Ordering::Greater
            } else {
                Ordering::Less
            };
            (Float::zero(prec, sign), t)
        } else {
            let t = if sign { Ordering::Less } else { Ordering::Greater };
            (Float::smallest(prec, sign, self.emin), t)
        }
    }

    /// The number overflowed: produce infinity or the largest finite
    /// magnitude based on the rounding mode and sign.
    pub(crate) fn overflow(
        &mut self,
        prec: usize,
        rnd: RoundingMode,
        sign: bool,
    ) -> (Float, Ordering) {
        self.raise(Flags::OVERFLOW | Flags::INEXACT);
        let to_inf = match rnd {
            RoundingMode::NearestTiesToEven => true,
            RoundingMode::AwayFromZero => true,
            RoundingMode::Zero => false,
            RoundingMode::Positive => !sign,
            RoundingMode::Negative => sign,
        };
        if to_inf {
            let t = if sign { Ordering::Less } else { Ordering::Greater };
            (Float::inf(prec, sign), t)
        } else {
            let t = if sign {
                Ordering::Greater
            } else {
                Ordering::Less
            };
            (Float::largest(prec, sign, self.emax), t)
        }
    }
}
