//! A transparently-correct reference for the arithmetic kernels, used
//! only by the test suite: materialize the exact result as a wide
//! integer, round it explicitly, and apply the boundary policies. Every
//! kernel result is compared against this bit-for-bit, flag-for-flag.

use core::cmp::Ordering;

use crate::bigint::BigInt;
use crate::context::Flags;
use crate::float::{AbsRound, Float, RoundingMode};
use crate::limb;

/// The p-bit mantissa of a normal value as a plain integer.
fn mant_int(x: &Float) -> BigInt {
    let mut m = BigInt::from_parts(x.limbs());
    m.shift_right(limb::pad_bits(x.prec()));
    m
}

/// Rebuild a `Float` from a p-bit integer mantissa.
fn to_float(q: &BigInt, prec: usize, sign: bool, exp: i64) -> Float {
    let mut m = q.clone();
    m.shift_left(limb::pad_bits(prec));
    let n = limb::limbs_for(prec);
    let limbs: Vec<u64> = (0..n)
        .map(|i| if i < m.len() { m.get_part(i) } else { 0 })
        .collect();
    Float::new(prec, sign, exp, limbs)
}

fn signed(t: i32, negative: bool) -> Ordering {
    let v = if negative { -t } else { t };
    v.cmp(&0)
}

/// Reference subtraction: `b - c` with `c` carrying `b`'s sign, rounded
/// to the shared precision under `rnd` within the exponent range
/// `[emin, emax]`. Returns the value, the ternary code and the flags the
/// operation must raise.
pub(crate) fn ref_sub(
    b: &Float,
    c: &Float,
    rnd: RoundingMode,
    emin: i64,
) -> (Float, Ordering, Flags) {
    let p = b.prec();
    assert_eq!(p, c.prec());

    let (b, c, sign) = match b.cmp_abs(c) {
        Ordering::Equal => {
            let s = rnd == RoundingMode::Negative;
            return (Float::zero(p, s), Ordering::Equal, Flags::empty());
        }
        Ordering::Greater => (b, c, b.sign()),
        Ordering::Less => (c, b, !b.sign()),
    };

    let d = (b.exp() - c.exp()) as usize;
    let mut diff = mant_int(b);
    diff.shift_left(d);
    let borrow = diff.inplace_sub(&mant_int(c));
    assert!(!borrow);
    round_reference(diff, c.exp(), sign, p, rnd, emin)
}

/// Reference addition of magnitudes, `|b| + |c|` with the given sign.
pub(crate) fn ref_add(
    b: &Float,
    c: &Float,
    sign: bool,
    rnd: RoundingMode,
    emax: i64,
) -> (Float, Ordering, Flags) {
    let p = b.prec();
    assert_eq!(p, c.prec());
    let (b, c) = if b.exp() < c.exp() { (c, b) } else { (b, c) };

    let d = (b.exp() - c.exp()) as usize;
    let mut sum = mant_int(b);
    sum.shift_left(d);
    sum.inplace_add(&mant_int(c));

    // The exact sum is sum * 2^(exp(c) - p); round it to p bits.
    let m = sum.msb_index();
    let mut ex = c.exp() - p as i64 + m as i64;
    debug_assert!(m > p);
    let cut = m - p;
    let loss = sum.get_loss_kind_for_bit(cut);
    let mut q = sum;
    q.shift_right(cut);
    let increment = match rnd.for_magnitude(sign) {
        AbsRound::Nearest => {
            loss.is_mt_half() || (loss.is_exactly_half() && q.is_odd())
        }
        AbsRound::Toward => false,
        AbsRound::Away => !loss.is_exactly_zero(),
    };
    if increment {
        q.inplace_add(&BigInt::one());
        if q.msb_index() == p + 1 {
            q.shift_right(1);
            ex += 1;
        }
    }
    let t = if loss.is_exactly_zero() {
        0
    } else if increment {
        1
    } else {
        -1
    };

    if ex > emax {
        // Mirror the overflow policy.
        let to_inf = match rnd {
            RoundingMode::NearestTiesToEven => true,
            RoundingMode::AwayFromZero => true,
            RoundingMode::Zero => false,
            RoundingMode::Positive => !sign,
            RoundingMode::Negative => sign,
        };
        let flags = Flags::OVERFLOW | Flags::INEXACT;
        return if to_inf {
            (Float::inf(p, sign), signed(1, sign), flags)
        } else {
            (Float::largest(p, sign, emax), signed(-1, sign), flags)
        };
    }

    let flags = if t != 0 { Flags::INEXACT } else { Flags::empty() };
    (to_float(&q, p, sign, ex), signed(t, sign), flags)
}

/// Round the exact nonzero magnitude `diff * 2^(cx - p)` to p bits, then
/// apply the underflow policy at `emin`.
fn round_reference(
    diff: BigInt,
    cx: i64,
    sign: bool,
    p: usize,
    rnd: RoundingMode,
    emin: i64,
) -> (Float, Ordering, Flags) {
    let m = diff.msb_index();
    debug_assert!(m > 0);
    let mut ex = cx - p as i64 + m as i64;

    let (q, t) = if m <= p {
        // The exact difference fits the precision.
        let mut q = diff;
        q.shift_left(p - m);
        (q, 0)
    } else {
        let cut = m - p;
        let loss = diff.get_loss_kind_for_bit(cut);
        let mut q = diff;
        q.shift_right(cut);
        let increment = match rnd.for_magnitude(sign) {
            AbsRound::Nearest => {
                loss.is_mt_half() || (loss.is_exactly_half() && q.is_odd())
            }
            AbsRound::Toward => false,
            AbsRound::Away => !loss.is_exactly_zero(),
        };
        if increment {
            q.inplace_add(&BigInt::one());
            if q.msb_index() == p + 1 {
                q.shift_right(1);
                ex += 1;
            }
        }
        let t = if loss.is_exactly_zero() {
            0
        } else if increment {
            1
        } else {
            -1
        };
        (q, t)
    };

    if ex < emin {
        // Underflow is decided after rounding with an unbounded range.
        // Nearest falls back to toward-zero at or below half the
        // smallest step.
        let pow2 = q == BigInt::one_hot(p - 1);
        let rnd = if rnd == RoundingMode::NearestTiesToEven
            && (ex < emin - 1 || pow2)
        {
            RoundingMode::Zero
        } else {
            rnd
        };
        let flags = Flags::UNDERFLOW | Flags::INEXACT;
        return if rnd.is_like_toward_zero(sign) {
            (Float::zero(p, sign), signed(-1, sign), flags)
        } else {
            (Float::smallest(p, sign, emin), signed(1, sign), flags)
        };
    }

    let flags = if t != 0 { Flags::INEXACT } else { Flags::empty() };
    (to_float(&q, p, sign, ex), signed(t, sign), flags)
}

/// True when the exact residual of the last `ref_sub`-style rounding sits
/// exactly on a nearest tie. Used by the tie-law test.
pub(crate) fn residual_is_half_ulp(b: &Float, c: &Float) -> bool {
    if b.cmp_abs(c) == Ordering::Equal {
        return false;
    }
    let (b, c) = if b.cmp_abs(c) == Ordering::Greater {
        (b, c)
    } else {
        (c, b)
    };
    let p = b.prec();
    let d = (b.exp() - c.exp()) as usize;
    let mut diff = mant_int(b);
    diff.shift_left(d);
    let _ = diff.inplace_sub(&mant_int(c));
    let m = diff.msb_index();
    if m <= p {
        return false;
    }
    diff.get_loss_kind_for_bit(m - p).is_exactly_half()
}
