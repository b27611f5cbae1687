//! The correctly-rounded subtraction kernel for two operands that share
//! one precision.
//!
//! The kernel never materializes the exact difference. It splits on the
//! exponent gap `d = exp(b) - exp(c)` and derives, for each regime, the
//! pair of bits that summarizes everything discarded below the kept
//! precision: the round bit (the first discarded bit) and the sticky bit
//! (the OR of all deeper ones). A single shared decision routine then
//! truncates or subtracts one more ulp. Because the discarded bits belong
//! to the subtrahend, truncation leaves the magnitude *above* the exact
//! value, and "rounding up" means moving one ulp further down.

extern crate alloc;

use alloc::vec::Vec;
use core::cmp::Ordering;

use super::context::{Context, Flags};
use super::float::{AbsRound, Float, RoundingMode};
use super::limb::{
    self, is_zero, lshift, low_mask, rshift_into, sub_into, sub_small,
    HIGH_BIT,
};

/// Everything the rounding decision needs to know about the discarded
/// tail. `round2`/`sticky2` are the same pair one position deeper,
/// captured speculatively *before* the subtraction whenever a leading bit
/// may cancel: once the mantissa shifts, the evidence cannot be recovered.
struct Tail {
    round: bool,
    sticky: bool,
    round2: Option<bool>,
    sticky2: Option<bool>,
}

/// Compute `b - c` where both operands are finite, nonzero and share one
/// precision, treating `c` as if it carried `b`'s sign (the caller reduces
/// general signed addition and subtraction to this magnitude form).
/// Returns the rounded difference and the ternary code: the sign of
/// (returned value - exact value).
pub(crate) fn sub_normals(
    b: &Float,
    c: &Float,
    rnd: RoundingMode,
    ctx: &mut Context,
) -> (Float, Ordering) {
    assert_eq!(
        b.prec(),
        c.prec(),
        "subtraction operands must share one precision"
    );
    assert!(
        b.is_normal() && c.is_normal(),
        "subtraction operands must be finite and nonzero"
    );
    let p = b.prec();
    assert!(p >= 2, "precision must be at least two bits");

    // Order the operands by magnitude. The result takes the sign of the
    // larger one relative to `b`; equal magnitudes collapse to a signed
    // zero whose sign is negative only when rounding toward -infinity.
    let (b, c, sign) = match b.cmp_abs(c) {
        Ordering::Equal => {
            let s = rnd == RoundingMode::Negative;
            return (Float::zero(p, s), Ordering::Equal);
        }
        Ordering::Greater => (b, c, b.sign()),
        Ordering::Less => (c, b, !b.sign()),
    };

    let bx = b.exp();
    let cx = c.exp();
    let d = (bx as i128) - (cx as i128);
    debug_assert!(d >= 0);

    if d == 0 {
        sub_equal_exp(b, c, sign, rnd, ctx)
    } else if d == 1 {
        sub_off_by_one(b, c, sign, rnd, ctx)
    } else if d < p as i128 {
        sub_general(b, c, d as usize, sign, rnd, ctx)
    } else {
        sub_far(b, c, d, sign, rnd, ctx)
    }
}

/// Regime `d == 0`: the word-wise difference is exact, but the leading
/// bits may cancel arbitrarily far.
fn sub_equal_exp(
    b: &Float,
    c: &Float,
    sign: bool,
    rnd: RoundingMode,
    ctx: &mut Context,
) -> (Float, Ordering) {
    let n = b.limbs().len();
    let mut ap = vec![0u64; n];
    let borrow = sub_into(&mut ap, b.limbs(), c.limbs());
    debug_assert!(!borrow);
    let (ap, bx) = exact_normalize(ap, b.exp());
    finish_exact(ap, bx, sign, b.prec(), rnd, ctx)
}

/// Shift a nonzero mantissa back up so its top bit reaches the normalized
/// position, adjusting the exponent by the leading zero count (full zero
/// words included).
fn exact_normalize(mut ap: Vec<u64>, bx: i64) -> (Vec<u64>, i64) {
    let n = ap.len();
    let k = match (0..n).rev().find(|&i| ap[i] != 0) {
        Some(k) => k,
        // The dispatcher only gets here with unequal operands.
        None => unreachable!("exact difference cannot be zero"),
    };
    let cnt = (n - 1 - k) * u64::BITS as usize
        + ap[k].leading_zeros() as usize;
    if cnt > 0 {
        lshift(&mut ap, cnt);
    }
    (ap, bx - cnt as i64)
}

/// Regime `d == 1`: the result is either exactly `2b - c` (the exponent
/// drops) or `b - c/2` with a single discarded bit. Decide which without
/// performing a subtraction that would be thrown away: compare `b` against
/// `c/2` word by word from the top.
fn sub_off_by_one(
    b: &Float,
    c: &Float,
    sign: bool,
    rnd: RoundingMode,
    ctx: &mut Context,
) -> (Float, Ordering) {
    let p = b.prec();
    let n = b.limbs().len();
    let sh = limb::pad_bits(p);
    let bp = b.limbs();
    let cp = c.limbs();
    let bx = b.exp();

    let top = bp[n - 1].wrapping_sub(cp[n - 1] >> 1);
    let no_lose = if top > HIGH_BIT {
        true
    } else if top < HIGH_BIT {
        false
    } else {
        // The leading words agree exactly: scan deeper for the first
        // differing bit of `b` and `c/2`.
        let mut k = n as isize - 1;
        let mut carry: u64;
        loop {
            carry = cp[k as usize] << 63;
            k -= 1;
            if k < 0 {
                break;
            }
            carry |= cp[k as usize] >> 1;
            if bp[k as usize] != carry {
                break;
            }
        }
        if k < 0 {
            // b - c/2 is exactly half the range: the difference is a
            // power of two, minus a final half bit of c if it is set.
            return if carry != 0 {
                // The half bit is set: the exact difference is all ones
                // one exponent down. Only reachable when the precision
                // fills its words exactly.
                debug_assert_eq!(sh, 0);
                finish_exact(vec![u64::MAX; n], bx - 1, sign, p, rnd, ctx)
            } else {
                // A clean power of two.
                let mut ap = vec![0u64; n];
                ap[n - 1] = HIGH_BIT;
                finish_exact(ap, bx, sign, p, rnd, ctx)
            };
        }
        bp[k as usize] > carry
    };

    if no_lose {
        // |b| - |c| keeps the exponent: compute b - c/2 and round on the
        // single bit of c that falls off.
        let c0 = cp[0] & (1u64 << sh);
        let mut cs = vec![0u64; n];
        rshift_into(&mut cs, cp, 1);
        cs[0] &= !low_mask(sh);
        let mut ap = vec![0u64; n];
        let borrow = sub_into(&mut ap, bp, &cs);
        debug_assert!(!borrow);
        debug_assert!(ap[n - 1] & HIGH_BIT != 0);
        if c0 == 0 {
            return finish_exact(ap, bx, sign, p, rnd, ctx);
        }
        let tail = Tail {
            round: true,
            sticky: false,
            round2: None,
            sticky2: None,
        };
        round_sub(ap, bx, tail, sign, rnd, p, ctx)
    } else {
        // The exponent drops by one: 2b - c is exact, modulo the word
        // width (the shifted-out top bit cancels against the borrow).
        let mut ap = bp.to_vec();
        lshift(&mut ap, 1);
        let _ = limb::sub_assign(&mut ap, cp);
        let (ap, bx) = exact_normalize(ap, bx - 1);
        finish_exact(ap, bx, sign, p, rnd, ctx)
    }
}

/// Regime `2 <= d < p`: shift `c` right by `d` into scratch, recording the
/// round bit and a running sticky OR as the shift proceeds, then subtract
/// in place. Cancellation is bounded to one leading bit, whose refill data
/// is captured one position deeper before the subtraction.
fn sub_general(
    b: &Float,
    c: &Float,
    d: usize,
    sign: bool,
    rnd: RoundingMode,
    ctx: &mut Context,
) -> (Float, Ordering) {
    let p = b.prec();
    let n = b.limbs().len();
    let sh = limb::pad_bits(p);
    let bp = b.limbs();
    let cp = c.limbs();
    let mut bx = b.exp();

    let mut cc = vec![0u64; n];
    rshift_into(&mut cc, cp, d);

    // Round bit and sticky bit of the shifted-out tail. The cheap reads
    // come from the shifted copy; when they are inconclusive the scan
    // falls back to the original mantissa of c, starting just past the
    // bits already examined.
    let round;
    let sticky;
    if sh > 0 {
        round = cc[0] & (1u64 << (sh - 1)) != 0;
        if cc[0] & low_mask(sh - 1) != 0 {
            sticky = true;
        } else {
            let x = p - d + sh - 1;
            sticky = x <= p && any_below(cp, x);
        }
    } else {
        let x = p - d;
        round = bit_at(cp, x);
        sticky = any_below(cp, x);
    }

    // If the top words are close enough that a leading bit can cancel,
    // capture the round/sticky pair one position deeper now.
    let mut round2 = None;
    let mut sticky2 = None;
    if bp[n - 1].wrapping_sub(cc[n - 1]) <= HIGH_BIT {
        if !sticky {
            // Nothing beyond the round position: both deeper bits are 0.
            round2 = Some(false);
            sticky2 = Some(false);
        } else {
            let x = p + 1 - d;
            let r2 = bit_at(cp, x);
            round2 = Some(r2);
            // A clear deeper round bit with a set sticky forces the
            // deeper sticky to 1.
            sticky2 = Some(!r2 || any_below(cp, x));
        }
    }

    // The bits of c that fell into the padding are summarized by
    // round/sticky; clear them and subtract.
    cc[0] &= !low_mask(sh);
    let mut ap = vec![0u64; n];
    let borrow = sub_into(&mut ap, bp, &cc);
    debug_assert!(!borrow);

    let mut tail = Tail {
        round,
        sticky,
        round2,
        sticky2,
    };
    if ap[n - 1] & HIGH_BIT == 0 {
        // One leading bit cancelled. Shift back; the round bit was
        // borrowed from c, so once it becomes the last mantissa bit it
        // must be subtracted as well.
        lshift(&mut ap, 1);
        if tail.round {
            let borrow = sub_small(&mut ap, 1u64 << sh);
            debug_assert!(!borrow);
        }
        debug_assert!(ap[n - 1] & HIGH_BIT != 0);
        bx -= 1;
        debug_assert!(tail.round2.is_some() && tail.sticky2.is_some());
        tail.round = tail.round2.take().unwrap_or(false);
        tail.sticky = tail.sticky2.take().unwrap_or(false);
    }

    round_sub(ap, bx, tail, sign, rnd, p, ctx)
}

/// Regime `d >= p`: the mantissa of the result is `b`'s unchanged and the
/// whole of `c` collapses into the round/sticky pair. The `d == p` and
/// `d == p + 1` boundary cases scan `c` for its first nonzero remainder.
fn sub_far(
    b: &Float,
    c: &Float,
    d: i128,
    sign: bool,
    rnd: RoundingMode,
    ctx: &mut Context,
) -> (Float, Ordering) {
    let p = b.prec();
    let n = b.limbs().len();
    let cp = c.limbs();
    debug_assert!(d >= p as i128);

    let tail = if d == p as i128 {
        // The leading bit of c sits exactly on the round position.
        let r2 = cp[n - 1] & (HIGH_BIT >> 1) != 0;
        let sticky = if r2 {
            true
        } else {
            // c = 10...0 makes the sticky depend on the lower words.
            cp[n - 1] != HIGH_BIT || !is_zero(&cp[..n - 1])
        };
        Tail {
            round: true,
            sticky,
            round2: Some(r2),
            sticky2: None,
        }
    } else {
        // c sits entirely beyond the round position. Under nearest-even
        // with d == p + 1 the power-of-two correction can reach one
        // position deeper still.
        let sticky2 = if d == p as i128 + 1
            && rnd == RoundingMode::NearestTiesToEven
        {
            Some(cp[n - 1] != HIGH_BIT || !is_zero(&cp[..n - 1]))
        } else {
            None
        };
        Tail {
            round: false,
            sticky: true,
            round2: Some(d == p as i128 + 1),
            sticky2,
        }
    };

    round_sub(b.limbs().to_vec(), b.exp(), tail, sign, rnd, p, ctx)
}

/// Bit `x` of the mantissa `cp`, counting down from the most significant
/// bit (which is bit 0).
pub(crate) fn bit_at(cp: &[u64], x: usize) -> bool {
    let n = cp.len();
    let kx = n - 1 - x / u64::BITS as usize;
    let sx = 63 - (x % u64::BITS as usize);
    cp[kx] & (1u64 << sx) != 0
}

/// True if any bit strictly below bit `x` (same counting as `bit_at`) is
/// set. The padding bits are zero, so scanning into them is harmless.
pub(crate) fn any_below(cp: &[u64], x: usize) -> bool {
    let n = cp.len();
    let kx = n - 1 - x / u64::BITS as usize;
    let sx = 63 - (x % u64::BITS as usize);
    if cp[kx] & low_mask(sx) != 0 {
        return true;
    }
    !is_zero(&cp[..kx])
}

/// The shared rounding decision. `ap` holds the truncated difference with
/// `b`'s sign and exponent `bx`; the tail describes what was discarded
/// from the subtrahend. Decides truncate vs. subtract-one-ulp, applying
/// the power-of-two boundary corrections on both paths.
fn round_sub(
    mut ap: Vec<u64>,
    mut bx: i64,
    tail: Tail,
    sign: bool,
    rnd: RoundingMode,
    prec: usize,
    ctx: &mut Context,
) -> (Float, Ordering) {
    let n = ap.len();
    let sh = limb::pad_bits(prec);
    let ulp = 1u64 << sh;
    let mode = rnd.for_magnitude(sign);

    if !tail.round && !tail.sticky {
        return finish(ap, bx, sign, 0, prec, ctx);
    }

    let sub_ulp = match mode {
        // Ties break toward an even last kept bit.
        AbsRound::Nearest => {
            tail.round && (tail.sticky || ap[0] & ulp != 0)
        }
        AbsRound::Toward => tail.round || tail.sticky,
        // Truncation already rounds toward the larger magnitude.
        AbsRound::Away => false,
    };

    if sub_ulp {
        let borrow = sub_small(&mut ap, ulp);
        debug_assert!(!borrow);
        let mut inexact = -1;
        if ap[n - 1] < HIGH_BIT {
            // The truncated value was a power of two and lost its top
            // bit: shift back and fill the vacated low bit from the
            // deeper round/sticky information.
            lshift(&mut ap, 1);
            bx -= 1;
            let mut refill = tail.round && !tail.sticky;
            match mode {
                AbsRound::Toward => refill |= !tail.round,
                AbsRound::Nearest => {
                    debug_assert!(tail.round2.is_some());
                    refill |= tail.round2 == Some(false);
                }
                AbsRound::Away => {}
            }
            if refill {
                ap[0] |= ulp;
                if mode == AbsRound::Nearest {
                    inexact = 1;
                }
            }
            // With the extra bit of room the result can become exact.
            if mode == AbsRound::Toward && !tail.sticky {
                inexact = 0;
            }
        }
        return finish(ap, bx, sign, inexact, prec, ctx);
    }

    // Truncation. Whether the result is an exact power of two is only
    // knowable now, and in that case the spacing below it is twice as
    // fine: re-examine the original tail to see if the naive decision
    // under-reported.
    if ap[n - 1] == HIGH_BIT && is_zero(&ap[..n - 1]) {
        let correct = match mode {
            AbsRound::Toward => false,
            AbsRound::Away => tail.round,
            AbsRound::Nearest => {
                tail.round
                    || (tail.round2.unwrap_or(false)
                        && tail.sticky2.unwrap_or(false))
            }
        };
        if correct {
            let borrow = sub_small(&mut ap, ulp);
            debug_assert!(!borrow);
            ap[n - 1] |= HIGH_BIT;
            bx -= 1;
            let inexact = if !tail.sticky {
                0
            } else if mode == AbsRound::Nearest {
                -1
            } else {
                1
            };
            return finish(ap, bx, sign, inexact, prec, ctx);
        }
    }

    finish(ap, bx, sign, 1, prec, ctx)
}

/// Build the rounded result. `inexact` is relative to the magnitude; the
/// returned ternary is relative to the signed value.
fn finish(
    ap: Vec<u64>,
    bx: i64,
    sign: bool,
    inexact: i32,
    prec: usize,
    ctx: &mut Context,
) -> (Float, Ordering) {
    // Rounded paths stay in range: the exponent can drop at most one
    // below an operand exponent.
    debug_assert!(bx >= ctx.emin());
    if inexact != 0 {
        ctx.raise(Flags::INEXACT);
    }
    (Float::new(prec, sign, bx, ap), signed_ternary(inexact, sign))
}

/// Build an exact result, re-rounding at the bottom of the exponent range
/// if it fell out. Nearest is forced toward zero at or below half the
/// smallest representable step, because underflow otherwise rounds away
/// from zero.
fn finish_exact(
    ap: Vec<u64>,
    bx: i64,
    sign: bool,
    prec: usize,
    rnd: RoundingMode,
    ctx: &mut Context,
) -> (Float, Ordering) {
    if bx < ctx.emin() {
        let n = ap.len();
        let pow2 = ap[n - 1] == HIGH_BIT && is_zero(&ap[..n - 1]);
        let rnd = if rnd == RoundingMode::NearestTiesToEven
            && (bx < ctx.emin() - 1 || pow2)
        {
            RoundingMode::Zero
        } else {
            rnd
        };
        return ctx.underflow(prec, rnd, sign);
    }
    (Float::new(prec, sign, bx, ap), Ordering::Equal)
}

/// Map a magnitude-relative inexact code to the signed ternary.
pub(crate) fn signed_ternary(inexact: i32, negative: bool) -> Ordering {
    let v = if negative { -inexact } else { inexact };
    v.cmp(&0)
}
