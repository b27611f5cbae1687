//! Addition and the public signed entry points. A sum of same-sign
//! magnitudes has its own small kernel; everything else reduces to the
//! subtraction kernel by sign manipulation.

extern crate alloc;

use core::cmp::Ordering;

use super::context::{Context, Flags};
use super::float::{AbsRound, Category, Float, RoundingMode};
use super::limb::{self, add_assign, add_small, low_mask, rshift1, HIGH_BIT};
use super::sub::{signed_ternary, sub_normals};

impl Float {
    /// Computes `self + rhs` under the rounding mode `rnd`, accumulating
    /// exception flags in `ctx`. Returns the rounded sum and the ternary
    /// code: the sign of (returned value - exact value).
    pub fn add_with_rm(
        &self,
        rhs: &Self,
        rnd: RoundingMode,
        ctx: &mut Context,
    ) -> (Float, Ordering) {
        Self::add_sub(self, rhs, false, rnd, ctx)
    }

    /// Computes `self - rhs` under the rounding mode `rnd`, accumulating
    /// exception flags in `ctx`.
    pub fn sub_with_rm(
        &self,
        rhs: &Self,
        rnd: RoundingMode,
        ctx: &mut Context,
    ) -> (Float, Ordering) {
        Self::add_sub(self, rhs, true, rnd, ctx)
    }

    fn add_sub(
        a: &Self,
        b: &Self,
        subtract: bool,
        rnd: RoundingMode,
        ctx: &mut Context,
    ) -> (Float, Ordering) {
        assert_eq!(
            a.prec(),
            b.prec(),
            "operands must share one precision"
        );
        let p = a.prec();
        // The sign `b` contributes after the subtract flip.
        let bsign = b.sign() ^ subtract;
        let exact = Ordering::Equal;

        match (a.category(), b.category()) {
            (Category::NaN, _) => (Float::nan(p, a.sign()), exact),
            (_, Category::NaN) => (Float::nan(p, bsign), exact),

            (Category::Infinity, Category::Infinity) => {
                if a.sign() != bsign {
                    (Float::nan(p, a.sign()), exact)
                } else {
                    (Float::inf(p, a.sign()), exact)
                }
            }
            (Category::Infinity, _) => (a.clone(), exact),
            (_, Category::Infinity) => (Float::inf(p, bsign), exact),

            (Category::Zero, Category::Zero) => {
                // Opposite-sign zeros cancel to +0, except toward
                // -infinity.
                let sign = if a.sign() == bsign {
                    a.sign()
                } else {
                    rnd == RoundingMode::Negative
                };
                (Float::zero(p, sign), exact)
            }
            (Category::Normal, Category::Zero) => (a.clone(), exact),
            (Category::Zero, Category::Normal) => {
                let r = if bsign != b.sign() { b.neg() } else { b.clone() };
                (r, exact)
            }

            (Category::Normal, Category::Normal) => {
                if a.sign() == bsign {
                    add_normals(a, b, a.sign(), rnd, ctx)
                } else {
                    // a + (-|b|) with a's sign is a magnitude difference.
                    sub_normals(a, b, rnd, ctx)
                }
            }
        }
    }
}

/// Sum of the magnitudes of two normal same-precision values, carrying
/// `sign`. The discarded tail of the smaller operand reduces to a
/// round/sticky pair just like in the subtraction kernel, but the sum can
/// also gain a leading bit, which pushes the old round bit into the
/// sticky.
fn add_normals(
    a: &Float,
    b: &Float,
    sign: bool,
    rnd: RoundingMode,
    ctx: &mut Context,
) -> (Float, Ordering) {
    let (b, c) = if a.exp() < b.exp() { (b, a) } else { (a, b) };
    let p = b.prec();
    let n = b.limbs().len();
    let sh = limb::pad_bits(p);
    let bp = b.limbs();
    let cp = c.limbs();
    let mut bx = b.exp();
    let d = (bx as i128) - (c.exp() as i128);

    let mut ap;
    let mut round;
    let mut sticky;
    if d == 0 {
        // Both mantissas carry their top bit: the sum always overflows
        // into one extra bit.
        ap = bp.to_vec();
        let carry = add_assign(&mut ap, cp);
        debug_assert!(carry);
        round = ap[0] & (1u64 << sh) != 0;
        sticky = false;
        rshift1(&mut ap);
        ap[n - 1] |= HIGH_BIT;
        ap[0] &= !low_mask(sh);
        bx += 1;
    } else if d >= p as i128 {
        // c sits at or below the round position; its leading bit lands
        // exactly on it iff d == p.
        ap = bp.to_vec();
        round = d == p as i128;
        sticky = if d == p as i128 {
            !c.is_power_of_two()
        } else {
            true
        };
    } else {
        let d = d as usize;
        let mut cc = vec![0u64; n];
        limb::rshift_into(&mut cc, cp, d);
        round = super::sub::bit_at(cp, p - d);
        sticky = super::sub::any_below(cp, p - d);
        cc[0] &= !low_mask(sh);
        ap = bp.to_vec();
        let carry = add_assign(&mut ap, &cc);
        if carry {
            // The sum gained a bit: renormalize, demoting the old round
            // bit into the sticky.
            let new_round = ap[0] & (1u64 << sh) != 0;
            rshift1(&mut ap);
            ap[n - 1] |= HIGH_BIT;
            ap[0] &= !low_mask(sh);
            sticky |= round;
            round = new_round;
            bx += 1;
        }
    }

    let mode = rnd.for_magnitude(sign);
    let odd = ap[0] & (1u64 << sh) != 0;
    let increment = match mode {
        AbsRound::Nearest => round && (sticky || odd),
        AbsRound::Toward => false,
        AbsRound::Away => round || sticky,
    };
    let inexact = if !round && !sticky {
        0
    } else if increment {
        1
    } else {
        -1
    };
    if increment {
        let carry = add_small(&mut ap, 1u64 << sh);
        if carry {
            // The mantissa was all ones; the incremented sum is the next
            // power of two.
            ap[n - 1] = HIGH_BIT;
            bx += 1;
        }
    }

    if bx > ctx.emax() {
        return ctx.overflow(p, rnd, sign);
    }
    if inexact != 0 {
        ctx.raise(Flags::INEXACT);
    }
    (Float::new(p, sign, bx, ap), signed_ternary(inexact, sign))
}
