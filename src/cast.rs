//! Conversions between `Float` and the native `f64`, plus the mixed-type
//! convenience entry points. A double always embeds exactly into a value
//! of precision >= 53, so the wrappers materialize the foreign operand at
//! the shared precision and delegate to the core kernels.

extern crate alloc;

use core::cmp::Ordering;

use super::context::Context;
use super::float::{Category, Float, RoundingMode};
use super::limb::{self, low_mask};

const F64_EXP_BITS: u64 = 11;
const F64_MANT_BITS: u64 = 52;
const F64_BIAS: i64 = 1023;

impl Float {
    /// Materialize a double exactly. The target precision must be able to
    /// hold all 53 significand bits.
    pub fn from_f64(val: f64, prec: usize) -> Self {
        assert!(prec >= 53, "a double needs at least 53 bits");
        let bits = val.to_bits();
        let sign = bits >> 63 == 1;
        let biased = (bits >> F64_MANT_BITS) & low_mask(F64_EXP_BITS as usize);
        let frac = bits & low_mask(F64_MANT_BITS as usize);

        if biased == low_mask(F64_EXP_BITS as usize) {
            return if frac == 0 {
                Float::inf(prec, sign)
            } else {
                Float::nan(prec, sign)
            };
        }
        if biased == 0 && frac == 0 {
            return Float::zero(prec, sign);
        }

        // value = mant * 2^e2, with the implicit bit restored for normal
        // numbers. Denormals simply carry a shorter mantissa.
        let (mant, e2) = if biased != 0 {
            (
                frac | (1u64 << F64_MANT_BITS),
                biased as i64 - F64_BIAS - F64_MANT_BITS as i64,
            )
        } else {
            (frac, 1 - F64_BIAS - F64_MANT_BITS as i64)
        };

        let lz = mant.leading_zeros() as usize;
        let msb = u64::BITS as usize - lz;
        let n = limb::limbs_for(prec);
        let mut limbs = vec![0u64; n];
        limbs[n - 1] = mant << lz;
        Float::new(prec, sign, msb as i64 + e2, limbs)
    }

    /// Read the value back as a double. The precision must not exceed 53
    /// bits, so the mantissa always fits; the exponent must land in the
    /// double's normal range.
    pub fn as_f64(&self) -> f64 {
        match self.category() {
            Category::Zero => {
                return if self.sign() { -0.0 } else { 0.0 };
            }
            Category::Infinity => {
                return if self.sign() {
                    f64::NEG_INFINITY
                } else {
                    f64::INFINITY
                };
            }
            Category::NaN => return f64::NAN,
            Category::Normal => {}
        }
        let p = self.prec();
        assert!(p <= 53, "mantissa does not fit a double");
        let m = self.limbs()[0] >> (u64::BITS as usize - p);
        let m53 = m << (53 - p);
        let e = self.exp() - 1;
        assert!(
            (-(F64_BIAS - 1)..=F64_BIAS).contains(&e),
            "exponent out of the double's normal range"
        );
        let bits = ((self.sign() as u64) << 63)
            | (((e + F64_BIAS) as u64) << F64_MANT_BITS)
            | (m53 & low_mask(F64_MANT_BITS as usize));
        f64::from_bits(bits)
    }

    /// Subtract a native double. The double is materialized exactly at
    /// this value's precision (which must be >= 53 bits), the core kernel
    /// does the work, and only its exceptions reach the caller's flags.
    pub fn sub_f64(
        &self,
        rhs: f64,
        rnd: RoundingMode,
        ctx: &mut Context,
    ) -> (Float, Ordering) {
        let saved = ctx.flags();
        let d = Float::from_f64(rhs, self.prec());
        ctx.set_flags(saved);
        let (r, t) = self.sub_with_rm(&d, rnd, ctx);
        debug_assert!(
            !r.is_normal()
                || (ctx.emin()..=ctx.emax()).contains(&r.exp())
        );
        (r, t)
    }

    /// Add a native double; same reduction as [`Float::sub_f64`].
    pub fn add_f64(
        &self,
        rhs: f64,
        rnd: RoundingMode,
        ctx: &mut Context,
    ) -> (Float, Ordering) {
        let saved = ctx.flags();
        let d = Float::from_f64(rhs, self.prec());
        ctx.set_flags(saved);
        let (r, t) = self.add_with_rm(&d, rnd, ctx);
        debug_assert!(
            !r.is_normal()
                || (ctx.emin()..=ctx.emax()).contains(&r.exp())
        );
        (r, t)
    }
}
