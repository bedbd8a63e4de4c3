use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
///
/// Every quantity of oil or product in the engine is a `Fixed64`. Addition
/// and subtraction are exact, which is what keeps the conservation ledger
/// balanced to the last bit.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of simulation time (one simulated day).
pub type Ticks = u64;

/// Convert an f64 to Fixed64. Use only for initialization, never in sim loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display, never in sim loop.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Clamp negative amounts to zero.
#[inline]
pub fn non_negative(v: Fixed64) -> Fixed64 {
    v.max(Fixed64::ZERO)
}

/// Whether `a` and `b` differ by less than `epsilon`.
#[inline]
pub fn within(a: Fixed64, b: Fixed64, epsilon: Fixed64) -> bool {
    (a - b).abs() < epsilon
}
