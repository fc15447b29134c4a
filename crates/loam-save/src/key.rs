//! 64-bit packed world positions: x and z get 26 bits each, y gets 12.
//!
//! Bit layout (high to low): `x[63..38] | y[37..26] | z[25..0]`.

pub const XZ_BITS: u32 = 26;
pub const Y_BITS: u32 = 12;

pub const XZ_MIN: i32 = -(1 << (XZ_BITS - 1));
pub const XZ_MAX: i32 = (1 << (XZ_BITS - 1)) - 1;
pub const Y_MIN: i32 = -(1 << (Y_BITS - 1));
pub const Y_MAX: i32 = (1 << (Y_BITS - 1)) - 1;

const XZ_MASK: u64 = (1 << XZ_BITS) - 1;
const Y_MASK: u64 = (1 << Y_BITS) - 1;
const X_SHIFT: u32 = Y_BITS + XZ_BITS;
const Y_SHIFT: u32 = XZ_BITS;

#[inline]
pub fn in_range(x: i32, y: i32, z: i32) -> bool {
    (XZ_MIN..=XZ_MAX).contains(&x) && (Y_MIN..=Y_MAX).contains(&y) && (XZ_MIN..=XZ_MAX).contains(&z)
}

/// Packs a position, or `None` when a component does not fit its field.
#[inline]
pub fn pack(x: i32, y: i32, z: i32) -> Option<u64> {
    if !in_range(x, y, z) {
        return None;
    }
    Some(
        ((x as u64 & XZ_MASK) << X_SHIFT)
            | ((y as u64 & Y_MASK) << Y_SHIFT)
            | (z as u64 & XZ_MASK),
    )
}

/// Inverse of [`pack`]; sign-extends each field.
#[inline]
pub fn unpack(key: u64) -> (i32, i32, i32) {
    let x = (key as i64) >> X_SHIFT;
    let y = ((key << (64 - X_SHIFT)) as i64) >> (64 - Y_BITS);
    let z = ((key << (64 - XZ_BITS)) as i64) >> (64 - XZ_BITS);
    (x as i32, y as i32, z as i32)
}
