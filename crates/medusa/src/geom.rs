//! Geometry primitives, backed by `euclid`.

pub type Unit = euclid::UnknownUnit;

pub type Vector = euclid::Vector2D<f64, Unit>;

pub fn vector(x: f64, y: f64) -> Vector {
    euclid::vec2(x, y)
}

/// Unit vector along `v`, or the zero vector when `v` has no direction. Degenerate
/// displacements must yield zero force, never NaN.
pub fn normalize_or_zero(v: Vector) -> Vector {
    let len = v.length();
    if len > 0.0 { v / len } else { Vector::zero() }
}
