use num_traits::{Float, FromPrimitive};

/// Returns `n` evenly spaced values from `start` to `end` inclusive.
pub fn linspace<T>(start: T, end: T, n: usize) -> impl Iterator<Item = T>
where
    T: Float + FromPrimitive,
{
    let step = if n > 1 {
        (end - start) / T::from_usize(n - 1).unwrap_or_else(T::one)
    } else {
        T::zero()
    };
    (0..n).map(move |i| {
        let i = T::from_usize(i).unwrap_or_else(T::zero);
        start + i * step
    })
}

/// Wraps `degrees` into `[0, 360)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Angle in degrees above the horizontal of a point `rise` units
/// higher and `run` units away.
pub fn elevation_angle(rise: f64, run: f64) -> f64 {
    rise.atan2(run).to_degrees()
}
