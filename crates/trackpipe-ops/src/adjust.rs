//! Raw-position mappings for [`ParamSpec::adjust`](trackpipe::ParamSpec::adjust).

/// Round even positions up to the next odd number.
///
/// Kernel sizes must be odd.
#[must_use]
pub fn make_odd(x: i32) -> f64 {
    if x % 2 == 0 {
        f64::from(x) + 1.0
    } else {
        f64::from(x)
    }
}

/// Multiply the raw position by `factor`.
pub fn scale(factor: f64) -> impl Fn(i32) -> f64 + Send + Sync + 'static {
    move |x| f64::from(x) * factor
}

/// Map `0..=90` onto a full turn, in radians.
#[must_use]
pub fn quarter_steps_to_radians(x: i32) -> f64 {
    (f64::from(x) / 90.0 * 360.0).to_radians()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_odd_keeps_odd_and_bumps_even() {
        assert!((make_odd(0) - 1.0).abs() < f64::EPSILON);
        assert!((make_odd(3) - 3.0).abs() < f64::EPSILON);
        assert!((make_odd(10) - 11.0).abs() < f64::EPSILON);
    }

    #[test]
    fn scale_multiplies() {
        let tenth = scale(0.1);
        assert!((tenth(25) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn ninety_is_a_full_turn() {
        assert!(quarter_steps_to_radians(0).abs() < f64::EPSILON);
        assert!((quarter_steps_to_radians(45) - std::f64::consts::PI).abs() < 1e-12);
        assert!((quarter_steps_to_radians(90) - std::f64::consts::TAU).abs() < 1e-12);
    }
}
