//! Resolution schedule: maps a copy generation onto a sawtooth scale factor.
//!
//! Resolution drops linearly by [`STEP_SIZE`] per generation, then snaps back
//! to full resolution and starts over. One sweep from full resolution to the
//! last step is a cycle of [`CYCLE_LENGTH`] generations.

use super::DegradeError;

/// Lower bound on the resolution scale.
pub const MIN_RESOLUTION: f64 = 0.001;

/// Resolution lost per generation within a cycle.
pub const STEP_SIZE: f64 = 0.01;

/// `floor((1 - MIN_RESOLUTION) / STEP_SIZE)`.
pub const CYCLE_LENGTH: u64 = 99;

/// Ordinal of a copy. Generation 0 is the pristine original.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub const ORIGINAL: Generation = Generation(0);

    pub const fn new(n: u64) -> Self {
        Generation(n)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub const fn is_original(self) -> bool {
        self.0 == 0
    }

    pub const fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for Generation {
    type Error = DegradeError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u64::try_from(value)
            .map(Generation)
            .map_err(|_| DegradeError::InvalidGeneration(value as f64))
    }
}

impl TryFrom<f64> for Generation {
    type Error = DegradeError;

    /// Accepts only finite, non-negative, integral values.
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > u64::MAX as f64 {
            return Err(DegradeError::InvalidGeneration(value));
        }
        Ok(Generation(value as u64))
    }
}

/// 1-based position of `generation` within its cycle.
pub fn cycle_position(generation: Generation) -> Result<u64, DegradeError> {
    if generation.is_original() {
        return Err(DegradeError::ReservedGeneration);
    }
    Ok(((generation.0 - 1) % CYCLE_LENGTH) + 1)
}

/// Resolution scale factor for a degraded copy, in `[MIN_RESOLUTION, 1.0]`.
///
/// # Errors
///
/// [`DegradeError::ReservedGeneration`] for generation 0, which never goes
/// through the engine.
pub fn resolution_scale(generation: Generation) -> Result<f64, DegradeError> {
    let position = cycle_position(generation)?;
    let scale = 1.0 - (position - 1) as f64 * STEP_SIZE;
    Ok(scale.max(MIN_RESOLUTION))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scale(n: u64) -> f64 {
        resolution_scale(Generation::new(n)).unwrap()
    }

    #[test]
    fn cycle_length_matches_formula() {
        let derived = ((1.0 - MIN_RESOLUTION) / STEP_SIZE).floor() as u64;
        assert_eq!(derived, CYCLE_LENGTH);
    }

    #[test]
    fn first_generation_is_full_resolution() {
        assert!((scale(1) - 1.0).abs() < 1e-12);
        assert!((scale(2) - 0.99).abs() < 1e-12);
    }

    #[test]
    fn scale_is_periodic() {
        for n in 1..=300 {
            assert_eq!(scale(n), scale(n + CYCLE_LENGTH), "generation {n}");
        }
        assert_eq!(scale(1), scale(100));
    }

    #[test]
    fn scale_falls_within_a_cycle_and_resets_at_the_boundary() {
        for n in 1..CYCLE_LENGTH {
            assert!(scale(n + 1) <= scale(n), "generation {n}");
        }
        let last = scale(CYCLE_LENGTH);
        assert!(last >= MIN_RESOLUTION);
        assert!((last - 0.02).abs() < 1e-9);
        assert!(scale(CYCLE_LENGTH + 1) > last);
    }

    #[test]
    fn generation_zero_is_reserved() {
        assert_eq!(
            resolution_scale(Generation::ORIGINAL),
            Err(DegradeError::ReservedGeneration)
        );
    }

    #[test]
    fn conversions_reject_non_positive_and_fractional_input() {
        assert!(Generation::try_from(-1_i64).is_err());
        assert!(Generation::try_from(1.5_f64).is_err());
        assert!(Generation::try_from(f64::NAN).is_err());
        assert!(Generation::try_from(-3.0_f64).is_err());
        assert_eq!(Generation::try_from(7.0_f64), Ok(Generation::new(7)));
        assert_eq!(Generation::try_from(7_i64), Ok(Generation::new(7)));
    }
}
