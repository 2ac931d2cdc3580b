/// Generates a random instance of `Self` for property-style tests.
///
/// Kept test-only since nothing in the gameplay path should depend on
/// non-deterministic construction outside of the explicit [`crate::rng::Rng`].
pub trait Arbitrary {
    fn random() -> Self;
}
