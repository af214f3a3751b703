//! Sources of randomness consumed by the generator.

use rand::Rng;

/// A uniform integer source.
///
/// Every nondeterministic choice the generator makes (repetition counts,
/// alternation branches, class members) is a single call to
/// [`below()`](RandomSource::below). The generator verifies each draw against
/// its bound, so a misbehaving source surfaces as
/// [`Error::RandomOutOfRange`](crate::Error::RandomOutOfRange) instead of a
/// wrong sample.
///
/// Closures of type `FnMut(u64) -> u64` implement this trait directly:
///
/// ```
/// use rand_regen::{generate, Node};
///
/// let node = Node::parse("[a-z]{3}")?;
/// let mut sink = Vec::new();
/// generate(&node, &mut sink, &mut |n: u64| n - 1)?;
/// assert_eq!(sink, b"zzz");
/// # Ok::<(), rand_regen::Error>(())
/// ```
pub trait RandomSource {
    /// Returns an integer uniformly distributed over `[0, n)`.
    ///
    /// The generator never calls this with `n == 0`.
    fn below(&mut self, n: u64) -> u64;
}

impl<F: FnMut(u64) -> u64> RandomSource for F {
    #[inline]
    fn below(&mut self, n: u64) -> u64 {
        self(n)
    }
}

/// Adapts any [`rand::Rng`] into a [`RandomSource`].
///
/// Wrapping `&mut R` works as well as wrapping an owned generator.
///
/// ```
/// use rand::SeedableRng;
/// use rand_regen::RandomSource;
///
/// let mut rng = rand_regen::RngSource(rand_xorshift::XorShiftRng::seed_from_u64(0));
/// assert!(rng.below(6) < 6);
/// ```
#[derive(Clone, Debug)]
pub struct RngSource<R>(pub R);

impl<R: Rng> RandomSource for RngSource<R> {
    #[inline]
    fn below(&mut self, n: u64) -> u64 {
        self.0.random_range(0..n)
    }
}

/// A source which returns the same value for every draw.
///
/// Useful for reproducing a particular path through a tree. Draws which are
/// not below the requested bound are rejected by the generator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Fixed(pub u64);

impl RandomSource for Fixed {
    #[inline]
    fn below(&mut self, _: u64) -> u64 {
        self.0
    }
}
