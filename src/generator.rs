//! The recursive tree walk.

use log::{debug, trace};

use crate::node::{Class, Node};
use crate::source::RandomSource;
use crate::Error;

/// The default number of extra repetitions `x*`, `x+` and `x{n,}` may produce.
pub const DEFAULT_MAX_REPEAT: u32 = 32;

/// Whether generation may continue after a node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub enum Flow {
    /// The node was generated; siblings should follow.
    Continue,
    /// An end-of-text anchor was reached. Nothing more should be written, but
    /// the output so far is still a valid result.
    Stopped,
}

impl Flow {
    /// Checks whether generation was stopped by an end-of-text anchor.
    pub const fn is_stopped(self) -> bool {
        matches!(self, Self::Stopped)
    }
}

/// Walks a [`Node`] tree, appending a random string matching it to a buffer.
///
/// The only setting is the cap on unbounded repetitions.
///
/// # Examples
///
/// ```
/// use rand_regen::{Fixed, Flow, Generator, Node};
///
/// let node = Node::parse("a+")?;
/// let mut sink = Vec::new();
///
/// // `a+` repeats between 1 and 1+3 times, the draw 3 picks the maximum
/// let flow = Generator::with_max_repeat(3).generate(&node, &mut sink, &mut Fixed(3))?;
/// assert_eq!(flow, Flow::Continue);
/// assert_eq!(sink, b"aaaa");
/// # Ok::<(), rand_regen::Error>(())
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Generator {
    max_repeat: u32,
}

impl Default for Generator {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Generator {
    /// Creates a generator capping unbounded repetitions at
    /// [`DEFAULT_MAX_REPEAT`].
    pub const fn new() -> Self {
        Self::with_max_repeat(DEFAULT_MAX_REPEAT)
    }

    /// Creates a generator where `x*` produces at most `max_repeat` copies of
    /// `x`, and `x+` and `x{n,}` produce at most `max_repeat` copies more
    /// than their minimum.
    pub const fn with_max_repeat(max_repeat: u32) -> Self {
        Self { max_repeat }
    }

    /// Returns the cap on unbounded repetitions.
    pub const fn max_repeat(&self) -> u32 {
        self.max_repeat
    }

    /// Appends a random string matching `node` to `sink`.
    ///
    /// Returns [`Flow::Stopped`] if an end-of-text anchor cut the generation
    /// short. The content of `sink` is the result in both cases.
    ///
    /// # Errors
    ///
    /// - [`Error::WordBoundary`] if the tree contains `\b` or `\B`.
    /// - [`Error::Invariant`] if the tree is malformed: an empty class, an
    ///   alternation without branches or a repetition with `max < min`.
    /// - [`Error::RandomOutOfRange`] if `rng` returned a value outside the
    ///   requested range.
    ///
    /// The content of `sink` is unspecified after an error.
    pub fn generate<R: RandomSource + ?Sized>(
        &self,
        node: &Node,
        sink: &mut Vec<u8>,
        rng: &mut R,
    ) -> Result<Flow, Error> {
        match node {
            Node::NoMatch | Node::EmptyMatch | Node::BeginText => {}
            Node::Literal(lit) => sink.extend_from_slice(lit),
            Node::Class(class) => push_class_member(class, sink, rng)?,
            Node::AnyCharNotNl => {
                let i = draw(rng, 95)?;
                sink.push(b' ' + i as u8);
            }
            Node::AnyChar => {
                let i = draw(rng, 96)?;
                sink.push(if i == 95 { b'\n' } else { b' ' + i as u8 });
            }
            Node::BeginLine => {
                if !sink.is_empty() {
                    sink.push(b'\n');
                }
            }
            Node::EndLine => {
                if sink.is_empty() {
                    trace!("end of line on empty output, stopping");
                    return Ok(Flow::Stopped);
                }
                sink.push(b'\n');
            }
            Node::EndText => {
                trace!("end of text after {} bytes, stopping", sink.len());
                return Ok(Flow::Stopped);
            }
            Node::WordBoundary | Node::NoWordBoundary => {
                debug!("cannot generate {:?}", node);
                return Err(Error::WordBoundary);
            }
            Node::Star(subs) => {
                return self.repeat(0, u64::from(self.max_repeat), subs, sink, rng);
            }
            Node::Plus(subs) => {
                return self.repeat(1, 1 + u64::from(self.max_repeat), subs, sink, rng);
            }
            Node::Repeat { min, max, subs } => {
                let min = u64::from(*min);
                let max = max.map_or(min + u64::from(self.max_repeat), u64::from);
                return self.repeat(min, max, subs, sink, rng);
            }
            Node::Quest(subs) => {
                if draw(rng, 0xffff_ffff)? > 0x7fff_ffff {
                    return self.sequence(subs, sink, rng);
                }
            }
            Node::Concat(subs) | Node::Capture(subs) => return self.sequence(subs, sink, rng),
            Node::Alternate(subs) => {
                if subs.is_empty() {
                    debug!("alternation without branches");
                    return Err(Error::Invariant("alternation has no branches"));
                }
                let nth = draw(rng, subs.len() as u64)?;
                return self.generate(&subs[nth as usize], sink, rng);
            }
        }
        Ok(Flow::Continue)
    }

    /// Generates `subs` in order, stopping at the first `Stopped`.
    fn sequence<R: RandomSource + ?Sized>(
        &self,
        subs: &[Node],
        sink: &mut Vec<u8>,
        rng: &mut R,
    ) -> Result<Flow, Error> {
        for sub in subs {
            if self.generate(sub, sink, rng)?.is_stopped() {
                return Ok(Flow::Stopped);
            }
        }
        Ok(Flow::Continue)
    }

    fn repeat<R: RandomSource + ?Sized>(
        &self,
        min: u64,
        max: u64,
        subs: &[Node],
        sink: &mut Vec<u8>,
        rng: &mut R,
    ) -> Result<Flow, Error> {
        if max < min {
            debug!("repetition {{{},{}}} is reversed", min, max);
            return Err(Error::Invariant("repetition maximum is below its minimum"));
        }
        let count = min + draw(rng, max - min + 1)?;
        for _ in 0..count {
            if self.sequence(subs, sink, rng)?.is_stopped() {
                return Ok(Flow::Stopped);
            }
        }
        Ok(Flow::Continue)
    }
}

/// Appends a random string matching `node` to `sink`, using a [`Generator`]
/// with the default settings.
///
/// # Errors
///
/// See [`Generator::generate()`].
pub fn generate<R: RandomSource + ?Sized>(
    node: &Node,
    sink: &mut Vec<u8>,
    rng: &mut R,
) -> Result<Flow, Error> {
    Generator::new().generate(node, sink, rng)
}

fn draw<R: RandomSource + ?Sized>(rng: &mut R, bound: u64) -> Result<u64, Error> {
    let value = rng.below(bound);
    if value < bound {
        Ok(value)
    } else {
        debug!("random source returned {} for bound {}", value, bound);
        Err(Error::RandomOutOfRange { bound, value })
    }
}

/// Picks a member uniformly: every code point weighs the same, whatever the
/// size of the range holding it.
fn push_class_member<R: RandomSource + ?Sized>(
    class: &Class,
    sink: &mut Vec<u8>,
    rng: &mut R,
) -> Result<(), Error> {
    if class.is_empty() {
        debug!("sampling from an empty class");
        return Err(Error::Invariant("character class is empty"));
    }

    let mut nth = draw(rng, class.len())?;
    for &(low, high) in class.ranges() {
        let delta = u64::from(high - low);
        if nth <= delta {
            let code = low + nth as u32;
            if class.is_bytes() {
                let byte = u8::try_from(code)
                    .map_err(|_| Error::Invariant("byte class member exceeds 0xff"))?;
                sink.push(byte);
            } else {
                let c = char::from_u32(code)
                    .ok_or(Error::Invariant("class member is not a Unicode scalar value"))?;
                let mut buf = [0_u8; 4];
                sink.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
            return Ok(());
        }
        nth -= 1 + delta;
    }

    debug!("draw fell outside every range of {:?}", class);
    Err(Error::Invariant("class sample fell outside every range"))
}
