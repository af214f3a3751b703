#![warn(missing_docs, clippy::pedantic)]

//! Generates strings and byte strings by walking the syntax tree of a regular
//! expression.
//!
//! Generation is best-effort: anchors are approximated, `.` only produces
//! printable ASCII, and unbounded repetitions are capped. Every random choice
//! is delegated to a [`RandomSource`], so the output is a pure function of the
//! tree and the sequence of draws.
//!
//! ```
//! use rand_regen::{Fixed, Flow, Generator, Node};
//!
//! let node = Node::parse(r"#-[[:digit:]]{2,5}")?;
//! let mut sink = Vec::new();
//!
//! // the constant draw 2 picks 2+2 repetitions of the digit '0'+2
//! let flow = Generator::default().generate(&node, &mut sink, &mut Fixed(2))?;
//! assert_eq!(flow, Flow::Continue);
//! assert_eq!(sink, b"#-2222");
//!
//! // `$` stops the generation, which callers can tell from a normal completion
//! let node = Node::parse(r"^hello$")?;
//! let mut sink = Vec::new();
//! let flow = Generator::default().generate(&node, &mut sink, &mut Fixed(0))?;
//! assert_eq!(flow, Flow::Stopped);
//! assert_eq!(sink, b"hello");
//! # Ok::<(), rand_regen::Error>(())
//! ```
//!
//! A compiled [`Regex`] is also a [`rand::distr::Distribution`]:
//!
//! ```
//! use rand::{Rng, SeedableRng};
//!
//! let mut rng = rand_xorshift::XorShiftRng::seed_from_u64(7);
//! let gen = rand_regen::Regex::compile(r"[a-f]{4}-[0-9]{2}", 32).unwrap();
//! let filter = regex::Regex::new(r"^[a-f]{4}-[0-9]{2}$").unwrap();
//! for sample in (&mut rng).sample_iter::<String, _>(&gen).take(8) {
//!     assert!(filter.is_match(&sample));
//! }
//! ```

#![allow(clippy::must_use_candidate)]

use log::debug;
use rand::distr::Distribution;
use rand::Rng;
use regex_syntax::hir::Hir;
use regex_syntax::Parser;
use std::str::Utf8Error;
use std::string::FromUtf8Error;

mod generator;
mod node;
mod source;

pub use generator::{generate, Flow, Generator, DEFAULT_MAX_REPEAT};
pub use node::{Class, Node};
pub use source::{Fixed, RandomSource, RngSource};

/// Error returned when parsing a pattern or generating a string fails.
///
/// None of these errors is recoverable by retrying with another random
/// source. Reaching the end of the text is not an error, see [`Flow`].
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The input regex has a syntax error.
    ///
    /// # Examples
    ///
    /// ```
    /// let gen = rand_regen::Regex::compile(r"(", 100);
    /// assert!(matches!(gen, Err(rand_regen::Error::Syntax(_))));
    /// ```
    #[error("{0}")]
    Syntax(#[from] regex_syntax::Error),

    /// Word boundary assertions (`\b`, `\B`) are not supported.
    ///
    /// # Examples
    ///
    /// ```
    /// let gen = rand_regen::Regex::compile(r"^.{4}\b.{4}$", 100);
    /// assert_eq!(gen.err(), Some(rand_regen::Error::WordBoundary));
    /// ```
    #[error("word boundary assertions are not supported")]
    WordBoundary,

    /// The syntax tree breaks one of its invariants, e.g. an empty class
    /// sampled directly or an alternation without branches.
    #[error("malformed syntax tree: {0}")]
    Invariant(&'static str),

    /// The [`RandomSource`] returned a value not below the requested bound.
    #[error("random source returned {value}, expected a value below {bound}")]
    RandomOutOfRange {
        /// The exclusive upper bound requested.
        bound: u64,
        /// The value returned.
        value: u64,
    },
}

/// A generated string together with how the generation ended.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Sample {
    bytes: Vec<u8>,
    flow: Flow,
}

impl Sample {
    /// Obtains the raw bytes of this sample.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Tries to view this sample as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// If the bytes are not valid UTF-8, returns an error in the same manner
    /// as [`std::str::from_utf8()`].
    pub fn as_str(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(&self.bytes)
    }

    /// Returns how the generation ended.
    pub const fn flow(&self) -> Flow {
        self.flow
    }

    /// Checks whether an end-of-text anchor cut the generation short.
    pub const fn is_stopped(&self) -> bool {
        self.flow.is_stopped()
    }

    /// Converts this sample into its raw bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Tries to convert this sample into a UTF-8 string.
    ///
    /// # Errors
    ///
    /// If the bytes are not valid UTF-8, returns an error in the same manner
    /// as [`String::from_utf8()`].
    pub fn into_string(self) -> Result<String, FromUtf8Error> {
        String::from_utf8(self.bytes)
    }
}

impl From<Sample> for Vec<u8> {
    fn from(sample: Sample) -> Self {
        sample.bytes
    }
}

impl TryFrom<Sample> for String {
    type Error = FromUtf8Error;
    fn try_from(sample: Sample) -> Result<Self, Self::Error> {
        sample.into_string()
    }
}

/// A syntax tree ready for sampling, together with its [`Generator`].
///
/// Compilation rejects word boundary assertions, so sampling only fails on
/// hand-built malformed trees.
#[derive(Clone, Debug, Default)]
pub struct Regex {
    root: Node,
    generator: Generator,
}

impl Distribution<Vec<u8>> for Regex {
    /// Samples a random byte string for the regex.
    ///
    /// # Panics
    ///
    /// If the tree passed to [`Regex::with_node()`] is malformed.
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<u8> {
        match self.generate(&mut RngSource(rng)) {
            Ok(sample) => sample.into_bytes(),
            Err(e) => panic!("cannot sample {:?}: {}", self.root, e),
        }
    }
}

impl Distribution<String> for Regex {
    /// Samples a random string for the regex.
    ///
    /// # Panics
    ///
    /// If the regex produced some non-UTF-8 byte sequence, this method will
    /// panic. Sample a `Result<String, FromUtf8Error>` to handle the error
    /// manually.
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        <Self as Distribution<Result<_, _>>>::sample(self, rng)
            .expect("sampled bytes are not valid UTF-8")
    }
}

impl Distribution<Result<String, FromUtf8Error>> for Regex {
    /// Samples a random string for the regex.
    ///
    /// If the sampled bytes sequence is not valid UTF-8, the sampling result
    /// is an Err value.
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<String, FromUtf8Error> {
        String::from_utf8(<Self as Distribution<Vec<u8>>>::sample(self, rng))
    }
}

impl Regex {
    /// Compiles a regex pattern for string generation.
    ///
    /// If you need to supply additional flags to the pattern, please use
    /// [`Regex::with_hir()`] instead.
    ///
    /// The `max_repeat` parameter gives the maximum extra repeat counts
    /// the `x*`, `x+` and `x{n,}` operators will become, e.g.
    ///
    /// ```
    /// use rand::Rng;
    ///
    /// let gen = rand_regen::Regex::compile("a{4,}", 10).unwrap();
    /// // this will generate a string between 4 to 14 characters long.
    /// let sample: String = rand::rng().sample(&gen);
    /// assert!((4..=14).contains(&sample.len()));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is not valid regex, or contains word
    /// boundary assertions (`\b`, `\B`).
    pub fn compile(pattern: &str, max_repeat: u32) -> Result<Self, Error> {
        let hir = Parser::new().parse(pattern)?;
        Self::with_hir(&hir, max_repeat)
    }

    /// Compiles a parsed regex pattern for string generation.
    ///
    /// The [`Hir`] object can be obtained using [`regex_syntax::ParserBuilder`].
    ///
    /// # Errors
    ///
    /// Returns an error if the `Hir` object contains word boundary assertions
    /// (`\b`, `\B`).
    pub fn with_hir(hir: &Hir, max_repeat: u32) -> Result<Self, Error> {
        Self::with_node(Node::from_hir(hir), max_repeat)
    }

    /// Wraps a syntax tree for string generation.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree contains word boundary assertions.
    pub fn with_node(root: Node, max_repeat: u32) -> Result<Self, Error> {
        if root.contains_word_boundary() {
            debug!("rejecting tree with word boundary: {:?}", root);
            return Err(Error::WordBoundary);
        }
        debug!("compiled {:?} with max_repeat {}", root, max_repeat);
        Ok(Self {
            root,
            generator: Generator::with_max_repeat(max_repeat),
        })
    }

    /// Returns the syntax tree being sampled.
    pub const fn root(&self) -> &Node {
        &self.root
    }

    /// Returns the cap on unbounded repetitions.
    pub const fn max_repeat(&self) -> u32 {
        self.generator.max_repeat()
    }

    /// Generates one sample using `rng`.
    ///
    /// # Errors
    ///
    /// See [`Generator::generate()`]. Word boundaries were rejected at
    /// construction, so only malformed trees and misbehaving sources fail.
    pub fn generate<R: RandomSource + ?Sized>(&self, rng: &mut R) -> Result<Sample, Error> {
        let mut bytes = Vec::new();
        let flow = self.generator.generate(&self.root, &mut bytes, rng)?;
        Ok(Sample { bytes, flow })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;
    use std::collections::HashSet;
    use std::ops::RangeInclusive;

    fn check_str(pattern: &str, distinct_count: RangeInclusive<usize>, run_count: usize) {
        let r = regex::Regex::new(&format!("^(?:{})$", pattern)).unwrap();
        let gen = Regex::compile(pattern, 100).unwrap();

        let mut rng = RngSource(rand::rng());

        let mut gen_set = HashSet::<String>::with_capacity(run_count.min(*distinct_count.end()));
        for _ in 0..run_count {
            let sample = gen.generate(&mut rng).unwrap();
            assert!(!sample.is_stopped(), "Pattern `{}` stopped early", pattern);
            let res = String::try_from(sample).unwrap();
            assert!(
                r.is_match(&res),
                "Wrong sample for pattern `{}`: `{}`",
                pattern,
                res
            );
            gen_set.insert(res);
        }
        let gen_count = gen_set.len();
        assert!(
            *distinct_count.start() <= gen_count && gen_count <= *distinct_count.end(),
            "Distinct samples generated for pattern `{}` outside the range {:?}: {} (examples:\n{})",
            pattern,
            distinct_count,
            gen_count,
            gen_set.iter().take(10).map(|s| format!(" - {:#?}\n", s)).collect::<String>(),
        );
    }

    fn run_count_for_distinct_count(distinct_count: usize) -> usize {
        // Suppose a regex can possibly generate N distinct strings uniformly. The probability
        // that some string is still missing after M runs is at most N * (1 - 1/N)^M. We pick M
        // so that this stays below 10^(-6):
        //
        //  M > (ln N + 6 ln 10) / (ln N - ln (N-1))
        if distinct_count <= 1 {
            return 8;
        }
        let n = distinct_count as f64;
        ((n.ln() + 6.0 * std::f64::consts::LN_10) / (n.ln() - (n - 1.0).ln())).ceil() as usize
    }

    #[test]
    fn sanity_test_run_count() {
        assert_eq!(run_count_for_distinct_count(1), 8);
        assert_eq!(run_count_for_distinct_count(2), 21);
        assert_eq!(run_count_for_distinct_count(3), 37);
        assert_eq!(run_count_for_distinct_count(10), 153);
        assert_eq!(run_count_for_distinct_count(26), 436);
    }

    fn check_str_limited(pattern: &str, distinct_count: usize) {
        let run_count = run_count_for_distinct_count(distinct_count);
        check_str(pattern, distinct_count..=distinct_count, run_count);
    }

    fn check_str_unlimited(pattern: &str, min_distinct_count: usize) {
        check_str(pattern, min_distinct_count..=4096, 4096);
    }

    #[test]
    fn test_proptest() {
        check_str_limited("foo", 1);
        check_str_limited("foo|bar|baz", 3);
        check_str_limited("a{0,8}", 9);
        check_str_limited("a?", 2);
        check_str_limited("a*", 101);
        check_str_limited("a+", 101);
        check_str_limited("a{4,}", 101);
        check_str_limited("(foo|bar)(xyzzy|plugh)", 4);
        check_str_limited(".", 95);
        check_str_limited("(?s).", 96);
    }

    #[test]
    fn test_regex_generate() {
        check_str_limited("", 1);
        check_str_limited("aBcDe", 1);
        check_str_limited("[a-zA-Z0-9]", 62);
        check_str_limited("a{3,8}", 6);
        check_str_limited("a{3}", 1);
        check_str_limited("a{3}-a{3}", 1);
        check_str_limited("(abcde)", 1);
        check_str_limited("a?b?", 4);
        check_str_limited("127(\\.[[:digit:]]){3}", 1000);
        check_str_unlimited("00:(:[0-9a-z]{2}){5}", 4000);
    }

    #[test]
    fn test_ascii_character_classes() {
        check_str_limited("[[:alnum:]]", 62);
        check_str_limited("[[:alpha:]]", 52);
        check_str_limited("[[:ascii:]]", 128);
        check_str_limited("[[:blank:]]", 2);
        check_str_limited("[[:cntrl:]]", 33);
        check_str_limited("[[:digit:]]", 10);
        check_str_limited("[[:graph:]]", 94);
        check_str_limited("[[:lower:]]", 26);
        check_str_limited("[[:print:]]", 95);
        check_str_limited("[[:punct:]]", 32);
        check_str_limited("[[:space:]]", 6);
        check_str_limited("[[:upper:]]", 26);
        check_str_limited("[[:word:]]", 63);
        check_str_limited("[[:xdigit:]]", 22);
    }

    #[test]
    #[cfg(feature = "unicode")]
    fn test_unicode_cases() {
        check_str_limited("(?i:fOo)", 8);
        check_str_limited("(?i:a|B)", 4);
        check_str_unlimited(r"(\p{Greek}\P{Greek})(?:\d{3,6})", 4096);
        check_str_unlimited(r"\p{Greek}", 480);
        check_str_unlimited(r"\d+", 4000);
        check_str_unlimited(r"\w+", 4000);
    }

    #[test]
    fn test_fixed_source() {
        let gen = Regex::compile(r"#-[[:digit:]]{2,5}", 32).unwrap();
        let sample = gen.generate(&mut Fixed(2)).unwrap();
        assert_eq!(sample.as_str(), Ok("#-2222"));
        assert_eq!(sample.flow(), Flow::Continue);

        let sample = gen.generate(&mut |_: u64| 2_u64).unwrap();
        assert_eq!(sample.as_bytes(), b"#-2222");

        let gen = Regex::compile(r"noAmbigu1ty!", 32).unwrap();
        let sample = gen.generate(&mut Fixed(0)).unwrap();
        assert_eq!(sample.as_str(), Ok("noAmbigu1ty!"));
        assert_eq!(sample.into_string(), Ok("noAmbigu1ty!".to_string()));

        let node = Node::Concat(vec![
            Node::literal("a"),
            Node::Class(Class::bytes([(0xfe, 0xff)]).unwrap()),
        ]);
        let gen = Regex::with_node(node, 32).unwrap();
        let sample = gen.generate(&mut Fixed(1)).unwrap();
        assert!(sample.as_str().is_err());
        let err = sample.into_string().unwrap_err();
        assert_eq!(err.into_bytes(), b"a\xff");
    }

    #[test]
    fn test_seeded_source_is_reproducible() {
        let gen = Regex::compile(r"((x)+y)*[0-9a-z]{2}(ab|cd)?", 32).unwrap();
        let first: Vec<Vec<u8>> = XorShiftRng::seed_from_u64(99)
            .sample_iter(&gen)
            .take(32)
            .collect();
        let second: Vec<Vec<u8>> = XorShiftRng::seed_from_u64(99)
            .sample_iter(&gen)
            .take(32)
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_anchors() {
        let gen = Regex::compile(r"^hello$", 32).unwrap();
        let mut rng = RngSource(XorShiftRng::seed_from_u64(0));
        let sample = gen.generate(&mut rng).unwrap();
        assert!(sample.is_stopped());
        assert_eq!(sample.as_str(), Ok("hello"));

        let gen = Regex::compile(r"a$b", 32).unwrap();
        let sample = gen.generate(&mut rng).unwrap();
        assert!(sample.is_stopped());
        assert_eq!(sample.into_bytes(), b"a");

        let gen = Regex::compile(r"(?m)^a$^b", 32).unwrap();
        let sample = gen.generate(&mut rng).unwrap();
        assert_eq!(sample.flow(), Flow::Continue);
        assert_eq!(sample.as_str(), Ok("a\n\nb"));
    }

    #[test]
    fn test_word_boundary() {
        assert_eq!(Regex::compile(r"\bfoo", 32).err(), Some(Error::WordBoundary));
        assert_eq!(
            Regex::compile(r"(a|b\B)*", 32).err(),
            Some(Error::WordBoundary)
        );
        assert_eq!(
            Regex::with_node(Node::Quest(vec![Node::WordBoundary]), 32).err(),
            Some(Error::WordBoundary)
        );
    }

    #[test]
    #[cfg(feature = "unicode")]
    fn test_with_hir() {
        let hir = regex_syntax::ParserBuilder::new()
            .case_insensitive(true)
            .build()
            .parse("ab")
            .unwrap();
        let gen = Regex::with_hir(&hir, 5).unwrap();
        assert_eq!(gen.max_repeat(), 5);
        let mut rng = RngSource(XorShiftRng::seed_from_u64(5));
        let mut seen = HashSet::new();
        for _ in 0..256 {
            let sample = gen.generate(&mut rng).unwrap();
            seen.insert(String::try_from(sample).unwrap());
        }
        assert_eq!(seen.len(), 4);
        assert!(seen.contains("Ab") && seen.contains("aB"));
    }

    #[test]
    fn test_default_regex() {
        let gen = Regex::default();
        assert_eq!(gen.root(), &Node::EmptyMatch);
        assert_eq!(gen.max_repeat(), DEFAULT_MAX_REPEAT);
        let sample: String = XorShiftRng::seed_from_u64(0).sample(&gen);
        assert_eq!(sample, "");
    }

    #[test]
    fn test_binary_generator() {
        const PATTERN: &str = r"PE\x00\x00[\x80-\xff]{4}";

        let r = regex::bytes::RegexBuilder::new(&format!("^(?:{})$", PATTERN))
            .unicode(false)
            .build()
            .unwrap();

        let hir = regex_syntax::ParserBuilder::new()
            .unicode(false)
            .utf8(false)
            .build()
            .parse(PATTERN)
            .unwrap();

        let gen = Regex::with_hir(&hir, 100).unwrap();
        let mut rng = XorShiftRng::seed_from_u64(1);
        for res in (&mut rng).sample_iter(&gen).take(1024) {
            let res: Vec<u8> = res;
            assert_eq!(res.len(), 8);
            assert!(r.is_match(&res), "Wrong sample: {:?}, `{:?}`", r, res);
        }

        let res: Result<String, FromUtf8Error> = rng.sample(&gen);
        assert!(res.is_err());
    }

    #[test]
    #[should_panic(expected = "FromUtf8Error")]
    fn test_generating_non_utf8_string() {
        let gen = Regex::with_node(Node::Class(Class::bytes([(0x88, 0x88)]).unwrap()), 100).unwrap();
        let _: String = XorShiftRng::seed_from_u64(0).sample(&gen);
    }

    #[test]
    #[should_panic(expected = "alternation has no branches")]
    fn test_sampling_malformed_tree() {
        let gen = Regex::with_node(Node::Alternate(vec![]), 100).unwrap();
        let _: Vec<u8> = XorShiftRng::seed_from_u64(0).sample(&gen);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::WordBoundary.to_string(),
            "word boundary assertions are not supported"
        );
        assert_eq!(
            Error::RandomOutOfRange { bound: 3, value: 7 }.to_string(),
            "random source returned 7, expected a value below 3"
        );
        let err = Node::parse("(").unwrap_err();
        assert!(std::error::Error::source(&err).is_some());
    }
}
