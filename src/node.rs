//! The syntax tree walked by the generator.
//!
//! A [`Node`] is usually obtained from a pattern through [`Node::parse()`], or
//! from a [`regex_syntax::hir::Hir`] built with custom parser flags, but it
//! can also be assembled by hand.

use log::debug;
use regex_syntax::hir::{self, Hir, HirKind, Look};
use regex_syntax::Parser;

use crate::Error;

const SURROGATE_START: u32 = 0xd800;
const SURROGATE_END: u32 = 0xdfff;
const MAX_SCALAR: u32 = char::MAX as u32;

/// A node of the syntax tree.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Node {
    /// Matches nothing. Generates nothing.
    NoMatch,
    /// Matches the empty string.
    EmptyMatch,
    /// A byte string emitted verbatim.
    Literal(Box<[u8]>),
    /// One member of a character class.
    Class(Class),
    /// Any character, `(?s).`. Sampled from printable ASCII plus `\n`.
    AnyChar,
    /// Any character except `\n`, `.`. Sampled from printable ASCII.
    AnyCharNotNl,
    /// `(?m)^`
    BeginLine,
    /// `(?m)$`
    EndLine,
    /// `^` or `\A`
    BeginText,
    /// `$` or `\z`. Stops the generation.
    EndText,
    /// `\b`. Cannot be generated.
    WordBoundary,
    /// `\B`. Cannot be generated.
    NoWordBoundary,
    /// `x*`
    Star(Vec<Node>),
    /// `x+`
    Plus(Vec<Node>),
    /// `x?`
    Quest(Vec<Node>),
    /// `x{min,max}`, or `x{min,}` when `max` is `None`.
    Repeat {
        /// Minimum number of repetitions.
        min: u32,
        /// Maximum number of repetitions, `None` if unbounded.
        max: Option<u32>,
        /// The repeated sequence.
        subs: Vec<Node>,
    },
    /// `xyz`
    Concat(Vec<Node>),
    /// `(xyz)`
    Capture(Vec<Node>),
    /// `x|y|z`
    Alternate(Vec<Node>),
}

impl Default for Node {
    /// Creates an [`EmptyMatch`](Node::EmptyMatch) node.
    fn default() -> Self {
        Self::EmptyMatch
    }
}

impl Node {
    /// Parses a pattern with the default [`regex_syntax::Parser`] settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Syntax`] if the pattern is not a valid regex.
    pub fn parse(pattern: &str) -> Result<Self, Error> {
        let hir = Parser::new().parse(pattern)?;
        Ok(Self::from_hir(&hir))
    }

    /// Converts a parsed pattern, e.g. one built by a
    /// [`regex_syntax::ParserBuilder`] with custom flags.
    ///
    /// ```
    /// let hir = regex_syntax::ParserBuilder::new()
    ///     .dot_matches_new_line(true)
    ///     .build()
    ///     .parse(".")
    ///     .unwrap();
    /// assert_eq!(rand_regen::Node::from_hir(&hir), rand_regen::Node::AnyChar);
    /// ```
    pub fn from_hir(hir: &Hir) -> Self {
        Self::from(hir)
    }

    /// Creates a literal node emitting `s`.
    pub fn literal(s: &str) -> Self {
        Self::Literal(s.as_bytes().into())
    }

    /// Returns the direct children of this node.
    pub fn children(&self) -> &[Node] {
        match self {
            Self::Star(subs)
            | Self::Plus(subs)
            | Self::Quest(subs)
            | Self::Repeat { subs, .. }
            | Self::Concat(subs)
            | Self::Capture(subs)
            | Self::Alternate(subs) => subs,
            _ => &[],
        }
    }

    /// Checks whether a `\b` or `\B` appears anywhere in this tree.
    pub fn contains_word_boundary(&self) -> bool {
        match self {
            Self::WordBoundary | Self::NoWordBoundary => true,
            _ => self.children().iter().any(Self::contains_word_boundary),
        }
    }
}

impl From<Hir> for Node {
    fn from(hir: Hir) -> Self {
        Self::from(&hir)
    }
}

impl From<&Hir> for Node {
    fn from(hir: &Hir) -> Self {
        match hir.kind() {
            HirKind::Empty => Self::EmptyMatch,
            HirKind::Literal(hir::Literal(bytes)) => Self::Literal(bytes.clone()),
            HirKind::Class(hir::Class::Unicode(class)) => from_unicode_class(class),
            HirKind::Class(hir::Class::Bytes(class)) => from_byte_class(class),
            HirKind::Look(look) => from_look(*look),
            HirKind::Repetition(rep) => from_repetition(rep),
            HirKind::Capture(cap) => Self::Capture(vec![Self::from(&*cap.sub)]),
            HirKind::Concat(hirs) => Self::Concat(hirs.iter().map(Self::from).collect()),
            HirKind::Alternation(hirs) => Self::Alternate(hirs.iter().map(Self::from).collect()),
        }
    }
}

fn from_unicode_class(class: &hir::ClassUnicode) -> Node {
    let ranges: Vec<(u32, u32)> = class
        .iter()
        .map(|r| (u32::from(r.start()), u32::from(r.end())))
        .collect();
    match ranges.as_slice() {
        [] => Node::NoMatch,
        [(0, MAX_SCALAR)] => Node::AnyChar,
        // `.` and `(?R).`
        [(0, 0x09), (0x0b, MAX_SCALAR)] | [(0, 0x09), (0x0b, 0x0c), (0x0e, MAX_SCALAR)] => {
            Node::AnyCharNotNl
        }
        _ => Node::Class(Class::from_scalar_ranges(ranges)),
    }
}

fn from_byte_class(class: &hir::ClassBytes) -> Node {
    let ranges: Vec<(u8, u8)> = class.iter().map(|r| (r.start(), r.end())).collect();
    match ranges.as_slice() {
        [] => Node::NoMatch,
        [(0, 0xff)] => Node::AnyChar,
        [(0, 0x09), (0x0b, 0xff)] | [(0, 0x09), (0x0b, 0x0c), (0x0e, 0xff)] => {
            Node::AnyCharNotNl
        }
        _ => Node::Class(Class::from_byte_ranges(
            ranges
                .iter()
                .map(|&(low, high)| (u32::from(low), u32::from(high)))
                .collect(),
        )),
    }
}

fn from_look(look: Look) -> Node {
    match look {
        Look::Start => Node::BeginText,
        Look::End => Node::EndText,
        Look::StartLF | Look::StartCRLF => Node::BeginLine,
        Look::EndLF | Look::EndCRLF => Node::EndLine,
        Look::WordAsciiNegate | Look::WordUnicodeNegate => Node::NoWordBoundary,
        // word boundaries, including the start/end and half variants
        _ => Node::WordBoundary,
    }
}

fn from_repetition(rep: &hir::Repetition) -> Node {
    let subs = vec![Node::from(&*rep.sub)];
    match (rep.min, rep.max) {
        (0, None) => Node::Star(subs),
        (1, None) => Node::Plus(subs),
        (0, Some(1)) => Node::Quest(subs),
        (min, max) => Node::Repeat { min, max, subs },
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
enum Unit {
    Char,
    Byte,
}

/// A set of characters or bytes, stored as sorted, non-overlapping inclusive
/// ranges.
///
/// Character ranges never contain a surrogate code point, so every member
/// is a valid [`char`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Class {
    unit: Unit,
    ranges: Box<[(u32, u32)]>,
}

impl Class {
    /// Creates a class of Unicode scalar values.
    ///
    /// Ranges may be given in any order and may overlap.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Invariant`] if a range `(low, high)` has `low > high`.
    ///
    /// # Examples
    ///
    /// ```
    /// let class = rand_regen::Class::unicode([('a', 'f'), ('0', '9'), ('c', 'z')])?;
    /// assert_eq!(class.ranges(), [(0x30, 0x39), (0x61, 0x7a)]);
    /// assert_eq!(class.len(), 36);
    ///
    /// assert!(rand_regen::Class::unicode([('z', 'a')]).is_err());
    /// # Ok::<(), rand_regen::Error>(())
    /// ```
    pub fn unicode(ranges: impl IntoIterator<Item = (char, char)>) -> Result<Self, Error> {
        let ranges = ordered(
            ranges
                .into_iter()
                .map(|(low, high)| (u32::from(low), u32::from(high))),
        )?;
        Ok(Self::from_scalar_ranges(ranges))
    }

    /// Creates a class of raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Invariant`] if a range `(low, high)` has `low > high`.
    pub fn bytes(ranges: impl IntoIterator<Item = (u8, u8)>) -> Result<Self, Error> {
        let ranges = ordered(
            ranges
                .into_iter()
                .map(|(low, high)| (u32::from(low), u32::from(high))),
        )?;
        Ok(Self::from_byte_ranges(ranges))
    }

    fn from_byte_ranges(ranges: Vec<(u32, u32)>) -> Self {
        Self {
            unit: Unit::Byte,
            ranges: normalize(ranges).into_boxed_slice(),
        }
    }

    fn from_scalar_ranges(ranges: Vec<(u32, u32)>) -> Self {
        let mut split = Vec::with_capacity(ranges.len() + 1);
        for (low, high) in normalize(ranges) {
            if low < SURROGATE_START && SURROGATE_END < high {
                split.push((low, SURROGATE_START - 1));
                split.push((SURROGATE_END + 1, high));
            } else {
                split.push((low, high));
            }
        }
        Self {
            unit: Unit::Char,
            ranges: split.into_boxed_slice(),
        }
    }

    /// The inclusive ranges of this class, as code points or byte values.
    pub fn ranges(&self) -> &[(u32, u32)] {
        &self.ranges
    }

    /// Checks whether this class holds raw bytes instead of characters.
    pub fn is_bytes(&self) -> bool {
        self.unit == Unit::Byte
    }

    /// Returns the number of members in this class.
    pub fn len(&self) -> u64 {
        self.ranges
            .iter()
            .map(|&(low, high)| 1 + u64::from(high - low))
            .sum()
    }

    /// Checks whether this class has no members.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

fn ordered(ranges: impl Iterator<Item = (u32, u32)>) -> Result<Vec<(u32, u32)>, Error> {
    ranges
        .map(|(low, high)| {
            if low <= high {
                Ok((low, high))
            } else {
                debug!("class range {:#x}-{:#x} is reversed", low, high);
                Err(Error::Invariant("class range has low > high"))
            }
        })
        .collect()
}

/// Sorts and merges ranges so that they are disjoint and non-adjacent.
/// Every range must already have `low <= high`.
fn normalize(mut ranges: Vec<(u32, u32)>) -> Vec<(u32, u32)> {
    ranges.sort_unstable();

    let mut merged: Vec<(u32, u32)> = Vec::with_capacity(ranges.len());
    for (low, high) in ranges {
        match merged.last_mut() {
            Some(last) if low <= last.1.saturating_add(1) => last.1 = last.1.max(high),
            _ => merged.push((low, high)),
        }
    }
    merged
}
