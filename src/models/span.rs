use serde::{Deserialize, Serialize};

/// Half-open character-offset interval `[start, end)` into a specific text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of characters covered by this span
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// How an `inner` span sits relative to an `outer` span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanOverlap {
    /// No shared characters
    Disjoint,
    /// `inner` lies entirely within `outer` (boundaries may coincide)
    Contains,
    /// `outer` lies entirely within `inner` (boundaries may coincide)
    ContainedBy,
    /// `inner` starts before `outer` and ends inside it
    OverlapsStart,
    /// `inner` starts inside `outer` and ends after it
    OverlapsEnd,
}

/// Classify how `inner` overlaps `outer`.
///
/// Containment is checked before the partial-overlap cases, so identical
/// spans classify as `Contains`. Every view that reacts to a redaction span
/// (sentences, entities, tokens, voice words) goes through this one function.
pub fn classify_overlap(outer: Span, inner: Span) -> SpanOverlap {
    if outer.start <= inner.start && inner.end <= outer.end {
        SpanOverlap::Contains
    } else if inner.start <= outer.start && outer.end <= inner.end {
        SpanOverlap::ContainedBy
    } else if inner.start <= outer.start && outer.start < inner.end && inner.end <= outer.end {
        SpanOverlap::OverlapsStart
    } else if outer.start <= inner.start && inner.start < outer.end && outer.end <= inner.end {
        SpanOverlap::OverlapsEnd
    } else {
        SpanOverlap::Disjoint
    }
}
