//! Markers delimiting syntax nodes in the event stream.

use crate::cst::JominiSyntaxKind;
use crate::parser::event::Event;
use crate::parser::parser::Parser;
use crate::text::{TextRange, TextSize};

/// An open node: index of its `Start` event plus position bookkeeping.
#[derive(Debug)]
pub struct Marker {
    pub(crate) pos: u32,
    pub(crate) start: TextSize,
    /// Earliest event index belonging to this subtree, tracked across
    /// precede chains so [`CompletedMarker::range`] can scan backwards.
    pub(crate) old_start: u32,
    /// `Start` event of a preceded child whose forward-parent link must be
    /// cleared if this marker is abandoned.
    pub(crate) child_idx: Option<u32>,
}

impl Marker {
    pub(crate) fn new(pos: u32, start: TextSize) -> Self {
        Self {
            pos,
            start,
            old_start: pos,
            child_idx: None,
        }
    }

    /// Promote the `Start` event to `kind` and append the matching `Finish`.
    pub fn complete(self, parser: &mut Parser<'_>, kind: JominiSyntaxKind) -> CompletedMarker {
        match &mut parser.events[self.pos as usize] {
            Event::Start { kind: slot, .. } => *slot = kind,
            _ => panic!("marker must point to a Start event"),
        }

        let finish_pos = parser.events.len() as u32;
        parser.events.push(Event::Finish);
        CompletedMarker {
            start_pos: self.pos,
            finish_pos,
            offset: self.start,
            old_start: self.old_start,
        }
    }

    /// Drop the marker without producing a node.
    ///
    /// Only a trailing empty `Start` is removed; earlier events are never
    /// rewritten. A forward-parent link installed by `precede` is cleared.
    pub fn abandon(self, parser: &mut Parser<'_>) {
        if self.pos as usize == parser.events.len().saturating_sub(1)
            && matches!(
                parser.events.last(),
                Some(Event::Start {
                    forward_parent: None,
                    ..
                })
            )
        {
            parser.events.pop();
        }

        if let Some(child_idx) = self.child_idx
            && let Event::Start { forward_parent, .. } = &mut parser.events[child_idx as usize]
        {
            *forward_parent = None;
        }
    }
}

/// A completed node, allowing retroactive re-parenting and inspection.
#[derive(Debug, Clone, Copy)]
pub struct CompletedMarker {
    start_pos: u32,
    finish_pos: u32,
    offset: TextSize,
    old_start: u32,
}

impl CompletedMarker {
    /// Re-label the completed node.
    pub fn change_kind(&self, parser: &mut Parser<'_>, new_kind: JominiSyntaxKind) {
        match &mut parser.events[self.start_pos as usize] {
            Event::Start { kind, .. } => *kind = new_kind,
            _ => panic!("completed marker points to a non-start event"),
        }
    }

    /// Source range covered by the node.
    pub fn range(&self, parser: &Parser<'_>) -> TextRange {
        let mut end = self.offset;
        for event in parser.events[self.old_start as usize..self.finish_pos as usize]
            .iter()
            .rev()
        {
            if let Event::Token { end: token_end, .. } = event {
                end = *token_end;
                break;
            }
        }
        TextRange::new(self.offset, end)
    }

    /// Source text covered by the node.
    pub fn text<'src>(&self, parser: &Parser<'src>) -> &'src str {
        crate::text::slice_text_range(parser.source_text(), self.range(parser))
    }

    /// Open a new outer node that adopts this completed node as its child.
    ///
    /// Implemented as a relative forward-parent offset so the event vector
    /// can keep growing without rewriting earlier entries.
    pub fn precede(self, parser: &mut Parser<'_>) -> Marker {
        let mut new_marker = parser.start();
        match &mut parser.events[self.start_pos as usize] {
            Event::Start { forward_parent, .. } => {
                let distance = new_marker.pos - self.start_pos;
                assert!(distance > 0, "invalid precede distance");
                *forward_parent = Some(distance);
            }
            _ => panic!("completed marker points to a non-start event"),
        }

        new_marker.child_idx = Some(self.start_pos);
        new_marker.start = self.offset;
        new_marker.old_start = new_marker.old_start.min(self.old_start);
        new_marker
    }

    /// Undo the completion, returning a reusable marker.
    ///
    /// Only valid for the most recent completion; anything else would require
    /// rewriting interior events.
    pub fn undo_completion(self, parser: &mut Parser<'_>) -> Marker {
        assert!(
            matches!(
                parser.events[self.start_pos as usize],
                Event::Start { .. }
            ),
            "completed marker points to a non-start event"
        );
        assert_eq!(
            self.finish_pos as usize,
            parser.events.len() - 1,
            "can only undo the most recent completion"
        );

        parser.events.pop();
        Marker {
            pos: self.start_pos,
            start: self.offset,
            old_start: self.old_start,
            child_idx: None,
        }
    }
}
