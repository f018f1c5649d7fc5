//! Parser events and their replay into a tree sink.
//!
//! The parser appends `Start`/`Finish`/`Token` events to a flat vector.
//! `Start` events begin life as tombstones and are promoted when a marker
//! completes; `forward_parent` is a *relative* offset to a later `Start`
//! event that must open before this one (the "precede" operation).

use crate::cst::JominiSyntaxKind;
use crate::diagnostics::Diagnostic;
use crate::text::TextSize;

/// One parser event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start {
        kind: JominiSyntaxKind,
        forward_parent: Option<u32>,
    },
    Finish,
    Token {
        kind: JominiSyntaxKind,
        end: TextSize,
    },
}

impl Event {
    pub fn tombstone() -> Event {
        Event::Start {
            kind: JominiSyntaxKind::Tombstone,
            forward_parent: None,
        }
    }
}

/// Consumer of resolved parser events.
pub trait TreeSink {
    fn token(&mut self, kind: JominiSyntaxKind, end: TextSize);
    fn start_node(&mut self, kind: JominiSyntaxKind);
    fn finish_node(&mut self);
    fn errors(&mut self, errors: Vec<Diagnostic>);
}

/// Replay `events` into `sink`, resolving forward-parent chains.
///
/// Each chain is walked to its end, tombstoning visited events, so that the
/// outermost node opens first. Event order otherwise matches parser call
/// order.
pub fn process_events(sink: &mut dyn TreeSink, events: &mut Vec<Event>, errors: Vec<Diagnostic>) {
    sink.errors(errors);
    let mut forward_parents: Vec<JominiSyntaxKind> = Vec::new();

    let mut idx = 0;
    while idx < events.len() {
        match events[idx].clone() {
            Event::Start { kind, forward_parent } => {
                if kind == JominiSyntaxKind::Tombstone {
                    idx += 1;
                    continue;
                }

                forward_parents.push(kind);
                let mut parent_idx = idx;
                let mut parent_offset = forward_parent;

                while let Some(offset) = parent_offset {
                    parent_idx += offset as usize;
                    assert!(
                        parent_idx < events.len(),
                        "invalid forward_parent offset in parser events"
                    );

                    let parent_event =
                        std::mem::replace(&mut events[parent_idx], Event::tombstone());
                    match parent_event {
                        Event::Start {
                            kind: parent_kind,
                            forward_parent: next_offset,
                        } => {
                            if parent_kind != JominiSyntaxKind::Tombstone {
                                forward_parents.push(parent_kind);
                            }
                            parent_offset = next_offset;
                        }
                        _ => panic!("forward_parent must point to a Start event"),
                    }
                }

                while let Some(parent_kind) = forward_parents.pop() {
                    sink.start_node(parent_kind);
                }
            }
            Event::Finish => sink.finish_node(),
            Event::Token { kind, end } => sink.token(kind, end),
        }
        idx += 1;
    }
}
