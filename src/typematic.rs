use crate::settings::Typematic;
use crate::tick::Tick;

/// Per-key typematic state.
///
/// Each scan observes whether a key is down and steps its state. A step may
/// ask for a make or break to be sent; the new state only takes effect once
/// that has gone out in full, so an interrupted transmission is simply retried
/// on the next scan.
///
/// ```text
///  text on arrows is input
///  [] surround output events
///  {} surround states
///  D - the key is down in this scan
///  U - the key is up in this scan
///  W - the repeat delay has elapsed since the press
///  R - the tick is a multiple of the repeat rate and differs from the stamp
///
///          ┌──U──┐
///          v     │
///  ┌─────>{Released}──D[make]──>{Delaying(t)}──D,!W──┐
///  │        ^                    │   ^  │            │
///  │        │                    │   │  └────────────┘
///  │        └──────U[break]──────┘   │
///  │                                 D,W
///  │                                 v
///  └─U[break]─────────────────{Repeating(t)}──D,R[make]──┐
///                                    ^  │                │
///                                    │  D,!R             │
///                                    └──┴────────────────┘
/// ```
///
/// The tick stored in `Delaying` is when the key went down; in `Repeating` it
/// is when the last repeat went out (or the press tick, before the first
/// repeat).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyState {
    /// The key is up.
    #[default]
    Released,
    /// The key is down and waiting out the repeat delay.
    Delaying {
        /// When the make code was sent.
        since: Tick,
    },
    /// The key is down and auto-repeating.
    Repeating {
        /// When the most recent make code was sent.
        last: Tick,
    },
}

/// What a scan should send for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emit {
    Make,
    Break,
}

/// Result of stepping a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// State to store once `emit` (if any) has been sent.
    pub next: KeyState,
    pub emit: Option<Emit>,
}

impl KeyState {
    pub fn is_pressed(&self) -> bool {
        !matches!(self, KeyState::Released)
    }

    /// Step the state machine
    ///
    /// The state machine progresses as described in the type documentation.
    pub fn step(self, pressed: bool, now: Tick, typematic: &Typematic) -> Step {
        match (self, pressed) {
            (KeyState::Released, false) => Step::stay(self),
            (KeyState::Released, true) => Step {
                next: KeyState::Delaying { since: now },
                emit: Some(Emit::Make),
            },
            (_, false) => Step {
                next: KeyState::Released,
                emit: Some(Emit::Break),
            },
            (KeyState::Delaying { since }, true) => {
                if now.elapsed_since(since) >= typematic.delay.ticks() {
                    Self::repeat(since, now, typematic)
                } else {
                    Step::stay(self)
                }
            }
            (KeyState::Repeating { last }, true) => Self::repeat(last, now, typematic),
        }
    }

    fn repeat(last: Tick, now: Tick, typematic: &Typematic) -> Step {
        if now.is_multiple_of(typematic.rate.ticks()) && last != now {
            Step {
                next: KeyState::Repeating { last: now },
                emit: Some(Emit::Make),
            }
        } else {
            Step::stay(KeyState::Repeating { last })
        }
    }
}

impl Step {
    const fn stay(state: KeyState) -> Self {
        Step {
            next: state,
            emit: None,
        }
    }
}
