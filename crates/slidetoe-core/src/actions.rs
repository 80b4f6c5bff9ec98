//! Game actions that players can take.
//!
//! This module defines the action payloads a session accepts and the events
//! it emits once an action has been applied.

use crate::board::{GameResult, SlideDirection, Symbol};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identity of a participant (a connection id)
pub type PlayerId = Uuid;

/// All possible actions a player can take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameAction {
    /// Place the player's mark on a cell
    PlaceMark(usize),
    /// Use the once-per-match slide
    Slide(SlideDirection),
    /// Vote for a rematch
    RequestRestart,
}

/// Events that occur as a result of actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A player was seated with a symbol
    PlayerJoined { player: PlayerId, symbol: Symbol },

    /// A mark was placed
    MarkPlaced { symbol: Symbol, cell: usize },

    /// The board was slid. Transient, for UI feedback only.
    SlideDirectionChanged {
        symbol: Symbol,
        direction: SlideDirection,
    },

    /// The turn passed to another symbol
    TurnChanged { turn: Symbol },

    /// The match reached a terminal result
    GameFinished { result: GameResult },

    /// A rematch vote was recorded
    RestartRequested {
        player: PlayerId,
        votes: usize,
        needed: usize,
    },

    /// The board was cleared for a rematch
    GameReset { starting: Symbol },
}
