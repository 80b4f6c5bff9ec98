//! Slidetoe - tic-tac-toe with a once-per-game board slide
//!
//! This crate provides the core game logic for Slidetoe, including:
//! - The 3×3 board and its pure operations (place, slide, evaluate)
//! - AI strategies for the single-player opponent
//! - The session state machine with turn, slide and rematch rules
//!
//! # Architecture
//!
//! The engine knows nothing about networking or rendering. A host feeds it
//! already-authenticated player actions and reads back snapshots and events.
//! It is meant to be owned by exactly one authority per session.
//!
//! # Modules
//!
//! - [`board`]: Board representation and rules of play
//! - [`actions`]: Action payloads and emitted events
//! - [`bot`]: AI strategies and the bot player
//! - [`game`]: Session state machine

pub mod actions;
pub mod board;
pub mod bot;
pub mod game;

// Re-export commonly used types
pub use actions::{GameAction, GameEvent, PlayerId};
pub use board::{Board, BoardError, GameResult, SlideDirection, Symbol};
pub use bot::{AiPlan, Bot, BotDifficulty, RandomStrategy, Strategy, UtilityStrategy};
pub use game::{
    AiTicket, ErrorKind, GameError, GameMode, GameSession, GameSnapshot, SessionStatus,
    SlideUsage,
};
