//! Session state machine.
//!
//! This module contains `GameSession`, the single owner of a match: board,
//! turn, result, slide usage, rematch votes and the player-symbol seating.
//! Every transition validates fully before it mutates anything, so a
//! rejected action leaves the session exactly as it was.

use crate::actions::{GameAction, GameEvent, PlayerId};
use crate::board::{Board, BoardError, GameResult, SlideDirection, Symbol};
use crate::bot::{Bot, BotDifficulty};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, warn};

/// Participants needed to play a multiplayer session
const MULTIPLAYER_SEATS: usize = 2;

/// Symbol the AI plays in single-player mode
const AI_SYMBOL: Symbol = Symbol::O;

/// How the session is played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    /// One human against the AI
    SinglePlayer,
    /// Two humans
    Multiplayer,
}

impl GameMode {
    /// Rematch votes needed before the board is reset
    pub fn restart_threshold(self) -> usize {
        match self {
            GameMode::SinglePlayer => 1,
            GameMode::Multiplayer => MULTIPLAYER_SEATS,
        }
    }
}

/// Coarse lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Multiplayer with fewer than two participants
    WaitingForPlayers,
    Ongoing,
    /// Result is terminal until a rematch
    Finished,
}

/// How a failed action should be treated by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed input; worth reporting
    InvalidRequest,
    /// Well-formed but not legal right now; drop silently
    Rejected,
}

/// Errors that can occur when applying actions
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Cell {0} is off the board")]
    CellOutOfRange(usize),

    #[error("Cell {0} is already occupied")]
    CellOccupied(usize),

    #[error("Not your turn")]
    NotYourTurn,

    #[error("Game is over")]
    GameOver,

    #[error("Slide already used this match")]
    SlideAlreadyUsed,

    #[error("Waiting for an opponent")]
    WaitingForPlayers,

    #[error("Player is not seated in this session")]
    NotSeated,

    #[error("Session is full")]
    SessionFull,

    #[error("AI turn is no longer current")]
    StaleAiTurn,
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::CellOutOfRange(_) => ErrorKind::InvalidRequest,
            _ => ErrorKind::Rejected,
        }
    }
}

impl From<BoardError> for GameError {
    fn from(err: BoardError) -> Self {
        match err {
            BoardError::CellOutOfRange(i) => GameError::CellOutOfRange(i),
            BoardError::CellOccupied(i) => GameError::CellOccupied(i),
        }
    }
}

/// Per-symbol record of whether the slide has been spent this match
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideUsage {
    pub x: bool,
    pub o: bool,
}

impl SlideUsage {
    pub fn used(&self, symbol: Symbol) -> bool {
        match symbol {
            Symbol::X => self.x,
            Symbol::O => self.o,
            Symbol::None => true,
        }
    }

    fn mark(&mut self, symbol: Symbol) {
        match symbol {
            Symbol::X => self.x = true,
            Symbol::O => self.o = true,
            Symbol::None => {}
        }
    }
}

/// Handle for a deferred AI turn.
///
/// Issued when it becomes the AI's turn and redeemed with
/// [`GameSession::run_ai_turn`]. A ticket goes stale once the match is reset
/// or any mark is placed after it was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiTicket {
    epoch: u64,
    ply: u32,
}

/// Immutable copy of everything an observer may read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub mode: GameMode,
    pub status: SessionStatus,
    pub board: Board,
    pub turn: Symbol,
    pub result: GameResult,
    pub slide_used: SlideUsage,
    pub last_slide: Option<SlideDirection>,
    pub starting_player: Symbol,
    pub restart_votes: usize,
    pub restart_threshold: usize,
    pub players: Vec<(PlayerId, Symbol)>,
    pub ai_symbol: Option<Symbol>,
}

/// The authoritative state of one session
#[derive(Debug)]
pub struct GameSession {
    mode: GameMode,
    board: Board,
    turn: Symbol,
    result: GameResult,
    slide_used: SlideUsage,
    /// Last accepted slide, kept for presentation
    last_slide: Option<SlideDirection>,
    /// Symbol that opened the current match
    starting_player: Symbol,
    restart_votes: HashSet<PlayerId>,
    players: HashMap<PlayerId, Symbol>,
    bot: Option<Bot>,
    /// Bumped on every reset; invalidates outstanding AI tickets
    epoch: u64,
    /// Marks placed this match
    ply: u32,
}

impl GameSession {
    fn with_mode(mode: GameMode, bot: Option<Bot>) -> Self {
        Self {
            mode,
            board: Board::new(),
            turn: Symbol::X,
            result: GameResult::Ongoing,
            slide_used: SlideUsage::default(),
            last_slide: None,
            starting_player: Symbol::X,
            restart_votes: HashSet::new(),
            players: HashMap::new(),
            bot,
            epoch: 0,
            ply: 0,
        }
    }

    /// Two human players; X opens the first match
    pub fn multiplayer() -> Self {
        Self::with_mode(GameMode::Multiplayer, None)
    }

    /// One human (X) against an AI playing O
    pub fn single_player(difficulty: BotDifficulty) -> Self {
        Self::with_bot(Bot::new(AI_SYMBOL, difficulty))
    }

    /// One human against the given bot. The human takes the bot's opposite.
    ///
    /// # Panics
    ///
    /// If the bot's symbol is `Symbol::None`; nobody could ever move.
    pub fn with_bot(bot: Bot) -> Self {
        assert!(!bot.symbol.is_none(), "bot must play X or O");
        Self::with_mode(GameMode::SinglePlayer, Some(bot))
    }

    // ==================== Queries ====================

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Symbol {
        self.turn
    }

    pub fn result(&self) -> GameResult {
        self.result
    }

    pub fn slide_usage(&self) -> SlideUsage {
        self.slide_used
    }

    pub fn last_slide(&self) -> Option<SlideDirection> {
        self.last_slide
    }

    pub fn starting_player(&self) -> Symbol {
        self.starting_player
    }

    pub fn ai_symbol(&self) -> Option<Symbol> {
        self.bot.as_ref().map(|b| b.symbol)
    }

    /// Symbol seated for a player
    pub fn symbol_of(&self, player: PlayerId) -> Option<Symbol> {
        self.players.get(&player).copied()
    }

    /// Human participants seated
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn restart_votes(&self) -> usize {
        self.restart_votes.len()
    }

    pub fn has_voted(&self, player: PlayerId) -> bool {
        self.restart_votes.contains(&player)
    }

    pub fn restart_threshold(&self) -> usize {
        self.mode.restart_threshold()
    }

    /// Whether enough participants are present for a slide
    fn participants_ready(&self) -> bool {
        match self.mode {
            GameMode::SinglePlayer => true,
            GameMode::Multiplayer => self.players.len() >= MULTIPLAYER_SEATS,
        }
    }

    pub fn status(&self) -> SessionStatus {
        if self.result.is_over() {
            SessionStatus::Finished
        } else if !self.participants_ready() {
            SessionStatus::WaitingForPlayers
        } else {
            SessionStatus::Ongoing
        }
    }

    pub fn is_finished(&self) -> bool {
        self.result.is_over()
    }

    /// Whether a player could slide right now
    pub fn can_slide(&self, player: PlayerId) -> bool {
        self.symbol_of(player)
            .is_some_and(|s| self.validate_slide(s).is_ok())
    }

    /// Get all currently valid actions for a player
    pub fn valid_actions(&self, player: PlayerId) -> Vec<GameAction> {
        let mut actions = Vec::new();
        let Some(symbol) = self.symbol_of(player) else {
            return actions;
        };

        if !self.result.is_over() {
            if symbol == self.turn {
                actions.extend(self.board.empty_cells().map(GameAction::PlaceMark));
            }
            if self.validate_slide(symbol).is_ok() {
                actions.extend(SlideDirection::ALL.map(GameAction::Slide));
            }
        }

        if !self.has_voted(player) {
            actions.push(GameAction::RequestRestart);
        }

        actions
    }

    /// Copy of the observable state
    pub fn snapshot(&self) -> GameSnapshot {
        let mut players: Vec<_> = self.players.iter().map(|(&id, &s)| (id, s)).collect();
        players.sort_by_key(|&(_, s)| s != Symbol::X);

        GameSnapshot {
            mode: self.mode,
            status: self.status(),
            board: self.board,
            turn: self.turn,
            result: self.result,
            slide_used: self.slide_used,
            last_slide: self.last_slide,
            starting_player: self.starting_player,
            restart_votes: self.restart_votes.len(),
            restart_threshold: self.restart_threshold(),
            players,
            ai_symbol: self.ai_symbol(),
        }
    }

    // ==================== Participation ====================

    /// Seat a player. Idempotent for players already seated.
    pub fn join(&mut self, player: PlayerId) -> Result<Vec<GameEvent>, GameError> {
        if self.players.contains_key(&player) {
            return Ok(Vec::new());
        }

        let symbol = match (self.mode, self.ai_symbol()) {
            (GameMode::SinglePlayer, Some(ai)) if self.players.is_empty() => ai.opponent(),
            (GameMode::Multiplayer, _) if self.players.len() < MULTIPLAYER_SEATS => {
                if self.players.values().any(|&s| s == Symbol::X) {
                    Symbol::O
                } else {
                    Symbol::X
                }
            }
            _ => return Err(GameError::SessionFull),
        };

        self.players.insert(player, symbol);
        debug!(%player, %symbol, "player seated");

        Ok(vec![GameEvent::PlayerJoined { player, symbol }])
    }

    /// Forget all seating and start a fresh match with X opening.
    pub fn reset_participation(&mut self) {
        self.players.clear();
        self.starting_player = Symbol::X;
        self.clear_match();
        debug!("participation reset");
    }

    // ==================== Actions ====================

    /// Apply an action on behalf of a seated player
    pub fn apply_action(
        &mut self,
        player: PlayerId,
        action: GameAction,
    ) -> Result<Vec<GameEvent>, GameError> {
        match action {
            GameAction::PlaceMark(cell) => self.submit_move(player, cell),
            GameAction::Slide(direction) => self.submit_slide(player, direction),
            GameAction::RequestRestart => self.request_restart(player),
        }
    }

    pub fn submit_move(
        &mut self,
        player: PlayerId,
        cell: usize,
    ) -> Result<Vec<GameEvent>, GameError> {
        let outcome = self
            .seated(player)
            .and_then(|symbol| self.place(symbol, cell));
        log_outcome("move", player, &outcome);
        outcome
    }

    pub fn submit_slide(
        &mut self,
        player: PlayerId,
        direction: SlideDirection,
    ) -> Result<Vec<GameEvent>, GameError> {
        let outcome = self
            .seated(player)
            .and_then(|symbol| self.slide(symbol, direction));
        log_outcome("slide", player, &outcome);
        outcome
    }

    /// Vote for a rematch; executes it once the threshold is reached.
    ///
    /// Votes are counted by cardinality only: any distinct identities count.
    pub fn request_restart(&mut self, player: PlayerId) -> Result<Vec<GameEvent>, GameError> {
        self.restart_votes.insert(player);

        let votes = self.restart_votes.len();
        let needed = self.restart_threshold();
        let mut events = vec![GameEvent::RestartRequested {
            player,
            votes,
            needed,
        }];

        if votes >= needed {
            events.extend(self.rematch());
        }

        debug!(%player, votes, needed, "restart requested");
        Ok(events)
    }

    // ==================== AI ====================

    /// A ticket for the AI's turn, if it is the AI's turn in an ongoing
    /// match.
    pub fn pending_ai_turn(&self) -> Option<AiTicket> {
        let ai = self.ai_symbol()?;
        (!self.result.is_over() && self.turn == ai).then_some(AiTicket {
            epoch: self.epoch,
            ply: self.ply,
        })
    }

    /// Let the AI play its turn. Preconditions are checked again here, so a
    /// ticket from before a reset or an earlier turn is refused.
    pub fn run_ai_turn(&mut self, ticket: AiTicket) -> Result<Vec<GameEvent>, GameError> {
        if self.pending_ai_turn() != Some(ticket) {
            debug!(?ticket, "discarding stale AI turn");
            return Err(GameError::StaleAiTurn);
        }

        let board = self.board;
        let Some(bot) = self.bot.as_mut() else {
            return Err(GameError::NotSeated);
        };
        let ai = bot.symbol;
        let plan = bot.plan(&board, !self.slide_used.used(ai));

        let mut events = Vec::new();
        if let Some(direction) = plan.slide {
            events.extend(self.slide(ai, direction)?);
        }
        if let Some(cell) = plan.cell {
            events.extend(self.place(ai, cell)?);
        }

        Ok(events)
    }

    // ==================== Transitions ====================

    fn seated(&self, player: PlayerId) -> Result<Symbol, GameError> {
        self.symbol_of(player).ok_or(GameError::NotSeated)
    }

    fn place(&mut self, symbol: Symbol, cell: usize) -> Result<Vec<GameEvent>, GameError> {
        if self.result.is_over() {
            return Err(GameError::GameOver);
        }
        // Range and occupancy are checked before turn ownership
        let next = self.board.apply_move(cell, symbol)?;
        if symbol != self.turn {
            return Err(GameError::NotYourTurn);
        }

        self.board = next;
        self.ply += 1;
        self.turn = symbol.opponent();
        self.result = self.board.evaluate_result();

        let mut events = vec![
            GameEvent::MarkPlaced { symbol, cell },
            GameEvent::TurnChanged { turn: self.turn },
        ];
        if self.result.is_over() {
            debug!(result = ?self.result, "match finished");
            events.push(GameEvent::GameFinished {
                result: self.result,
            });
        }
        Ok(events)
    }

    fn validate_slide(&self, symbol: Symbol) -> Result<(), GameError> {
        if self.result.is_over() {
            return Err(GameError::GameOver);
        }
        if !self.participants_ready() {
            return Err(GameError::WaitingForPlayers);
        }
        if self.slide_used.used(symbol) {
            return Err(GameError::SlideAlreadyUsed);
        }
        Ok(())
    }

    /// Slides ignore turn order and do not re-evaluate the result; a line
    /// formed by a slide is only scored after the next placement.
    fn slide(
        &mut self,
        symbol: Symbol,
        direction: SlideDirection,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.validate_slide(symbol)?;

        self.slide_used.mark(symbol);
        self.board = self.board.apply_slide(direction);
        self.last_slide = Some(direction);

        Ok(vec![GameEvent::SlideDirectionChanged { symbol, direction }])
    }

    fn rematch(&mut self) -> Vec<GameEvent> {
        self.starting_player = self.starting_player.opponent();
        self.clear_match();
        debug!(starting = %self.starting_player, "rematch started");

        vec![GameEvent::GameReset {
            starting: self.starting_player,
        }]
    }

    fn clear_match(&mut self) {
        self.board = Board::new();
        self.result = GameResult::Ongoing;
        self.slide_used = SlideUsage::default();
        self.last_slide = None;
        self.restart_votes.clear();
        self.turn = self.starting_player;
        self.epoch += 1;
        self.ply = 0;
    }
}

fn log_outcome(action: &str, player: PlayerId, outcome: &Result<Vec<GameEvent>, GameError>) {
    match outcome {
        Ok(_) => debug!(%player, action, "action applied"),
        Err(e) if e.kind() == ErrorKind::InvalidRequest => {
            warn!(%player, action, error = %e, "invalid request dropped")
        }
        Err(e) => debug!(%player, action, error = %e, "action rejected"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn two_player_game() -> (GameSession, PlayerId, PlayerId) {
        let mut game = GameSession::multiplayer();
        let x = Uuid::new_v4();
        let o = Uuid::new_v4();
        game.join(x).unwrap();
        game.join(o).unwrap();
        (game, x, o)
    }

    #[test]
    fn test_join_assigns_x_then_o() {
        let (mut game, x, o) = two_player_game();
        assert_eq!(game.symbol_of(x), Some(Symbol::X));
        assert_eq!(game.symbol_of(o), Some(Symbol::O));

        // Idempotent
        assert_eq!(game.join(x), Ok(vec![]));
        assert_eq!(game.symbol_of(x), Some(Symbol::X));

        // Third player turned away
        assert_eq!(game.join(Uuid::new_v4()), Err(GameError::SessionFull));
    }

    #[test]
    fn test_waiting_for_players() {
        let mut game = GameSession::multiplayer();
        let x = Uuid::new_v4();
        game.join(x).unwrap();

        assert_eq!(game.status(), SessionStatus::WaitingForPlayers);
        assert_eq!(
            game.submit_slide(x, SlideDirection::Up),
            Err(GameError::WaitingForPlayers)
        );
        assert!(!game.can_slide(x));
    }

    #[test]
    fn test_moves_alternate_turns() {
        let (mut game, x, o) = two_player_game();

        assert_eq!(game.submit_move(o, 0), Err(GameError::NotYourTurn));
        game.submit_move(x, 0).unwrap();
        assert_eq!(game.turn(), Symbol::O);
        assert_eq!(game.submit_move(x, 1), Err(GameError::NotYourTurn));
        game.submit_move(o, 1).unwrap();
        assert_eq!(game.turn(), Symbol::X);
    }

    #[test]
    fn test_rejected_move_changes_nothing() {
        let (mut game, x, o) = two_player_game();
        game.submit_move(x, 4).unwrap();
        let before = game.snapshot();

        assert_eq!(game.submit_move(o, 4), Err(GameError::CellOccupied(4)));
        assert_eq!(game.submit_move(o, 9), Err(GameError::CellOutOfRange(9)));
        assert_eq!(game.submit_move(Uuid::new_v4(), 3), Err(GameError::NotSeated));

        assert_eq!(game.snapshot(), before);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(GameError::CellOutOfRange(12).kind(), ErrorKind::InvalidRequest);
        assert_eq!(GameError::NotYourTurn.kind(), ErrorKind::Rejected);
        assert_eq!(GameError::SlideAlreadyUsed.kind(), ErrorKind::Rejected);
    }

    #[test]
    fn test_slide_once_per_match() {
        let (mut game, x, o) = two_player_game();
        game.submit_move(x, 2).unwrap();

        let events = game.submit_slide(o, SlideDirection::Left).unwrap();
        assert_eq!(
            events,
            vec![GameEvent::SlideDirectionChanged {
                symbol: Symbol::O,
                direction: SlideDirection::Left
            }]
        );
        assert_eq!(game.board().get(0), Some(Symbol::X));
        assert!(game.slide_usage().o);
        assert!(!game.slide_usage().x);
        assert_eq!(game.last_slide(), Some(SlideDirection::Left));

        // Slide does not consume the turn
        assert_eq!(game.turn(), Symbol::O);

        assert_eq!(
            game.submit_slide(o, SlideDirection::Right),
            Err(GameError::SlideAlreadyUsed)
        );
        assert!(game.can_slide(x));
    }

    #[test]
    fn test_win_ends_game() {
        let (mut game, x, o) = two_player_game();
        for (player, cell) in [(x, 0), (o, 3), (x, 1), (o, 4)] {
            game.submit_move(player, cell).unwrap();
        }
        let events = game.submit_move(x, 2).unwrap();

        assert!(events.contains(&GameEvent::GameFinished {
            result: GameResult::XWins
        }));
        assert_eq!(game.status(), SessionStatus::Finished);
        assert_eq!(game.submit_move(o, 5), Err(GameError::GameOver));
        assert_eq!(
            game.submit_slide(o, SlideDirection::Up),
            Err(GameError::GameOver)
        );
    }

    #[test]
    fn test_restart_needs_both_votes() {
        let (mut game, x, o) = two_player_game();
        game.submit_move(x, 0).unwrap();

        game.request_restart(x).unwrap();
        game.request_restart(x).unwrap();
        assert_eq!(game.restart_votes(), 1);
        assert_eq!(game.board().count(Symbol::X), 1);

        let events = game.request_restart(o).unwrap();
        assert!(events.contains(&GameEvent::GameReset {
            starting: Symbol::O
        }));
        assert_eq!(game.restart_votes(), 0);
        assert_eq!(game.board(), &Board::new());
        assert_eq!(game.turn(), Symbol::O);
        assert_eq!(game.starting_player(), Symbol::O);

        // Seating survives the rematch
        assert_eq!(game.symbol_of(x), Some(Symbol::X));
    }

    #[test]
    fn test_restart_clears_slide_usage() {
        let (mut game, x, o) = two_player_game();
        game.submit_slide(x, SlideDirection::Down).unwrap();
        game.request_restart(x).unwrap();
        game.request_restart(o).unwrap();

        assert_eq!(game.slide_usage(), SlideUsage::default());
        assert_eq!(game.last_slide(), None);
        assert!(game.can_slide(x));
    }

    #[test]
    fn test_reset_participation() {
        let (mut game, x, o) = two_player_game();
        game.submit_move(x, 0).unwrap();
        game.reset_participation();

        assert_eq!(game.player_count(), 0);
        assert_eq!(game.board(), &Board::new());

        // Former O re-joins first and now plays X
        game.join(o).unwrap();
        assert_eq!(game.symbol_of(o), Some(Symbol::X));
        assert_eq!(game.turn(), Symbol::X);
    }

    #[test]
    fn test_valid_actions() {
        let (game, x, o) = two_player_game();

        let x_actions = game.valid_actions(x);
        assert_eq!(
            x_actions
                .iter()
                .filter(|a| matches!(a, GameAction::PlaceMark(_)))
                .count(),
            9
        );
        assert!(x_actions.contains(&GameAction::Slide(SlideDirection::Up)));

        let o_actions = game.valid_actions(o);
        assert!(!o_actions
            .iter()
            .any(|a| matches!(a, GameAction::PlaceMark(_))));
        assert!(o_actions.contains(&GameAction::RequestRestart));

        assert!(game.valid_actions(Uuid::new_v4()).is_empty());
    }

    #[test]
    fn test_single_player_seating() {
        let mut game = GameSession::single_player(BotDifficulty::Hard);
        let human = Uuid::new_v4();

        game.join(human).unwrap();
        assert_eq!(game.symbol_of(human), Some(Symbol::X));
        assert_eq!(game.ai_symbol(), Some(Symbol::O));
        assert_eq!(game.status(), SessionStatus::Ongoing);
        assert_eq!(game.join(Uuid::new_v4()), Err(GameError::SessionFull));
    }

    #[test]
    fn test_ai_ticket_lifecycle() {
        let mut game = GameSession::single_player(BotDifficulty::Hard);
        let human = Uuid::new_v4();
        game.join(human).unwrap();

        assert_eq!(game.pending_ai_turn(), None);
        game.submit_move(human, 0).unwrap();

        let ticket = game.pending_ai_turn().unwrap();
        game.run_ai_turn(ticket).unwrap();
        assert_eq!(game.turn(), Symbol::X);
        assert_eq!(game.board().count(Symbol::O), 1);

        // Redeeming twice is refused
        assert_eq!(game.run_ai_turn(ticket), Err(GameError::StaleAiTurn));
    }

    #[test]
    #[should_panic(expected = "bot must play X or O")]
    fn test_bot_without_symbol_is_refused() {
        GameSession::with_bot(Bot::new(Symbol::None, BotDifficulty::Hard));
    }

    #[test]
    fn test_session_can_be_shared_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GameSession>();
        assert_send_sync::<Bot>();
    }

    #[test]
    fn test_single_player_restart_is_immediate() {
        let mut game = GameSession::single_player(BotDifficulty::Easy);
        let human = Uuid::new_v4();
        game.join(human).unwrap();
        game.submit_move(human, 4).unwrap();

        let ticket = game.pending_ai_turn().unwrap();
        game.request_restart(human).unwrap();

        assert_eq!(game.board(), &Board::new());
        assert_eq!(game.turn(), Symbol::O);
        assert_eq!(game.run_ai_turn(ticket), Err(GameError::StaleAiTurn));
        // AI opens the rematch
        assert!(game.pending_ai_turn().is_some());
    }
}
