//! AI opponents for Slidetoe.
//!
//! This module provides two strategies behind a common trait:
//! - Easy: uniform random cells, an occasional random slide
//! - Hard: utility scoring of every cell, sliding only when a slide
//!   strictly improves the best available cell
//!
//! Strategies are pure decisions over a board snapshot. A `Bot` wraps one
//! and turns it into a plan for a whole turn.

use crate::board::{Board, SlideDirection, Symbol, CELL_COUNT, LINES};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Score for a cell that completes a line
pub const WIN_SCORE: i32 = 10_000;
/// Score for a cell that takes the opponent's last open spot on a line
pub const BLOCK_SCORE: i32 = 500;
/// Score for a cell that leaves two in a line with the third open
pub const SETUP_SCORE: i32 = 100;
pub const CENTER_SCORE: i32 = 20;
pub const CORNER_SCORE: i32 = 5;
pub const OTHER_SCORE: i32 = 1;

/// Score of an occupied cell. Never chosen.
pub const INVALID_SCORE: i32 = i32::MIN;

/// Chance that the random strategy slides when it still can
const RANDOM_SLIDE_CHANCE: f64 = 0.2;

/// Decision-making for an AI player
pub trait Strategy: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Pick an empty cell, or `None` when the board is full
    fn choose_move(&mut self, board: &Board, ai: Symbol, opponent: Symbol) -> Option<usize>;

    /// Whether to spend the slide before moving
    fn should_slide(&mut self, board: &Board, ai: Symbol, opponent: Symbol) -> bool;

    fn choose_slide_direction(
        &mut self,
        board: &Board,
        ai: Symbol,
        opponent: Symbol,
    ) -> SlideDirection;
}

/// Heuristic strategy: win > block > setup, plus a positional bonus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UtilityStrategy;

impl UtilityStrategy {
    pub fn new() -> Self {
        Self
    }

    /// Score placing `ai` at `index`.
    ///
    /// The category (win, block, setup) is judged on the board after the
    /// simulated placement and only the first matching category counts. The
    /// positional bonus is always added.
    pub fn score_cell(board: &Board, index: usize, ai: Symbol, opponent: Symbol) -> i32 {
        let next = match board.apply_move(index, ai) {
            Ok(next) => next,
            Err(_) => return INVALID_SCORE,
        };

        let mut score = 0;
        if next.has_line(ai) {
            score += WIN_SCORE;
        } else if Self::is_block(&next, ai, opponent) {
            score += BLOCK_SCORE;
        } else if Self::is_setup(&next, ai) {
            score += SETUP_SCORE;
        }

        score + Self::position_bonus(index)
    }

    /// Some line holds two opponent marks and one of ours after the move.
    /// The line need not pass through the placed cell.
    fn is_block(next: &Board, ai: Symbol, opponent: Symbol) -> bool {
        LINES.iter().any(|line| {
            let (own, theirs, _) = line_counts(next, line, ai, opponent);
            theirs == 2 && own == 1
        })
    }

    fn is_setup(next: &Board, ai: Symbol) -> bool {
        LINES.iter().any(|line| {
            let (own, _, empty) = line_counts(next, line, ai, ai.opponent());
            own == 2 && empty == 1
        })
    }

    fn position_bonus(index: usize) -> i32 {
        match index {
            4 => CENTER_SCORE,
            0 | 2 | 6 | 8 => CORNER_SCORE,
            _ => OTHER_SCORE,
        }
    }

    /// Best cell score on a board, `INVALID_SCORE` if it is full
    pub fn best_score(board: &Board, ai: Symbol, opponent: Symbol) -> i32 {
        (0..CELL_COUNT)
            .map(|i| Self::score_cell(board, i, ai, opponent))
            .max()
            .unwrap_or(INVALID_SCORE)
    }
}

/// Count (own, opponent, empty) cells on a line
fn line_counts(board: &Board, line: &[usize; 3], own: Symbol, opponent: Symbol) -> (u8, u8, u8) {
    let mut counts = (0, 0, 0);
    for &i in line {
        match board.get(i) {
            Some(s) if s == own => counts.0 += 1,
            Some(s) if s == opponent => counts.1 += 1,
            Some(Symbol::None) => counts.2 += 1,
            _ => {}
        }
    }
    counts
}

impl Strategy for UtilityStrategy {
    fn name(&self) -> &'static str {
        "utility"
    }

    fn choose_move(&mut self, board: &Board, ai: Symbol, opponent: Symbol) -> Option<usize> {
        let mut best: Option<(usize, i32)> = None;
        for index in board.empty_cells() {
            let score = Self::score_cell(board, index, ai, opponent);
            // Strict comparison keeps the lowest index on ties
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((index, score));
            }
        }
        best.map(|(index, _)| index)
    }

    fn should_slide(&mut self, board: &Board, ai: Symbol, opponent: Symbol) -> bool {
        let without = Self::best_score(board, ai, opponent);
        let with = SlideDirection::ALL
            .iter()
            .map(|&dir| Self::best_score(&board.apply_slide(dir), ai, opponent))
            .max()
            .unwrap_or(INVALID_SCORE);
        with > without
    }

    fn choose_slide_direction(
        &mut self,
        board: &Board,
        ai: Symbol,
        opponent: Symbol,
    ) -> SlideDirection {
        let mut best_dir = SlideDirection::Up;
        let mut best_score = INVALID_SCORE;
        for dir in SlideDirection::ALL {
            let score = Self::best_score(&board.apply_slide(dir), ai, opponent);
            if score > best_score {
                best_score = score;
                best_dir = dir;
            }
        }
        best_dir
    }
}

/// Baseline strategy: no scoring at all.
#[derive(Debug)]
pub struct RandomStrategy {
    rng: StdRng,
}

impl RandomStrategy {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for RandomStrategy {
    fn name(&self) -> &'static str {
        "random"
    }

    fn choose_move(&mut self, board: &Board, _ai: Symbol, _opponent: Symbol) -> Option<usize> {
        let empty: Vec<usize> = board.empty_cells().collect();
        empty.choose(&mut self.rng).copied()
    }

    fn should_slide(&mut self, _board: &Board, _ai: Symbol, _opponent: Symbol) -> bool {
        self.rng.gen_bool(RANDOM_SLIDE_CHANCE)
    }

    fn choose_slide_direction(
        &mut self,
        _board: &Board,
        _ai: Symbol,
        _opponent: Symbol,
    ) -> SlideDirection {
        SlideDirection::ALL[self.rng.gen_range(0..SlideDirection::ALL.len())]
    }
}

/// Bot difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotDifficulty {
    /// Random moves
    Easy,
    /// Utility scoring
    #[default]
    Hard,
}

impl fmt::Display for BotDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotDifficulty::Easy => f.write_str("easy"),
            BotDifficulty::Hard => f.write_str("hard"),
        }
    }
}

impl FromStr for BotDifficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" | "random" => Ok(BotDifficulty::Easy),
            "hard" | "utility" => Ok(BotDifficulty::Hard),
            other => Err(format!("unknown bot difficulty: {other}")),
        }
    }
}

/// What the bot wants to do on its turn: an optional slide, then a cell
/// chosen on the board as it stands after that slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiPlan {
    pub slide: Option<SlideDirection>,
    pub cell: Option<usize>,
}

/// An AI player seated with a symbol
pub struct Bot {
    pub symbol: Symbol,
    strategy: Box<dyn Strategy>,
}

impl Bot {
    pub fn new(symbol: Symbol, difficulty: BotDifficulty) -> Self {
        let strategy: Box<dyn Strategy> = match difficulty {
            BotDifficulty::Easy => Box::new(RandomStrategy::new()),
            BotDifficulty::Hard => Box::new(UtilityStrategy::new()),
        };
        Self { symbol, strategy }
    }

    pub fn with_seed(symbol: Symbol, difficulty: BotDifficulty, seed: u64) -> Self {
        let strategy: Box<dyn Strategy> = match difficulty {
            BotDifficulty::Easy => Box::new(RandomStrategy::with_seed(seed)),
            BotDifficulty::Hard => Box::new(UtilityStrategy::new()),
        };
        Self { symbol, strategy }
    }

    pub fn with_strategy(symbol: Symbol, strategy: impl Strategy + 'static) -> Self {
        Self {
            symbol,
            strategy: Box::new(strategy),
        }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Decide a full turn on `board`.
    pub fn plan(&mut self, board: &Board, slide_available: bool) -> AiPlan {
        let opponent = self.symbol.opponent();

        let slide = if slide_available && self.strategy.should_slide(board, self.symbol, opponent)
        {
            Some(
                self.strategy
                    .choose_slide_direction(board, self.symbol, opponent),
            )
        } else {
            None
        };

        let board = slide.map_or(*board, |dir| board.apply_slide(dir));
        let cell = self.strategy.choose_move(&board, self.symbol, opponent);

        debug!(
            strategy = self.strategy.name(),
            symbol = %self.symbol,
            ?slide,
            ?cell,
            "bot planned turn"
        );

        AiPlan { slide, cell }
    }
}

impl fmt::Debug for Bot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bot")
            .field("symbol", &self.symbol)
            .field("strategy", &self.strategy.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const N: Symbol = Symbol::None;
    const X: Symbol = Symbol::X;
    const O: Symbol = Symbol::O;

    #[test]
    fn test_blocks_open_row() {
        let board = Board::from_cells([X, X, N, N, N, N, N, N, N]);
        let mut ai = UtilityStrategy::new();
        assert_eq!(ai.choose_move(&board, O, X), Some(2));
    }

    #[test]
    fn test_win_beats_block() {
        let board = Board::from_cells([X, X, N, O, O, N, N, N, N]);
        let mut ai = UtilityStrategy::new();
        assert_eq!(ai.choose_move(&board, X, O), Some(2));
    }

    #[test]
    fn test_full_board_has_no_move() {
        let board = Board::from_cells([X, O, X, X, O, O, O, X, X]);
        let mut ai = UtilityStrategy::new();
        assert_eq!(ai.choose_move(&board, X, O), None);
        assert!(!ai.should_slide(&board, X, O));
    }

    #[test]
    fn test_score_categories() {
        let board = Board::from_cells([X, X, N, O, N, N, N, N, N]);

        assert_eq!(
            UtilityStrategy::score_cell(&board, 2, X, O),
            WIN_SCORE + CORNER_SCORE
        );
        assert_eq!(
            UtilityStrategy::score_cell(&board, 2, O, X),
            BLOCK_SCORE + CORNER_SCORE
        );
        // O at 4 next to O at 3 leaves 5 open
        assert_eq!(
            UtilityStrategy::score_cell(&board, 4, O, X),
            SETUP_SCORE + CENTER_SCORE
        );
        assert_eq!(UtilityStrategy::score_cell(&board, 0, O, X), INVALID_SCORE);
    }

    #[test]
    fn test_existing_block_lifts_every_free_cell() {
        // Row 0 is already blocked, so any O placement counts as a block
        let board = Board::from_cells([X, X, O, N, N, N, N, N, N]);

        assert_eq!(
            UtilityStrategy::score_cell(&board, 3, O, X),
            BLOCK_SCORE + OTHER_SCORE
        );
        assert_eq!(
            UtilityStrategy::score_cell(&board, 4, O, X),
            BLOCK_SCORE + CENTER_SCORE
        );
        // Block outranks the setup O at 6 would otherwise make on the
        // anti-diagonal
        assert_eq!(
            UtilityStrategy::score_cell(&board, 6, O, X),
            BLOCK_SCORE + CORNER_SCORE
        );
    }

    #[test]
    fn test_empty_board_prefers_center() {
        let mut ai = UtilityStrategy::new();
        assert_eq!(ai.choose_move(&Board::new(), X, O), Some(4));
    }

    #[test]
    fn test_ties_keep_lowest_index() {
        // Center taken, all four corners score the same
        let board = Board::from_cells([N, N, N, N, X, N, N, N, N]);
        let mut ai = UtilityStrategy::new();
        assert_eq!(ai.choose_move(&board, O, X), Some(0));
    }

    #[test]
    fn test_slides_into_a_win() {
        // Sliding down lines X up on the anti-diagonal with 2 open
        let board = Board::from_cells([N, X, N, N, O, N, X, N, O]);
        let mut ai = UtilityStrategy::new();

        assert!(ai.should_slide(&board, X, O));
        assert_eq!(ai.choose_slide_direction(&board, X, O), SlideDirection::Down);

        let mut bot = Bot::with_strategy(X, UtilityStrategy::new());
        let plan = bot.plan(&board, true);
        assert_eq!(plan.slide, Some(SlideDirection::Down));
        assert_eq!(plan.cell, Some(2));
    }

    #[test]
    fn test_no_slide_when_already_winning() {
        let board = Board::from_cells([X, X, N, O, O, N, N, N, N]);
        let mut ai = UtilityStrategy::new();
        assert!(!ai.should_slide(&board, X, O));
    }

    #[test]
    fn test_plan_skips_slide_when_unavailable() {
        let board = Board::from_cells([N, X, N, N, O, N, X, N, O]);
        let mut bot = Bot::new(X, BotDifficulty::Hard);
        let plan = bot.plan(&board, false);
        assert_eq!(plan.slide, None);
        // Block O's diagonal
        assert_eq!(plan.cell, Some(0));
    }

    #[test]
    fn test_random_strategy_picks_empty_cells() {
        let board = Board::from_cells([X, O, X, N, O, N, O, X, N]);
        let mut ai = RandomStrategy::with_seed(7);
        for _ in 0..50 {
            let cell = ai.choose_move(&board, X, O).unwrap();
            assert!(board.is_empty_cell(cell));
        }
    }

    #[test]
    fn test_random_strategy_full_board() {
        let board = Board::from_cells([X, O, X, X, O, O, O, X, X]);
        let mut ai = RandomStrategy::with_seed(1);
        assert_eq!(ai.choose_move(&board, O, X), None);
    }

    #[test]
    fn test_random_slide_rate_is_occasional() {
        let mut ai = RandomStrategy::with_seed(42);
        let board = Board::new();
        let slides = (0..1000)
            .filter(|_| ai.should_slide(&board, X, O))
            .count();
        assert!((100..300).contains(&slides), "slid {slides} times");
    }

    #[test]
    fn test_seeded_bots_agree() {
        let board = Board::from_cells([X, N, N, N, O, N, N, N, N]);
        let mut a = Bot::with_seed(X, BotDifficulty::Easy, 99);
        let mut b = Bot::with_seed(X, BotDifficulty::Easy, 99);
        for _ in 0..10 {
            assert_eq!(a.plan(&board, true), b.plan(&board, true));
        }
    }

    #[test]
    fn test_difficulty_parsing() {
        assert_eq!("Easy".parse::<BotDifficulty>(), Ok(BotDifficulty::Easy));
        assert_eq!("hard".parse::<BotDifficulty>(), Ok(BotDifficulty::Hard));
        assert!("nightmare".parse::<BotDifficulty>().is_err());
    }
}
