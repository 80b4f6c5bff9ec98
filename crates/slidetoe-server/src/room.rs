//! Game room management.

use slidetoe_core::{
    AiTicket, BotDifficulty, GameAction, GameError, GameEvent, GameMode, GameSession,
    GameSnapshot,
};
use std::collections::HashMap;
use thiserror::Error;
use tokio::task::AbortHandle;
use uuid::Uuid;

use crate::protocol::{PlayerInfo, RoomInfo, RoomStatus};

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("Room is full")]
    RoomFull,

    #[error("Player not in room")]
    PlayerNotInRoom,

    #[error(transparent)]
    Game(#[from] GameError),
}

/// A player in a game room.
#[derive(Debug, Clone)]
pub struct RoomPlayer {
    pub id: Uuid,
    pub name: String,
    pub connected: bool,
}

impl RoomPlayer {
    pub fn new(id: Uuid, name: String) -> Self {
        Self {
            id,
            name,
            connected: true,
        }
    }
}

/// A room hosting one game session.
pub struct GameRoom {
    pub id: Uuid,
    pub name: String,
    pub host_id: Uuid,
    pub players: HashMap<Uuid, RoomPlayer>,
    /// Join order; the first seated player plays X
    pub player_order: Vec<Uuid>,
    pub session: GameSession,
    /// Deferred AI turn waiting on its pacing delay
    ai_task: Option<AbortHandle>,
}

impl GameRoom {
    pub fn new(
        id: Uuid,
        host_id: Uuid,
        host_name: String,
        mode: GameMode,
        bot: BotDifficulty,
    ) -> Result<Self, RoomError> {
        let mut session = match mode {
            GameMode::SinglePlayer => GameSession::single_player(bot),
            GameMode::Multiplayer => GameSession::multiplayer(),
        };
        session.join(host_id)?;

        let mut players = HashMap::new();
        players.insert(host_id, RoomPlayer::new(host_id, host_name.clone()));

        Ok(Self {
            id,
            name: format!("{}'s Game", host_name),
            host_id,
            players,
            player_order: vec![host_id],
            session,
            ai_task: None,
        })
    }

    pub fn mode(&self) -> GameMode {
        self.session.mode()
    }

    pub fn status(&self) -> RoomStatus {
        self.session.status().into()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_full(&self) -> bool {
        let seats = match self.mode() {
            GameMode::SinglePlayer => 1,
            GameMode::Multiplayer => 2,
        };
        self.players.len() >= seats
    }

    pub fn add_player(
        &mut self,
        player_id: Uuid,
        name: String,
    ) -> Result<Vec<GameEvent>, RoomError> {
        if self.is_full() {
            return Err(RoomError::RoomFull);
        }

        let events = self.session.join(player_id)?;
        self.players.insert(player_id, RoomPlayer::new(player_id, name));
        self.player_order.push(player_id);
        Ok(events)
    }

    /// Remove a player and reseat whoever is left in join order.
    /// Returns true if the room is now empty.
    pub fn remove_player(&mut self, player_id: Uuid) -> Result<bool, RoomError> {
        if self.players.remove(&player_id).is_none() {
            return Err(RoomError::PlayerNotInRoom);
        }
        self.player_order.retain(|&id| id != player_id);

        // If host left, assign new host
        if player_id == self.host_id && !self.player_order.is_empty() {
            self.host_id = self.player_order[0];
        }

        self.cancel_ai_task();
        self.session.reset_participation();
        for &id in &self.player_order {
            self.session.join(id)?;
        }

        Ok(self.players.is_empty())
    }

    pub fn set_player_connected(&mut self, player_id: Uuid, connected: bool) {
        if let Some(player) = self.players.get_mut(&player_id) {
            player.connected = connected;
        }
    }

    pub fn any_connected(&self) -> bool {
        self.players.values().any(|p| p.connected)
    }

    pub fn apply_action(
        &mut self,
        player_id: Uuid,
        action: GameAction,
    ) -> Result<Vec<GameEvent>, RoomError> {
        if !self.players.contains_key(&player_id) {
            return Err(RoomError::PlayerNotInRoom);
        }

        let events = self.session.apply_action(player_id, action)?;

        if events
            .iter()
            .any(|e| matches!(e, GameEvent::GameReset { .. }))
        {
            self.cancel_ai_task();
        }

        Ok(events)
    }

    pub fn pending_ai_turn(&self) -> Option<AiTicket> {
        self.session.pending_ai_turn()
    }

    /// Track the task that will play the AI's turn, replacing any older one.
    pub fn set_ai_task(&mut self, handle: AbortHandle) {
        self.cancel_ai_task();
        self.ai_task = Some(handle);
    }

    pub fn cancel_ai_task(&mut self) {
        if let Some(handle) = self.ai_task.take() {
            handle.abort();
        }
    }

    /// Called from the AI task itself once its delay has elapsed.
    pub fn run_ai_turn(&mut self, ticket: AiTicket) -> Result<Vec<GameEvent>, RoomError> {
        self.ai_task = None;
        Ok(self.session.run_ai_turn(ticket)?)
    }

    pub fn snapshot(&self) -> GameSnapshot {
        self.session.snapshot()
    }

    pub fn to_info(&self) -> RoomInfo {
        RoomInfo {
            id: self.id,
            name: self.name.clone(),
            mode: self.mode(),
            players: self
                .player_order
                .iter()
                .filter_map(|id| self.players.get(id))
                .map(|p| PlayerInfo {
                    id: p.id,
                    name: p.name.clone(),
                    symbol: self.session.symbol_of(p.id),
                    connected: p.connected,
                })
                .collect(),
            host_id: self.host_id,
            status: self.status(),
        }
    }
}

impl Drop for GameRoom {
    fn drop(&mut self) {
        self.cancel_ai_task();
    }
}
