//! WebSocket protocol messages for Slidetoe multiplayer.

use serde::{Deserialize, Serialize};
use slidetoe_core::{
    BotDifficulty, GameMode, GameResult, GameSnapshot, SessionStatus, SlideDirection, Symbol,
};
use uuid::Uuid;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Create a new game room
    CreateRoom {
        player_name: String,
        mode: GameMode,
        /// Opponent for single-player rooms; server default when absent
        #[serde(default)]
        bot: Option<BotDifficulty>,
    },

    /// Join an existing room
    JoinRoom { room_id: Uuid, player_name: String },

    /// Leave current room
    LeaveRoom,

    /// Place a mark on a cell
    PlaceMark { cell: usize },

    /// Spend this match's slide
    Slide { direction: SlideDirection },

    /// Vote for a rematch
    RequestRestart,

    /// Request room list
    ListRooms,

    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Welcome message with assigned player ID
    Welcome { player_id: Uuid },

    /// Room created successfully
    RoomCreated { room_id: Uuid },

    /// Joined room successfully
    JoinedRoom { room: RoomInfo, symbol: Symbol },

    /// Left room successfully
    LeftRoom,

    /// Room state updated (player joined/left)
    RoomUpdated { room: RoomInfo },

    /// Full game state
    GameState { state: GameSnapshot },

    /// The board was slid (transient, for feedback)
    BoardSlid {
        symbol: Symbol,
        direction: SlideDirection,
    },

    /// A rematch vote was counted
    RestartProgress { votes: usize, needed: usize },

    /// Board cleared for a rematch
    GameReset { starting: Symbol },

    /// The action was not applied
    ActionRejected { reason: String },

    /// List of available rooms
    RoomList { rooms: Vec<RoomInfo> },

    /// Error occurred
    Error { message: String },

    /// Pong response
    Pong,

    /// Match finished
    GameOver { result: GameResult },
}

/// Room information for clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomInfo {
    pub id: Uuid,
    pub name: String,
    pub mode: GameMode,
    pub players: Vec<PlayerInfo>,
    pub host_id: Uuid,
    pub status: RoomStatus,
}

/// Player information in a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: Uuid,
    pub name: String,
    pub symbol: Option<Symbol>,
    pub connected: bool,
}

/// Room status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomStatus {
    Waiting,
    InGame,
    Finished,
}

impl From<SessionStatus> for RoomStatus {
    fn from(status: SessionStatus) -> Self {
        match status {
            SessionStatus::WaitingForPlayers => RoomStatus::Waiting,
            SessionStatus::Ongoing => RoomStatus::InGame,
            SessionStatus::Finished => RoomStatus::Finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_wire_format() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"Slide","payload":{"direction":"Left"}}"#).unwrap();
        assert!(matches!(
            msg,
            ClientMessage::Slide {
                direction: SlideDirection::Left
            }
        ));

        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"CreateRoom","payload":{"player_name":"Ann","mode":"SinglePlayer"}}"#,
        )
        .unwrap();
        assert!(matches!(
            msg,
            ClientMessage::CreateRoom {
                mode: GameMode::SinglePlayer,
                bot: None,
                ..
            }
        ));
    }

    #[test]
    fn test_negative_cell_is_malformed() {
        let parsed =
            serde_json::from_str::<ClientMessage>(r#"{"type":"PlaceMark","payload":{"cell":-1}}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_unit_messages() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"RequestRestart"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::RequestRestart));

        let text = serde_json::to_string(&ServerMessage::Pong).unwrap();
        assert_eq!(text, r#"{"type":"Pong"}"#);
    }
}
