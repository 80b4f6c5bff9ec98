//! WebSocket server and connection handling.
//!
//! Every room lives behind a `DashMap` entry, and each action holds that
//! entry's lock for the whole validate-apply-snapshot step. Messages are
//! sent only after the lock is released.

use crate::config::ServerConfig;
use crate::protocol::{ClientMessage, RoomInfo, RoomStatus, ServerMessage};
use crate::room::{GameRoom, RoomError};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use slidetoe_core::{
    AiTicket, ErrorKind, GameAction, GameError, GameEvent, GameMode, GameSnapshot,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Server state shared across all connections.
pub struct ServerState {
    pub config: ServerConfig,
    /// All active rooms
    pub rooms: DashMap<Uuid, GameRoom>,
    /// Mapping from player ID to their room ID
    pub player_rooms: DashMap<Uuid, Uuid>,
    /// Mapping from player ID to their message sender
    pub player_senders: DashMap<Uuid, mpsc::UnboundedSender<ServerMessage>>,
}

impl ServerState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            rooms: DashMap::new(),
            player_rooms: DashMap::new(),
            player_senders: DashMap::new(),
        }
    }

    /// Send a message to a specific player.
    pub fn send_to_player(&self, player_id: Uuid, msg: ServerMessage) {
        if let Some(sender) = self.player_senders.get(&player_id) {
            let _ = sender.send(msg);
        }
    }

    /// Broadcast a message to all players in a room.
    pub fn broadcast_to_room(&self, room_id: Uuid, msg: ServerMessage) {
        let members: Vec<Uuid> = match self.rooms.get(&room_id) {
            Some(room) => room.players.keys().copied().collect(),
            None => return,
        };
        for player_id in members {
            self.send_to_player(player_id, msg.clone());
        }
    }

    /// Broadcast a message to all players in a room except one.
    pub fn broadcast_to_room_except(&self, room_id: Uuid, except: Uuid, msg: ServerMessage) {
        let members: Vec<Uuid> = match self.rooms.get(&room_id) {
            Some(room) => room.players.keys().copied().collect(),
            None => return,
        };
        for player_id in members.into_iter().filter(|&id| id != except) {
            self.send_to_player(player_id, msg.clone());
        }
    }

    /// Get list of multiplayer rooms still looking for an opponent.
    pub fn get_waiting_rooms(&self) -> Vec<RoomInfo> {
        self.rooms
            .iter()
            .filter(|r| r.mode() == GameMode::Multiplayer && r.status() == RoomStatus::Waiting)
            .map(|r| r.to_info())
            .collect()
    }

    fn room_of(&self, player_id: Uuid) -> Option<Uuid> {
        self.player_rooms.get(&player_id).map(|r| *r)
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}

/// Run the WebSocket server.
pub async fn run_server(state: Arc<ServerState>) -> anyhow::Result<()> {
    let addr = state.config.addr;
    let listener = TcpListener::bind(addr).await?;
    info!("Slidetoe server listening on {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Assign a player ID
    let player_id = Uuid::new_v4();

    // Create channel for outgoing messages
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.player_senders.insert(player_id, tx);

    // Send welcome message
    let welcome = ServerMessage::Welcome { player_id };
    let msg_text = serde_json::to_string(&welcome)?;
    ws_sender.send(Message::Text(msg_text)).await?;

    // Spawn task to forward messages from channel to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(text) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        }
    });

    // Handle incoming messages
    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => handle_message(player_id, client_msg, &state),
                Err(e) => {
                    warn!("Invalid message from {}: {} ({})", player_id, text, e);
                    state.send_to_player(
                        player_id,
                        ServerMessage::Error {
                            message: format!("Malformed message: {}", e),
                        },
                    );
                }
            },
            Ok(Message::Close(_)) => {
                info!("Client {} closing connection", player_id);
                break;
            }
            Ok(Message::Ping(_)) => {
                state.send_to_player(player_id, ServerMessage::Pong);
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", player_id, e);
                break;
            }
            _ => {}
        }
    }

    // Clean up on disconnect
    handle_disconnect(player_id, &state);
    state.player_senders.remove(&player_id);
    send_task.abort();

    info!("Connection closed for {}", player_id);
    Ok(())
}

/// Handle a client message.
fn handle_message(player_id: Uuid, msg: ClientMessage, state: &Arc<ServerState>) {
    match msg {
        ClientMessage::CreateRoom {
            player_name,
            mode,
            bot,
        } => {
            if state.player_rooms.contains_key(&player_id) {
                send_error(state, player_id, "Already in a room");
                return;
            }

            let room_id = Uuid::new_v4();
            let bot = bot.unwrap_or(state.config.default_bot);
            let room = match GameRoom::new(room_id, player_id, player_name, mode, bot) {
                Ok(room) => room,
                Err(e) => {
                    send_error(state, player_id, &e.to_string());
                    return;
                }
            };
            let room_info = room.to_info();
            let snapshot = room.snapshot();
            let symbol = room.session.symbol_of(player_id);

            state.rooms.insert(room_id, room);
            state.player_rooms.insert(player_id, room_id);
            info!(%room_id, ?mode, "room created");

            state.send_to_player(player_id, ServerMessage::RoomCreated { room_id });
            if let Some(symbol) = symbol {
                state.send_to_player(
                    player_id,
                    ServerMessage::JoinedRoom {
                        room: room_info,
                        symbol,
                    },
                );
            }
            state.send_to_player(player_id, ServerMessage::GameState { state: snapshot });
            schedule_ai_turn(state, room_id);
        }

        ClientMessage::JoinRoom {
            room_id,
            player_name,
        } => {
            if state.player_rooms.contains_key(&player_id) {
                send_error(state, player_id, "Already in a room");
                return;
            }

            let joined = match state.rooms.get_mut(&room_id) {
                Some(mut room) => room
                    .add_player(player_id, player_name)
                    .map(|_| (room.to_info(), room.snapshot(), room.session.symbol_of(player_id))),
                None => {
                    send_error(state, player_id, "Room not found");
                    return;
                }
            };

            match joined {
                Ok((room_info, snapshot, symbol)) => {
                    state.player_rooms.insert(player_id, room_id);
                    if let Some(symbol) = symbol {
                        state.send_to_player(
                            player_id,
                            ServerMessage::JoinedRoom {
                                room: room_info.clone(),
                                symbol,
                            },
                        );
                    }

                    // Notify other players
                    state.broadcast_to_room_except(
                        room_id,
                        player_id,
                        ServerMessage::RoomUpdated { room: room_info },
                    );
                    state.broadcast_to_room(room_id, ServerMessage::GameState { state: snapshot });
                    schedule_ai_turn(state, room_id);
                }
                Err(e) => send_error(state, player_id, &e.to_string()),
            }
        }

        ClientMessage::LeaveRoom => {
            if let Some((_, room_id)) = state.player_rooms.remove(&player_id) {
                leave_room(player_id, room_id, state);
                state.send_to_player(player_id, ServerMessage::LeftRoom);
            }
        }

        ClientMessage::PlaceMark { cell } => {
            handle_game_action(player_id, GameAction::PlaceMark(cell), state)
        }

        ClientMessage::Slide { direction } => {
            handle_game_action(player_id, GameAction::Slide(direction), state)
        }

        ClientMessage::RequestRestart => {
            handle_game_action(player_id, GameAction::RequestRestart, state)
        }

        ClientMessage::ListRooms => {
            let rooms = state.get_waiting_rooms();
            state.send_to_player(player_id, ServerMessage::RoomList { rooms });
        }

        ClientMessage::Ping => {
            state.send_to_player(player_id, ServerMessage::Pong);
        }
    }
}

fn send_error(state: &ServerState, player_id: Uuid, message: &str) {
    state.send_to_player(
        player_id,
        ServerMessage::Error {
            message: message.to_string(),
        },
    );
}

/// Apply an in-game action and publish the outcome.
fn handle_game_action(player_id: Uuid, action: GameAction, state: &Arc<ServerState>) {
    let Some(room_id) = state.room_of(player_id) else {
        send_error(state, player_id, "Not in a room");
        return;
    };

    let outcome = match state.rooms.get_mut(&room_id) {
        Some(mut room) => room
            .apply_action(player_id, action)
            .map(|events| (events, room.snapshot())),
        None => return,
    };

    match outcome {
        Ok((events, snapshot)) => {
            publish(state, room_id, &events, snapshot);
            schedule_ai_turn(state, room_id);
        }
        Err(RoomError::Game(e)) => report_game_error(state, player_id, &action, e),
        Err(e) => send_error(state, player_id, &e.to_string()),
    }
}

fn report_game_error(state: &ServerState, player_id: Uuid, action: &GameAction, e: GameError) {
    match e.kind() {
        ErrorKind::InvalidRequest => {
            warn!(%player_id, ?action, error = %e, "invalid request");
            send_error(state, player_id, &e.to_string());
        }
        ErrorKind::Rejected => {
            debug!(%player_id, ?action, error = %e, "action not applied");
            state.send_to_player(
                player_id,
                ServerMessage::ActionRejected {
                    reason: e.to_string(),
                },
            );
        }
    }
}

/// Broadcast the new state followed by one message per transient event.
fn publish(state: &ServerState, room_id: Uuid, events: &[GameEvent], snapshot: GameSnapshot) {
    state.broadcast_to_room(room_id, ServerMessage::GameState { state: snapshot });

    for event in events {
        let msg = match *event {
            GameEvent::SlideDirectionChanged { symbol, direction } => {
                ServerMessage::BoardSlid { symbol, direction }
            }
            GameEvent::RestartRequested { votes, needed, .. } => {
                ServerMessage::RestartProgress { votes, needed }
            }
            GameEvent::GameReset { starting } => ServerMessage::GameReset { starting },
            GameEvent::GameFinished { result } => ServerMessage::GameOver { result },
            GameEvent::PlayerJoined { .. }
            | GameEvent::MarkPlaced { .. }
            | GameEvent::TurnChanged { .. } => continue,
        };
        state.broadcast_to_room(room_id, msg);
    }
}

/// If the AI owes a turn, play it after the configured delay.
fn schedule_ai_turn(state: &Arc<ServerState>, room_id: Uuid) {
    let Some(mut room) = state.rooms.get_mut(&room_id) else {
        return;
    };
    let Some(ticket) = room.pending_ai_turn() else {
        return;
    };

    let delay = state.config.ai_delay;
    let task_state = Arc::clone(state);
    let handle = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        run_ai_turn(&task_state, room_id, ticket);
    });
    room.set_ai_task(handle.abort_handle());
    debug!(%room_id, ?delay, "AI turn scheduled");
}

fn run_ai_turn(state: &Arc<ServerState>, room_id: Uuid, ticket: AiTicket) {
    let outcome = match state.rooms.get_mut(&room_id) {
        Some(mut room) => room
            .run_ai_turn(ticket)
            .map(|events| (events, room.snapshot())),
        None => return,
    };

    match outcome {
        Ok((events, snapshot)) => {
            publish(state, room_id, &events, snapshot);
            schedule_ai_turn(state, room_id);
        }
        Err(e) => debug!(%room_id, error = %e, "AI turn dropped"),
    }
}

/// Remove a player from a room, dropping the room once it is empty.
fn leave_room(player_id: Uuid, room_id: Uuid, state: &Arc<ServerState>) {
    let remaining = match state.rooms.get_mut(&room_id) {
        Some(mut room) => match room.remove_player(player_id) {
            Ok(true) => None,
            Ok(false) => Some((room.to_info(), room.snapshot())),
            Err(e) => {
                warn!(%room_id, %player_id, error = %e, "failed to reseat room");
                Some((room.to_info(), room.snapshot()))
            }
        },
        None => return,
    };

    match remaining {
        None => {
            state.rooms.remove(&room_id);
            info!(%room_id, "room closed");
        }
        Some((room_info, snapshot)) => {
            state.broadcast_to_room(room_id, ServerMessage::RoomUpdated { room: room_info });
            state.broadcast_to_room(room_id, ServerMessage::GameState { state: snapshot });
            schedule_ai_turn(state, room_id);
        }
    }
}

/// Handle player disconnect.
fn handle_disconnect(player_id: Uuid, state: &Arc<ServerState>) {
    let Some((_, room_id)) = state.player_rooms.remove(&player_id) else {
        return;
    };

    let in_game = state
        .rooms
        .get(&room_id)
        .is_some_and(|room| room.mode() == GameMode::Multiplayer && room.status() != RoomStatus::Waiting);

    if !in_game {
        // Remove player if the game hasn't started or nobody else can play on
        leave_room(player_id, room_id, state);
        return;
    }

    // Mark player as disconnected instead of removing during game
    let update = match state.rooms.get_mut(&room_id) {
        Some(mut room) => {
            room.set_player_connected(player_id, false);
            room.any_connected().then(|| room.to_info())
        }
        None => return,
    };

    match update {
        Some(room_info) => {
            state.broadcast_to_room(room_id, ServerMessage::RoomUpdated { room: room_info })
        }
        None => {
            state.rooms.remove(&room_id);
            info!(%room_id, "room closed, everyone disconnected");
        }
    }
}
