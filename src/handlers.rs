use crate::app_state::AppState;
use crate::combat::BattleController;
use crate::models::{ClientMessage, ServerMessage};
use crate::sessions::SharedSession;
use axum::extract::ws::Utf8Bytes;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    Json,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

type SocketSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    "OK"
}

// Starter choices for the title screen
pub async fn starters_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.catalog.starters().to_vec())
}

// Handler for game websocket connections
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_game_socket(socket, state))
}

async fn send_message(sender: &SocketSender, message: &ServerMessage) -> bool {
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize message: {}", e);
            return false;
        }
    };

    if let Err(e) = sender.lock().await.send(Message::Text(Utf8Bytes::from(json))).await {
        warn!("Failed to send message: {}", e);
        return false;
    }
    true
}

// Forward battle snapshots to the client until the battle ends
fn spawn_battle_forwarder(controller: &BattleController, sender: SocketSender) -> JoinHandle<()> {
    let mut updates = controller.subscribe();
    let battle_id = controller.battle_id();

    tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(snapshot) => {
                    let result = snapshot_outcome(&snapshot);
                    if !send_message(&sender, &ServerMessage::BattleUpdate { snapshot }).await {
                        break;
                    }
                    if let Some(outcome) = result {
                        send_message(&sender, &ServerMessage::battle_end(outcome)).await;
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!("Battle {} forwarder skipped {} snapshots", battle_id, skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn snapshot_outcome(snapshot: &crate::combat::BattleSnapshot) -> Option<crate::combat::WildBattleOutcome> {
    use crate::combat::{BattlePhase, WildBattleOutcome};
    match snapshot.phase {
        BattlePhase::Active => None,
        BattlePhase::Victory => Some(WildBattleOutcome::Victory),
        BattlePhase::Defeat => Some(WildBattleOutcome::Defeat),
        BattlePhase::Captured => Some(WildBattleOutcome::Captured),
    }
}

fn stop_forwarder(forwarder: &mut Option<JoinHandle<()>>) {
    if let Some(handle) = forwarder.take() {
        handle.abort();
    }
}

async fn current_battle(session: &SharedSession) -> Option<BattleController> {
    session.lock().await.active_battle().cloned()
}

// Handle WebSocket connection for one game session
pub async fn handle_game_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();
    let sender: SocketSender = Arc::new(Mutex::new(sender));

    let (session_id, session) = state.sessions.insert(state.new_game_session());
    info!("Player connected with session {}", session_id);

    let welcome_msg = ServerMessage::Welcome {
        session_id,
        starters: state.catalog.starters().to_vec(),
    };
    if !send_message(&sender, &welcome_msg).await {
        state.sessions.remove(&session_id).await;
        return;
    }

    let mut forwarder: Option<JoinHandle<()>> = None;

    while let Some(Ok(msg)) = receiver.next().await {
        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        state.sessions.touch(&session_id);
        debug!("Received message from {}: {}", session_id, text);

        let reply = match serde_json::from_str::<ClientMessage>(&text) {
            Ok(message) => handle_client_message(message, &session, &sender, &mut forwarder).await,
            Err(e) => Some(ServerMessage::error(format!("Invalid message: {}", e))),
        };

        if let Some(reply) = reply {
            if !send_message(&sender, &reply).await {
                break;
            }
        }
    }

    stop_forwarder(&mut forwarder);
    state.sessions.remove(&session_id).await;
    info!("Player disconnected from session {}", session_id);
}

async fn handle_client_message(
    message: ClientMessage,
    session: &SharedSession,
    sender: &SocketSender,
    forwarder: &mut Option<JoinHandle<()>>,
) -> Option<ServerMessage> {
    match message {
        ClientMessage::StartGame { starter_id } => {
            let mut session = session.lock().await;
            Some(match session.start_new_game(&starter_id) {
                Ok(_) => ServerMessage::Overworld {
                    party: session.party_overview(),
                },
                Err(e) => ServerMessage::error(e),
            })
        }
        ClientMessage::Explore => {
            let controller = match session.lock().await.encounter_wild_monster() {
                Ok(controller) => controller,
                Err(e) => return Some(ServerMessage::error(e)),
            };
            stop_forwarder(forwarder);
            *forwarder = Some(spawn_battle_forwarder(&controller, sender.clone()));
            Some(ServerMessage::BattleUpdate {
                snapshot: controller.snapshot().await,
            })
        }
        ClientMessage::UseMove { move_index } => {
            let Some(controller) = current_battle(session).await else {
                return Some(ServerMessage::error("Not in a battle"));
            };
            // The controller rejects overlapping triggers while this one runs
            tokio::spawn(async move {
                controller.use_move(move_index).await;
            });
            None
        }
        ClientMessage::ThrowBall => {
            let Some(controller) = current_battle(session).await else {
                return Some(ServerMessage::error("Not in a battle"));
            };
            tokio::spawn(async move {
                controller.throw_ball().await;
            });
            None
        }
        ClientMessage::Continue => {
            let mut session = session.lock().await;
            match session.finish_battle().await {
                Ok(_) => {
                    stop_forwarder(forwarder);
                    Some(ServerMessage::Overworld {
                        party: session.party_overview(),
                    })
                }
                Err(e) => Some(ServerMessage::error(e)),
            }
        }
        ClientMessage::ExitToMenu => {
            session.lock().await.exit_to_menu().await;
            stop_forwarder(forwarder);
            Some(ServerMessage::Menu)
        }
        ClientMessage::Ping => Some(ServerMessage::Pong),
    }
}
