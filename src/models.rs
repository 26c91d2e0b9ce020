use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::combat::{BattleSnapshot, WildBattleOutcome};
use crate::monsters::{DisplayMonster, MonsterTemplate};

// Client messages
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "start_game")]
    StartGame { starter_id: String },
    #[serde(rename = "explore")]
    Explore,
    #[serde(rename = "use_move")]
    UseMove { move_index: usize },
    #[serde(rename = "throw_ball")]
    ThrowBall,
    #[serde(rename = "continue")]
    Continue,
    #[serde(rename = "exit_to_menu")]
    ExitToMenu,
    #[serde(rename = "ping")]
    Ping,
}

// Server messages
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "welcome")]
    Welcome { session_id: Uuid, starters: Vec<MonsterTemplate> },
    #[serde(rename = "overworld")]
    Overworld { party: Vec<DisplayMonster> },
    #[serde(rename = "battle_update")]
    BattleUpdate { snapshot: BattleSnapshot },
    #[serde(rename = "battle_end")]
    BattleEnd { outcome: WildBattleOutcome, message: String },
    #[serde(rename = "menu")]
    Menu,
    #[serde(rename = "error")]
    Error { message: String },
    #[serde(rename = "pong")]
    Pong,
}

impl ServerMessage {
    pub fn error(message: impl ToString) -> Self {
        ServerMessage::Error { message: message.to_string() }
    }

    pub fn battle_end(outcome: WildBattleOutcome) -> Self {
        ServerMessage::BattleEnd {
            outcome,
            message: outcome.message().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(r#"{"type":"start_game","starter_id":"1"}"#, ClientMessage::StartGame { starter_id: "1".to_string() })]
    #[case(r#"{"type":"explore"}"#, ClientMessage::Explore)]
    #[case(r#"{"type":"use_move","move_index":1}"#, ClientMessage::UseMove { move_index: 1 })]
    #[case(r#"{"type":"throw_ball"}"#, ClientMessage::ThrowBall)]
    #[case(r#"{"type":"continue"}"#, ClientMessage::Continue)]
    #[case(r#"{"type":"exit_to_menu"}"#, ClientMessage::ExitToMenu)]
    #[case(r#"{"type":"ping"}"#, ClientMessage::Ping)]
    fn client_messages_parse(#[case] json: &str, #[case] expected: ClientMessage) {
        assert_eq!(serde_json::from_str::<ClientMessage>(json).unwrap(), expected);
    }

    #[test]
    fn battle_end_carries_outcome_banner() {
        let json = serde_json::to_value(ServerMessage::battle_end(WildBattleOutcome::Captured)).unwrap();
        assert_eq!(json["type"], "battle_end");
        assert_eq!(json["outcome"], "captured");
        assert_eq!(json["message"], "A new friend joins your party.");
    }

    #[test]
    fn unknown_client_message_is_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"fly"}"#).is_err());
    }
}
