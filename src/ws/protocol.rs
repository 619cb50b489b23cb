//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};

use crate::game::snapshot::StateDelta;
use crate::game::state::{GameState, PlayerInput, Slot};

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Join (or create) a room
    #[serde(rename_all = "camelCase")]
    JoinRoom { room_id: String },

    /// Latest input snapshot for a room the client has joined
    #[serde(rename_all = "camelCase")]
    Input {
        room_id: String,
        #[serde(default)]
        input: PlayerInput,
    },
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMsg {
    /// Sent to a joining client only
    #[serde(rename_all = "camelCase")]
    Init {
        /// Assigned slot
        player_index: Slot,
        state: GameState,
    },

    /// Room already has two occupants
    RoomFull,

    /// Sent to both occupants once the room is full
    StartGame { state: GameState },

    /// Changed fields since the previous update
    Update {
        /// Unix milliseconds
        timestamp: u64,
        delta: StateDelta,
    },

    /// The other occupant disconnected
    PlayerLeft,

    /// A player's hp reached 0
    GameOver { winner: Slot },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_join_room() {
        let msg: ClientMsg = serde_json::from_str(r#"{"type":"joinRoom","roomId":"r1"}"#).unwrap();
        match msg {
            ClientMsg::JoinRoom { room_id } => assert_eq!(room_id, "r1"),
            other => panic!("Unexpected message: {:?}", other),
        }
    }

    #[test]
    fn parses_input_with_partial_flags() {
        let json = r#"{"type":"input","roomId":"r1","input":{"left":true}}"#;
        let msg: ClientMsg = serde_json::from_str(json).unwrap();
        match msg {
            ClientMsg::Input { room_id, input } => {
                assert_eq!(room_id, "r1");
                assert!(input.left);
                assert!(!input.fire);
            }
            other => panic!("Unexpected message: {:?}", other),
        }
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(serde_json::from_str::<ClientMsg>(r#"{"type":"ping"}"#).is_err());
    }

    #[test]
    fn server_messages_use_client_event_names() {
        let init = serde_json::to_value(ServerMsg::Init {
            player_index: 1,
            state: GameState::new(),
        })
        .unwrap();
        assert_eq!(init["type"], "init");
        assert_eq!(init["playerIndex"], 1);
        assert_eq!(init["state"]["players"][0]["hp"], 50);

        let full = serde_json::to_value(ServerMsg::RoomFull).unwrap();
        assert_eq!(full, serde_json::json!({ "type": "roomFull" }));

        let over = serde_json::to_value(ServerMsg::GameOver { winner: 0 }).unwrap();
        assert_eq!(over, serde_json::json!({ "type": "gameOver", "winner": 0 }));

        let start = serde_json::to_value(ServerMsg::StartGame {
            state: GameState::new(),
        })
        .unwrap();
        assert_eq!(start["type"], "startGame");
    }
}
