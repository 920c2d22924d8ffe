use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::api::MoveAnalysisResponse;

/// Message sent from the page to the server
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ClientMessage {
    pub message_type: String,
    pub mode: Option<Mode>,
    pub move_from: Option<String>,
    pub move_to: Option<String>,
    pub promote_to: Option<String>,
    pub index: Option<i64>,
    pub pgn: Option<String>,
    pub question: Option<String>,
}

/// Message sent from the server to the page
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ServerMessage {
    pub message_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<Box<SessionView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServerMessage {
    pub fn state(view: SessionView) -> Self {
        ServerMessage {
            message_type: "state".to_string(),
            state: Some(Box::new(view)),
            error: None,
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        ServerMessage {
            message_type: "error".to_string(),
            state: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Analyze,
    Play,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Last move information
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LastMove {
    pub from: String,
    pub to: String,
}

/// One entry of the move list
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MoveEntry {
    pub index: usize,
    pub label: Option<String>,
    pub san: String,
    pub uci: String,
}

/// What the move-analysis panel shows
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum MoveAnalysisView {
    Ready {
        #[serde(flatten)]
        analysis: MoveAnalysisResponse,
        evaluation_text: String,
    },
    Failed {
        error: String,
    },
}

/// Everything the page renders, sent after every change
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SessionView {
    pub mode: Mode,
    pub fen: String,
    pub side_to_move: String,
    pub game_status: String,
    pub game_over: bool,
    pub game_over_reason: Option<String>,
    pub last_move: Option<LastMove>,
    pub moves: Vec<MoveEntry>,
    pub current_index: i64,
    pub can_go_back: bool,
    pub can_go_forward: bool,
    pub loading: bool,
    pub analyzing: bool,
    pub analysis: Option<Value>,
    pub move_analysis: Option<MoveAnalysisView>,
    pub chat: Vec<ChatMessage>,
    pub game_info: Vec<(String, String)>,
    pub notice: Option<String>,
}

