//! Request and response bodies of the analysis backend's HTTP API.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EngineMoveRequest {
    pub fen: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EngineMoveResponse {
    #[serde(default)]
    pub best_move: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AnalyzePositionRequest {
    pub fen: String,
    pub previous_moves: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MoveAnalysisRequest {
    pub fen: String,
    pub move_number: u32,
    pub move_color: String,
    pub previous_moves: String,
}

/// Engine evaluation in centipawns or moves to mate, tagged by `type`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Evaluation {
    Cp(i64),
    Mate(i64),
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluation::Cp(centipawns) => {
                let pawns = *centipawns as f64 / 100.0;
                if *centipawns > 0 {
                    write!(f, "+{:.2}", pawns)
                } else {
                    write!(f, "{:.2}", pawns)
                }
            }
            Evaluation::Mate(moves) => write!(f, "Mate in {}", moves),
        }
    }
}

/// Display text for an optional evaluation.
pub fn format_evaluation(evaluation: Option<&Evaluation>) -> String {
    evaluation.map_or_else(|| "N/A".to_string(), Evaluation::to_string)
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EngineAnalysis {
    #[serde(default)]
    pub evaluation: Option<Evaluation>,
    #[serde(default)]
    pub best_move: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Reply of `get_move_analysis`. The backend names the engine and the
/// commentary model after the services it uses.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MoveAnalysisResponse {
    pub move_number: u32,
    pub move_color: String,
    #[serde(default)]
    pub stockfish: Option<EngineAnalysis>,
    #[serde(default)]
    pub gemini: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fen: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AnalyzePgnRequest {
    pub pgn: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub fen: String,
    pub question: String,
    pub previous_moves: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatResponse {
    pub response: String,
}

/// Body of a non-success reply.
#[derive(Deserialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}

/// A call to make against the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendRequest {
    EngineMove(EngineMoveRequest),
    AnalyzePosition(AnalyzePositionRequest),
    MoveAnalysis(MoveAnalysisRequest),
    AnalyzePgn(AnalyzePgnRequest),
    Chat(ChatRequest),
}

impl BackendRequest {
    pub fn endpoint(&self) -> &'static str {
        match self {
            BackendRequest::EngineMove(_) => "get_stockfish_move",
            BackendRequest::AnalyzePosition(_) => "analyze_position",
            BackendRequest::MoveAnalysis(_) => "get_move_analysis",
            BackendRequest::AnalyzePgn(_) => "analyze_pgn",
            BackendRequest::Chat(_) => "chat_analysis",
        }
    }
}

/// The decoded reply to a `BackendRequest`. Position and PGN analyses are
/// passed through to the page untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendReply {
    EngineMove(EngineMoveResponse),
    PositionAnalysis(Value),
    MoveAnalysis(MoveAnalysisResponse),
    PgnAnalysis(Value),
    Chat(ChatResponse),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn formats_evaluations() {
        assert_eq!(Evaluation::Cp(35).to_string(), "+0.35");
        assert_eq!(Evaluation::Cp(-150).to_string(), "-1.50");
        assert_eq!(Evaluation::Cp(0).to_string(), "0.00");
        assert_eq!(Evaluation::Mate(3).to_string(), "Mate in 3");
        assert_eq!(format_evaluation(None), "N/A");
    }

    #[test]
    fn decodes_move_analysis() {
        let body = json!({
            "move_number": 12,
            "move_color": "Black",
            "fen": "8/8/8/8/8/8/8/8 w - - 0 1",
            "stockfish": {"evaluation": {"type": "mate", "value": -2}, "best_move": "d8h4"},
            "gemini": "**Black** is winning.",
            "previous_moves": "e2e4"
        });
        let analysis: MoveAnalysisResponse = serde_json::from_value(body).unwrap();
        assert_eq!(analysis.move_number, 12);
        let engine = analysis.stockfish.unwrap();
        assert_eq!(engine.evaluation, Some(Evaluation::Mate(-2)));
        assert_eq!(engine.best_move.as_deref(), Some("d8h4"));
        assert_eq!(analysis.gemini.as_deref(), Some("**Black** is winning."));
    }

    #[test]
    fn engine_move_may_be_null() {
        let reply: EngineMoveResponse = serde_json::from_value(json!({"best_move": null})).unwrap();
        assert_eq!(reply.best_move, None);
        let reply: EngineMoveResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(reply.best_move, None);
    }

    #[test]
    fn requests_serialize_with_backend_field_names() {
        let request = MoveAnalysisRequest {
            fen: "fen".to_string(),
            move_number: 3,
            move_color: "White".to_string(),
            previous_moves: "e2e4 e7e5".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"fen": "fen", "move_number": 3, "move_color": "White", "previous_moves": "e2e4 e7e5"})
        );
    }
}
