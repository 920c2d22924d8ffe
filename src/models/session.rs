//! Per-connection analysis state: the recorded line, the cursor into it,
//! and whatever the backend last said about the position on screen.
//!
//! The session never talks to the network itself. Actions that need the
//! backend return a [`Ticket`]; the caller runs the request and hands the
//! outcome back to [`AnalysisSession::resolve`].

use log::{debug, error, info, warn};
use serde_json::Value;

use crate::error::{BackendError, GameError};
use crate::game::notation::{move_from_squares, parse_promotion, parse_square, parse_uci};
use crate::game::utils::{color_label, color_to_string, get_game_status};
use crate::game::{parse_pgn, GameRecord, GameStatus, Position};
use crate::models::api::{
    format_evaluation, AnalyzePgnRequest, AnalyzePositionRequest, BackendReply, BackendRequest,
    ChatRequest, EngineMoveRequest, EngineMoveResponse, MoveAnalysisRequest,
};
use crate::models::messages::{
    ChatMessage, ChatRole, LastMove, Mode, MoveAnalysisView, MoveEntry, SessionView,
};

pub const CHAT_ERROR_REPLY: &str = "Sorry, I encountered an error analyzing this position.";
pub const MOVE_ANALYSIS_ERROR: &str = "Failed to fetch move analysis";
pub const EMPTY_PGN_NOTICE: &str = "Please enter PGN data";
pub const BUSY_NOTICE: &str = "Still waiting for the previous request";

/// A backend call issued by the session, with what it needs to decide
/// whether the reply still applies.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub generation: u64,
    pub fen: String,
    pub request: BackendRequest,
}

#[derive(Debug, Clone, Default)]
pub struct AnalysisSession {
    mode: Mode,
    record: GameRecord,
    cursor: Option<usize>,
    position: Position,
    analysis: Option<Value>,
    move_analysis: Option<MoveAnalysisView>,
    chat: Vec<ChatMessage>,
    loading: bool,
    pending_analyses: usize,
    notice: Option<String>,
    generation: u64,
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn record(&self) -> &GameRecord {
        &self.record
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn chat(&self) -> &[ChatMessage] {
        &self.chat
    }

    pub fn analysis(&self) -> Option<&Value> {
        self.analysis.as_ref()
    }

    pub fn move_analysis(&self) -> Option<&MoveAnalysisView> {
        self.move_analysis.as_ref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_analyzing(&self) -> bool {
        self.pending_analyses > 0
    }

    pub fn status(&self) -> GameStatus {
        self.record.status_at(self.cursor).unwrap_or_else(|_| {
            get_game_status(self.position.board(), self.position.halfmove_clock(), 1)
        })
    }

    /// Start over from the initial position. Replies to requests issued
    /// before the reset are ignored.
    pub fn reset(&mut self) {
        let mode = self.mode;
        let generation = self.generation + 1;
        *self = AnalysisSession {
            mode,
            generation,
            ..AnalysisSession::default()
        };
        info!("Session reset (generation {})", generation);
    }

    /// Switching to play mode starts a fresh game.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        if mode == Mode::Play {
            self.reset();
        }
    }

    /// Play a move dropped on the board. In play mode the engine is asked
    /// to reply; in analyze mode the new position is sent for analysis.
    pub fn play_move(
        &mut self,
        from: &str,
        to: &str,
        promote_to: Option<&str>,
    ) -> Result<Option<Ticket>, GameError> {
        if self.mode == Mode::Play && self.loading {
            return Err(GameError::AwaitingEngine);
        }

        let from = parse_square(from)?;
        let to = parse_square(to)?;
        let promotion = promote_to.map(parse_promotion).transpose()?;
        let mv = move_from_squares(self.position.board(), from, to, promotion)?;
        self.record_move(mv)?;
        self.notice = None;

        Ok(match self.mode {
            Mode::Play => self.request_engine_move(),
            Mode::Analyze => Some(self.request_position_analysis()),
        })
    }

    /// Ask the engine for a move, unless one is already pending or the game
    /// is over.
    pub fn request_engine_move(&mut self) -> Option<Ticket> {
        if self.loading || self.status().is_over() {
            return None;
        }
        self.loading = true;
        Some(self.ticket(BackendRequest::EngineMove(EngineMoveRequest {
            fen: self.position.fen(),
        })))
    }

    fn request_position_analysis(&mut self) -> Ticket {
        self.pending_analyses += 1;
        self.ticket(BackendRequest::AnalyzePosition(AnalyzePositionRequest {
            fen: self.position.fen(),
            previous_moves: self.record.previous_moves(self.cursor),
        }))
    }

    /// Jump to the position after move `index`; any negative index is the
    /// starting position. Landing on a move asks for that move's analysis.
    pub fn go_to(&mut self, index: i64) -> Result<Option<Ticket>, GameError> {
        let cursor = if index < 0 {
            None
        } else {
            let index = index as usize;
            self.record.check_index(index)?;
            Some(index)
        };

        self.position = self.record.position_at(cursor)?;
        self.cursor = cursor;
        self.move_analysis = None;

        let Some(index) = cursor else {
            return Ok(None);
        };
        let Some(played) = self.record.moves().get(index) else {
            return Ok(None);
        };

        let request = MoveAnalysisRequest {
            fen: self.position.fen(),
            move_number: played.move_number,
            move_color: color_label(played.color).to_string(),
            previous_moves: self.record.previous_moves(cursor),
        };
        self.pending_analyses += 1;
        Ok(Some(self.ticket(BackendRequest::MoveAnalysis(request))))
    }

    pub fn go_first(&mut self) -> Result<Option<Ticket>, GameError> {
        if self.cursor.is_none() {
            return Ok(None);
        }
        self.go_to(-1)
    }

    pub fn go_previous(&mut self) -> Result<Option<Ticket>, GameError> {
        match self.cursor {
            Some(index) => self.go_to(index as i64 - 1),
            None => Ok(None),
        }
    }

    pub fn go_next(&mut self) -> Result<Option<Ticket>, GameError> {
        let next = self.cursor.map_or(0, |index| index + 1);
        if next >= self.record.len() {
            return Ok(None);
        }
        self.go_to(next as i64)
    }

    pub fn go_last(&mut self) -> Result<Option<Ticket>, GameError> {
        match self.record.last_index() {
            Some(last) if self.cursor != Some(last) => self.go_to(last as i64),
            _ => Ok(None),
        }
    }

    /// Send a PGN for analysis; the game itself is loaded when the reply
    /// arrives.
    pub fn load_pgn(&mut self, pgn: &str) -> Option<Ticket> {
        if pgn.trim().is_empty() {
            self.notice = Some(EMPTY_PGN_NOTICE.to_string());
            return None;
        }
        if self.loading {
            self.notice = Some(BUSY_NOTICE.to_string());
            return None;
        }
        self.loading = true;
        self.notice = None;
        Some(self.ticket(BackendRequest::AnalyzePgn(AnalyzePgnRequest {
            pgn: pgn.to_string(),
        })))
    }

    pub fn send_chat(&mut self, question: &str) -> Option<Ticket> {
        if question.trim().is_empty() {
            return None;
        }
        self.chat.push(ChatMessage {
            role: ChatRole::User,
            content: question.to_string(),
        });
        Some(self.ticket(BackendRequest::Chat(ChatRequest {
            fen: self.position.fen(),
            question: question.to_string(),
            previous_moves: self.record.previous_moves(self.cursor),
        })))
    }

    fn ticket(&self, request: BackendRequest) -> Ticket {
        Ticket {
            generation: self.generation,
            fen: self.position.fen(),
            request,
        }
    }

    fn record_move(&mut self, mv: chess::ChessMove) -> Result<(), GameError> {
        let index = self.record.play_at(self.cursor, mv)?;
        self.position = self.record.position_at(Some(index))?;
        self.cursor = Some(index);
        self.move_analysis = None;
        Ok(())
    }

    /// Apply the outcome of a ticket's request. Position-bound replies are
    /// dropped when the board has moved on since the request was made.
    pub fn resolve(&mut self, ticket: Ticket, reply: Result<BackendReply, BackendError>) {
        let endpoint = ticket.request.endpoint();
        if ticket.generation != self.generation {
            debug!("Dropping {} reply from before a reset", endpoint);
            return;
        }
        let current = ticket.fen == self.position.fen();

        match ticket.request {
            BackendRequest::EngineMove(_) => {
                self.loading = false;
                match reply {
                    Ok(BackendReply::EngineMove(response)) if current => {
                        self.apply_engine_move(response)
                    }
                    Ok(BackendReply::EngineMove(_)) => {
                        debug!("Dropping stale engine move for {}", ticket.fen)
                    }
                    Ok(other) => unexpected_reply(endpoint, &other),
                    Err(e) => {
                        error!("Stockfish move error: {}", e);
                        self.notice = Some(format!("Engine move failed: {}", e));
                    }
                }
            }
            BackendRequest::AnalyzePosition(_) => {
                self.pending_analyses = self.pending_analyses.saturating_sub(1);
                match reply {
                    Ok(BackendReply::PositionAnalysis(value)) if current => {
                        self.analysis = Some(value)
                    }
                    Ok(BackendReply::PositionAnalysis(_)) => {
                        debug!("Dropping stale analysis for {}", ticket.fen)
                    }
                    Ok(other) => unexpected_reply(endpoint, &other),
                    Err(e) => {
                        error!("Analysis error: {}", e);
                        self.notice = Some(format!("Analysis failed: {}", e));
                    }
                }
            }
            BackendRequest::MoveAnalysis(_) => {
                self.pending_analyses = self.pending_analyses.saturating_sub(1);
                match reply {
                    Ok(BackendReply::MoveAnalysis(analysis)) if current => {
                        let evaluation_text = format_evaluation(
                            analysis
                                .stockfish
                                .as_ref()
                                .and_then(|engine| engine.evaluation.as_ref()),
                        );
                        self.move_analysis = Some(MoveAnalysisView::Ready {
                            analysis,
                            evaluation_text,
                        });
                    }
                    Ok(BackendReply::MoveAnalysis(_)) => {
                        debug!("Dropping stale move analysis for {}", ticket.fen)
                    }
                    Ok(other) => unexpected_reply(endpoint, &other),
                    Err(e) => {
                        error!("Move analysis error: {}", e);
                        if current {
                            self.move_analysis = Some(MoveAnalysisView::Failed {
                                error: MOVE_ANALYSIS_ERROR.to_string(),
                            });
                        }
                    }
                }
            }
            BackendRequest::AnalyzePgn(request) => {
                self.loading = false;
                match reply {
                    Ok(BackendReply::PgnAnalysis(value)) => {
                        self.load_game(&request.pgn);
                        self.analysis = Some(value);
                    }
                    Ok(other) => unexpected_reply(endpoint, &other),
                    Err(e) => {
                        error!("PGN analysis error: {}", e);
                        self.notice = Some(format!("PGN analysis failed: {}", e));
                    }
                }
            }
            BackendRequest::Chat(_) => match reply {
                Ok(BackendReply::Chat(answer)) => self.chat.push(ChatMessage {
                    role: ChatRole::Assistant,
                    content: answer.response,
                }),
                Ok(other) => unexpected_reply(endpoint, &other),
                Err(e) => {
                    error!("Chat analysis error: {}", e);
                    self.chat.push(ChatMessage {
                        role: ChatRole::Assistant,
                        content: CHAT_ERROR_REPLY.to_string(),
                    });
                }
            },
        }
    }

    fn apply_engine_move(&mut self, response: EngineMoveResponse) {
        let Some(best_move) = response.best_move else {
            info!("Engine returned no move for {}", self.position.fen());
            return;
        };

        let result = parse_uci(self.position.board(), &best_move).and_then(|mv| self.record_move(mv));
        if let Err(e) = result {
            warn!("Could not play engine move {}: {}", best_move, e);
            self.notice = Some(e.to_string());
        }
    }

    fn load_game(&mut self, pgn: &str) {
        let loaded = parse_pgn(pgn).and_then(|game| GameRecord::from_pgn(&game));
        match loaded {
            Ok(record) => {
                let cursor = record.last_index();
                match record.position_at(cursor) {
                    Ok(position) => {
                        info!("Loaded PGN with {} moves", record.len());
                        self.record = record;
                        self.cursor = cursor;
                        self.position = position;
                        self.move_analysis = None;
                    }
                    Err(e) => self.pgn_failed(e),
                }
            }
            Err(e) => self.pgn_failed(e),
        }
    }

    fn pgn_failed(&mut self, e: GameError) {
        error!("PGN parse error: {}", e);
        self.notice = Some(e.to_string());
    }

    pub fn view(&self) -> SessionView {
        let status = self.status();
        let moves = self.record.moves();
        let current = self.cursor.and_then(|index| moves.get(index));

        SessionView {
            mode: self.mode,
            fen: self.position.fen(),
            side_to_move: color_to_string(self.position.side_to_move()),
            game_status: status.as_str().to_string(),
            game_over: status.is_over(),
            game_over_reason: status.banner().map(str::to_string),
            last_move: current.map(|played| LastMove {
                from: played.from_square().to_string(),
                to: played.to_square().to_string(),
            }),
            moves: moves
                .iter()
                .enumerate()
                .map(|(index, played)| MoveEntry {
                    index,
                    label: played.label(),
                    san: played.san.clone(),
                    uci: played.uci.clone(),
                })
                .collect(),
            current_index: self.cursor.map_or(-1, |index| index as i64),
            can_go_back: self.cursor.is_some(),
            can_go_forward: self.cursor.map_or(0, |index| index + 1) < moves.len(),
            loading: self.loading,
            analyzing: self.is_analyzing(),
            analysis: self.analysis.clone(),
            move_analysis: self.move_analysis.clone(),
            chat: self.chat.clone(),
            game_info: self.record.headers().to_vec(),
            notice: self.notice.clone(),
        }
    }
}

fn unexpected_reply(endpoint: &str, reply: &BackendReply) {
    warn!("Unexpected reply to {}: {:?}", endpoint, reply);
}
