//! Client side of the analysis backend.

pub mod http;

use futures::future::{BoxFuture, FutureExt, TryFutureExt};
use serde_json::Value;

use crate::error::BackendError;
use crate::models::api::{
    AnalyzePgnRequest, AnalyzePositionRequest, BackendReply, BackendRequest, ChatRequest,
    ChatResponse, EngineMoveRequest, EngineMoveResponse, MoveAnalysisRequest,
    MoveAnalysisResponse,
};

pub use http::HttpBackend;

pub type BackendResult<T> = Result<T, BackendError>;

/// The five calls the analysis service answers.
pub trait AnalysisBackend: Send + Sync {
    fn engine_move(&self, request: EngineMoveRequest)
        -> BoxFuture<'static, BackendResult<EngineMoveResponse>>;

    fn analyze_position(&self, request: AnalyzePositionRequest)
        -> BoxFuture<'static, BackendResult<Value>>;

    fn move_analysis(&self, request: MoveAnalysisRequest)
        -> BoxFuture<'static, BackendResult<MoveAnalysisResponse>>;

    fn analyze_pgn(&self, request: AnalyzePgnRequest) -> BoxFuture<'static, BackendResult<Value>>;

    fn chat(&self, request: ChatRequest) -> BoxFuture<'static, BackendResult<ChatResponse>>;
}

/// Route a request to the matching backend call.
pub fn dispatch(
    backend: &dyn AnalysisBackend,
    request: BackendRequest,
) -> BoxFuture<'static, BackendResult<BackendReply>> {
    match request {
        BackendRequest::EngineMove(request) => backend
            .engine_move(request)
            .map_ok(BackendReply::EngineMove)
            .boxed(),
        BackendRequest::AnalyzePosition(request) => backend
            .analyze_position(request)
            .map_ok(BackendReply::PositionAnalysis)
            .boxed(),
        BackendRequest::MoveAnalysis(request) => backend
            .move_analysis(request)
            .map_ok(BackendReply::MoveAnalysis)
            .boxed(),
        BackendRequest::AnalyzePgn(request) => backend
            .analyze_pgn(request)
            .map_ok(BackendReply::PgnAnalysis)
            .boxed(),
        BackendRequest::Chat(request) => backend.chat(request).map_ok(BackendReply::Chat).boxed(),
    }
}

#[cfg(test)]
pub mod fake {
    use super::*;
    use futures::future;
    use parking_lot::Mutex;
    use serde_json::json;

    /// Answers every call from canned data and remembers what it was asked.
    #[derive(Default)]
    pub struct FakeBackend {
        pub best_move: Option<String>,
        pub fail_chat: bool,
        pub calls: Mutex<Vec<&'static str>>,
    }

    impl FakeBackend {
        fn called(&self, endpoint: &'static str) {
            self.calls.lock().push(endpoint);
        }
    }

    impl AnalysisBackend for FakeBackend {
        fn engine_move(
            &self,
            _request: EngineMoveRequest,
        ) -> BoxFuture<'static, BackendResult<EngineMoveResponse>> {
            self.called("get_stockfish_move");
            future::ready(Ok(EngineMoveResponse {
                best_move: self.best_move.clone(),
            }))
            .boxed()
        }

        fn analyze_position(
            &self,
            request: AnalyzePositionRequest,
        ) -> BoxFuture<'static, BackendResult<Value>> {
            self.called("analyze_position");
            future::ready(Ok(json!({"fen": request.fen, "gemini": "Balanced."}))).boxed()
        }

        fn move_analysis(
            &self,
            request: MoveAnalysisRequest,
        ) -> BoxFuture<'static, BackendResult<MoveAnalysisResponse>> {
            self.called("get_move_analysis");
            future::ready(Ok(MoveAnalysisResponse {
                move_number: request.move_number,
                move_color: request.move_color,
                stockfish: None,
                gemini: Some("A normal move.".to_string()),
                fen: Some(request.fen),
            }))
            .boxed()
        }

        fn analyze_pgn(&self, _request: AnalyzePgnRequest) -> BoxFuture<'static, BackendResult<Value>> {
            self.called("analyze_pgn");
            future::ready(Ok(json!({"analysis": []}))).boxed()
        }

        fn chat(&self, request: ChatRequest) -> BoxFuture<'static, BackendResult<ChatResponse>> {
            self.called("chat_analysis");
            let reply = if self.fail_chat {
                Err(BackendError::Status {
                    status: 500,
                    message: "model unavailable".to_string(),
                })
            } else {
                Ok(ChatResponse {
                    response: format!("You asked: {}", request.question),
                })
            };
            future::ready(reply).boxed()
        }
    }
}
