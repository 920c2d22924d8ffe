use futures::future::{BoxFuture, FutureExt};
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use super::{AnalysisBackend, BackendResult};
use crate::error::BackendError;
use crate::models::api::{
    AnalyzePgnRequest, AnalyzePositionRequest, ChatRequest, ChatResponse, EngineMoveRequest,
    EngineMoveResponse, ErrorBody, MoveAnalysisRequest, MoveAnalysisResponse,
};

/// JSON-over-HTTP client for the analysis service.
#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpBackend {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post<B, T>(&self, endpoint: &'static str, body: &B) -> BoxFuture<'static, BackendResult<T>>
    where
        B: Serialize,
        T: DeserializeOwned + Send + 'static,
    {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("POST {}", url);
        let request = self.client.post(url).json(body);

        async move {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?;

            if !status.is_success() {
                let message = match serde_json::from_slice::<ErrorBody>(&body) {
                    Ok(error) => error.error,
                    Err(_) => String::from_utf8_lossy(&body).into_owned(),
                };
                return Err(BackendError::Status {
                    status: status.as_u16(),
                    message,
                });
            }

            Ok(serde_json::from_slice(&body)?)
        }
        .boxed()
    }
}

impl AnalysisBackend for HttpBackend {
    fn engine_move(
        &self,
        request: EngineMoveRequest,
    ) -> BoxFuture<'static, BackendResult<EngineMoveResponse>> {
        self.post("get_stockfish_move", &request)
    }

    fn analyze_position(
        &self,
        request: AnalyzePositionRequest,
    ) -> BoxFuture<'static, BackendResult<Value>> {
        self.post("analyze_position", &request)
    }

    fn move_analysis(
        &self,
        request: MoveAnalysisRequest,
    ) -> BoxFuture<'static, BackendResult<MoveAnalysisResponse>> {
        self.post("get_move_analysis", &request)
    }

    fn analyze_pgn(&self, request: AnalyzePgnRequest) -> BoxFuture<'static, BackendResult<Value>> {
        self.post("analyze_pgn", &request)
    }

    fn chat(&self, request: ChatRequest) -> BoxFuture<'static, BackendResult<ChatResponse>> {
        self.post("chat_analysis", &request)
    }
}
