use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{debug, info, warn};
use uuid::Uuid;

use crate::backend::dispatch;
use crate::models::{AnalysisSession, ClientMessage, ServerMessage, Ticket};
use crate::state::AppState;

/// One browser tab: a WebSocket connection owning its analysis session.
pub struct AnalysisSocket {
    pub id: String,
    pub app_state: web::Data<AppState>,
    pub session: AnalysisSession,
}

impl Actor for AnalysisSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let addr = ctx.address();
        self.app_state.sessions.lock().insert(self.id.clone(), addr);

        info!("WebSocket connection started: {}", self.id);
        info!("Total active sessions: {}", self.app_state.session_count());
        self.send_state(ctx);
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        self.app_state.sessions.lock().remove(&self.id);
        info!("WebSocket connection closed: {}", self.id);
        info!("Total active sessions: {}", self.app_state.session_count());
        Running::Stop
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for AnalysisSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Pong(_)) => {}
            Ok(ws::Message::Text(text)) => {
                debug!("Received text message: {}", text);
                match serde_json::from_str::<ClientMessage>(text.as_ref()) {
                    Ok(client_msg) => self.handle_message(client_msg, ctx),
                    Err(e) => {
                        warn!("Error parsing client message: {}", e);
                        self.send(ctx, &ServerMessage::error(format!("Invalid message format: {}", e)));
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                warn!("Binary messages are not supported");
                self.send(ctx, &ServerMessage::error("Binary messages are not supported"));
            }
            Ok(ws::Message::Close(reason)) => {
                info!("Connection closed: {:?}", reason);
                ctx.close(reason);
                ctx.stop();
            }
            _ => ctx.stop(),
        }
    }
}

impl AnalysisSocket {
    pub fn new(app_state: web::Data<AppState>) -> Self {
        AnalysisSocket {
            id: Uuid::new_v4().to_string(),
            app_state,
            session: AnalysisSession::new(),
        }
    }

    fn handle_message(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match apply_message(&mut self.session, &msg) {
            Ok(ticket) => {
                if let Some(ticket) = ticket {
                    self.spawn_request(ticket, ctx);
                }
            }
            Err(e) => {
                warn!("Session {}: {} rejected: {}", self.id, msg.message_type, e);
                self.send(ctx, &ServerMessage::error(e));
            }
        }
        self.send_state(ctx);
    }

    /// Run a backend call off the actor and fold its reply back into the
    /// session when it completes.
    fn spawn_request(&self, ticket: Ticket, ctx: &mut ws::WebsocketContext<Self>) {
        info!("Session {} calling {}", self.id, ticket.request.endpoint());
        dispatch(self.app_state.backend.as_ref(), ticket.request.clone())
            .into_actor(self)
            .map(move |reply, act, ctx| {
                act.session.resolve(ticket, reply);
                act.send_state(ctx);
            })
            .spawn(ctx);
    }

    fn send_state(&self, ctx: &mut ws::WebsocketContext<Self>) {
        self.send(ctx, &ServerMessage::state(self.session.view()));
    }

    fn send(&self, ctx: &mut ws::WebsocketContext<Self>, message: &ServerMessage) {
        match serde_json::to_string(message) {
            Ok(text) => ctx.text(text),
            Err(e) => warn!("Error serializing message: {}", e),
        }
    }
}

/// Apply one client message to the session, returning the backend call it
/// triggers, if any. A rejection is kept as the session notice so the next
/// snapshot still shows it.
pub fn apply_message(
    session: &mut AnalysisSession,
    msg: &ClientMessage,
) -> Result<Option<Ticket>, String> {
    session.clear_notice();
    let result = route_message(session, msg);
    if let Err(e) = &result {
        session.set_notice(e.clone());
    }
    result
}

fn route_message(
    session: &mut AnalysisSession,
    msg: &ClientMessage,
) -> Result<Option<Ticket>, String> {
    let missing = |field: &str| format!("Missing field '{}' for {}", field, msg.message_type);

    let ticket = match msg.message_type.as_str() {
        "state" => None,
        "reset" => {
            session.reset();
            None
        }
        "set_mode" => {
            let mode = msg.mode.ok_or_else(|| missing("mode"))?;
            session.set_mode(mode);
            None
        }
        "move" => {
            let from = msg.move_from.as_deref().ok_or_else(|| missing("move_from"))?;
            let to = msg.move_to.as_deref().ok_or_else(|| missing("move_to"))?;
            session
                .play_move(from, to, msg.promote_to.as_deref())
                .map_err(|e| e.to_string())?
        }
        "engine_move" => session.request_engine_move(),
        "goto" => {
            let index = msg.index.ok_or_else(|| missing("index"))?;
            session.go_to(index).map_err(|e| e.to_string())?
        }
        "first" => session.go_first().map_err(|e| e.to_string())?,
        "previous" => session.go_previous().map_err(|e| e.to_string())?,
        "next" => session.go_next().map_err(|e| e.to_string())?,
        "last" => session.go_last().map_err(|e| e.to_string())?,
        "load_pgn" => session.load_pgn(msg.pgn.as_deref().unwrap_or_default()),
        "chat" => session.send_chat(msg.question.as_deref().unwrap_or_default()),
        other => return Err(format!("Unknown message type: {}", other)),
    };
    Ok(ticket)
}

/// WebSocket connection handler
pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let socket = AnalysisSocket::new(app_state);
    info!("New WebSocket connection: {}", socket.id);
    ws::start(socket, &req, stream)
}
