use actix::prelude::*;
use actix_http::ws::Item;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::chat::Session;
use crate::config::ChatConfig;
use crate::AppState;

#[derive(Debug, Clone, Copy)]
pub struct HeartbeatConfig {
    pub interval: Duration,
    pub client_timeout: Duration,
}

impl From<&ChatConfig> for HeartbeatConfig {
    fn from(config: &ChatConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.heartbeat_interval_secs),
            client_timeout: Duration::from_secs(config.client_timeout_secs),
        }
    }
}

/// Bridges one websocket connection to one chat session.
///
/// Turns run through `ctx.wait`, so the next inbound frame is not handled
/// until the previous reply has been queued. Fragmented text messages are
/// reassembled and handled as a single turn.
pub struct ChatConnection {
    id: Uuid,
    peer_addr: String,
    session: Option<Session>,
    heartbeat: HeartbeatConfig,
    last_heartbeat: Instant,
    max_message_size: usize,
    fragments: Option<Vec<u8>>,
    turns: usize,
}

impl ChatConnection {
    pub fn new(
        session: Session,
        peer_addr: String,
        heartbeat: HeartbeatConfig,
        max_message_size: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            peer_addr,
            session: Some(session),
            heartbeat,
            last_heartbeat: Instant::now(),
            max_message_size,
            fragments: None,
            turns: 0,
        }
    }

    fn handle_turn(&mut self, text: String, ctx: &mut <Self as Actor>::Context) {
        let Some(mut session) = self.session.take() else {
            // ctx.wait keeps turns from overlapping, so this is unreachable in practice
            warn!("Dropping message on connection {}: turn already in progress", self.id);
            return;
        };
        self.turns += 1;

        let turn = async move {
            let chunk = session.submit(text).await;
            (session, chunk)
        };

        ctx.wait(turn.into_actor(self).map(|(session, chunk), act, ctx| {
            act.session = Some(session);
            act.last_heartbeat = Instant::now();
            ctx.text(chunk);
        }));
    }

    fn handle_fragment(&mut self, item: Item, ctx: &mut <Self as Actor>::Context) {
        match item {
            Item::FirstText(data) => {
                if data.len() > self.max_message_size {
                    self.close_with(ctx, ws::CloseCode::Size, "oversized text message");
                    return;
                }
                self.fragments = Some(data.to_vec());
            }
            Item::FirstBinary(_) => {
                self.close_with(ctx, ws::CloseCode::Unsupported, "binary message")
            }
            Item::Continue(data) => {
                self.append_fragment(&data, ctx);
            }
            Item::Last(data) => {
                if !self.append_fragment(&data, ctx) {
                    return;
                }
                let bytes = self.fragments.take().unwrap_or_default();
                match String::from_utf8(bytes) {
                    Ok(text) => self.handle_turn(text, ctx),
                    Err(_) => self.close_with(ctx, ws::CloseCode::Invalid, "non UTF-8 text message"),
                }
            }
        }
    }

    fn append_fragment(&mut self, data: &[u8], ctx: &mut <Self as Actor>::Context) -> bool {
        let Some(buffered) = self.fragments.as_ref().map(Vec::len) else {
            self.close_with(ctx, ws::CloseCode::Protocol, "continuation without a first frame");
            return false;
        };
        if buffered + data.len() > self.max_message_size {
            self.fragments = None;
            self.close_with(ctx, ws::CloseCode::Size, "oversized text message");
            return false;
        }
        if let Some(buffer) = self.fragments.as_mut() {
            buffer.extend_from_slice(data);
        }
        true
    }

    fn start_heartbeat(&self, ctx: &mut <Self as Actor>::Context) {
        if self.heartbeat.interval.is_zero() {
            return;
        }
        ctx.run_interval(self.heartbeat.interval, |act, ctx| {
            if Instant::now().duration_since(act.last_heartbeat) > act.heartbeat.client_timeout {
                act.close_with(ctx, ws::CloseCode::Away, "heartbeat timeout");
                return;
            }
            ctx.ping(b"");
        });
    }

    fn close_with(&self, ctx: &mut <Self as Actor>::Context, code: ws::CloseCode, reason: &str) {
        warn!("Closing connection {} ({}): {}", self.id, self.peer_addr, reason);
        ctx.close(Some(code.into()));
        ctx.stop();
    }
}

impl Actor for ChatConnection {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!("WebSocket connection established with {} (id: {})", self.peer_addr, self.id);
        self.start_heartbeat(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        info!(
            "WebSocket connection closed with {} (id: {}, turns: {})",
            self.peer_addr, self.id, self.turns
        );
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ChatConnection {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Text(text)) => {
                self.last_heartbeat = Instant::now();
                self.handle_turn(text.to_string(), ctx);
            }
            Ok(ws::Message::Continuation(item)) => {
                self.last_heartbeat = Instant::now();
                self.handle_fragment(item, ctx);
            }
            Ok(ws::Message::Ping(msg)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Binary(_)) => {
                self.close_with(ctx, ws::CloseCode::Unsupported, "binary message")
            }
            Ok(ws::Message::Close(reason)) => {
                info!("Client disconnected from connection {}: {:?}", self.id, reason);
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Nop) => {}
            Err(ws::ProtocolError::Overflow) => {
                self.close_with(ctx, ws::CloseCode::Size, "frame exceeds size limit")
            }
            Err(e) => {
                error!("Error on connection {} from {}: {}", self.id, self.peer_addr, e);
                ctx.stop();
            }
        }
    }
}

/// Upgrade the request and start a fresh session for this connection.
pub async fn websocket_route(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let peer_addr = req
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    info!("New WebSocket connection request from: {}", peer_addr);

    let chat = &state.config.chat;
    let session = Session::new(state.completion.clone(), &chat.system_prompt);
    let connection = ChatConnection::new(
        session,
        peer_addr,
        HeartbeatConfig::from(chat),
        chat.max_frame_size,
    );

    ws::WsResponseBuilder::new(connection, &req, stream)
        .frame_size(chat.max_frame_size)
        .start()
}
