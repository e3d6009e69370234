//! WebSocket reader feeding push frames into a [`PushGate`].

use futures_util::StreamExt;
use http::HeaderValue;
use http::header::AUTHORIZATION;
use pcommon::SessionId;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;

use crate::{PushGate, SecretString, TransportError};

use super::serde_api::{PushFrame, parse_push_frame};

pub(crate) async fn run_push_channel(
    url: String,
    token: Option<SecretString>,
    session_id: SessionId,
    gate: PushGate,
) {
    let outcome = read_frames(url, token, &session_id, &gate).await;
    gate.deliver_disconnect(outcome.err());
}

async fn read_frames(
    url: String,
    token: Option<SecretString>,
    session_id: &SessionId,
    gate: &PushGate,
) -> Result<(), TransportError> {
    let mut request = url
        .into_client_request()
        .map_err(|err| TransportError::other(err.to_string()))?;

    if let Some(token) = token {
        let value = HeaderValue::from_str(&token.bearer())
            .map_err(|err| TransportError::authentication(err.to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, value);
    }

    let (socket, _) = connect_async(request)
        .await
        .map_err(|err| TransportError::network(err.to_string()))?;
    let (_, mut frames) = socket.split();

    while let Some(frame) = frames.next().await {
        let frame = frame.map_err(|err| TransportError::network(err.to_string()))?;
        match frame {
            WsMessage::Text(text) => match parse_push_frame(text.as_str(), session_id)? {
                PushFrame::Message(message) => {
                    gate.deliver_message(message);
                }
                PushFrame::Typing(event) => {
                    gate.deliver_typing(event);
                }
            },
            WsMessage::Close(_) => break,
            _ => {}
        }

        if !gate.is_open() {
            break;
        }
    }

    Ok(())
}
