//! Framed TCP connection to the detection service.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::{de::DeserializeOwned, Serialize};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use super::backoff::{calculate_backoff, is_transient_io_error};
use super::protocol::{decode_event, encode_message, ClientMessage, PoseDetection, ServerEvent};
use super::sink::MessageSink;
use super::{ChannelError, ProtocolError};

/// Largest accepted frame (16 MiB).
pub const MAX_FRAME_LENGTH: usize = 16 * 1024 * 1024;

pub type MessageStream = Framed<TcpStream, LengthDelimitedCodec>;

/// Create a framed message stream with length-delimited framing.
pub fn message_stream(stream: TcpStream) -> MessageStream {
    let codec = LengthDelimitedCodec::builder()
        .max_frame_length(MAX_FRAME_LENGTH)
        .new_codec();
    Framed::new(stream, codec)
}

/// Send one JSON-encoded message as a frame.
pub async fn send_frame<T: Serialize>(
    stream: &mut MessageStream,
    message: &T,
) -> Result<(), ChannelError> {
    let bytes = encode_message(message)?;
    stream.send(bytes).await?;
    Ok(())
}

/// Receive and decode one frame. `Ok(None)` when the peer closed cleanly.
pub async fn recv_frame<T: DeserializeOwned>(
    stream: &mut MessageStream,
) -> Result<Option<T>, ChannelError> {
    match stream.next().await {
        Some(Ok(bytes)) => {
            let message = serde_json::from_slice(&bytes).map_err(ProtocolError::from)?;
            Ok(Some(message))
        }
        Some(Err(e)) => Err(e.into()),
        None => Ok(None),
    }
}

/// Handle used by the session to queue outbound messages.
#[derive(Debug, Clone)]
pub struct ChannelSender {
    tx: mpsc::UnboundedSender<ClientMessage>,
}

impl MessageSink for ChannelSender {
    fn send(&mut self, message: ClientMessage) -> Result<(), ChannelError> {
        self.tx.send(message).map_err(|_| ChannelError::Closed)
    }
}

/// Connect once to `addr`.
pub async fn connect(
    addr: &str,
) -> Result<(ChannelSender, mpsc::UnboundedReceiver<ServerEvent>), ChannelError> {
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;
    log::info!("Connected to detection service at {}", addr);
    Ok(spawn_channel(stream))
}

/// Connect to `addr`, retrying transient failures with exponential backoff.
pub async fn connect_with_retry(
    addr: &str,
    max_retries: u32,
    backoff_base: std::time::Duration,
    backoff_max: std::time::Duration,
) -> Result<(ChannelSender, mpsc::UnboundedReceiver<ServerEvent>), ChannelError> {
    let mut attempt = 0;
    loop {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                stream.set_nodelay(true)?;
                log::info!(
                    "Connected to detection service at {} (attempt {})",
                    addr,
                    attempt + 1
                );
                return Ok(spawn_channel(stream));
            }
            Err(e) if is_transient_io_error(&e) && attempt < max_retries => {
                let delay = calculate_backoff(attempt, backoff_base, backoff_max);
                log::warn!(
                    "Connect to {} failed ({}), retrying in {:?} (attempt {}/{})",
                    addr,
                    e,
                    delay,
                    attempt + 1,
                    max_retries
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(ChannelError::Connect {
                    addr: addr.to_string(),
                    attempts: attempt + 1,
                    source: e,
                });
            }
        }
    }
}

/// Bridge a connected socket to a message sender and an event receiver.
///
/// Spawns a writer and a reader task on the current runtime. The event
/// receiver ends when the service closes the connection; the writer only
/// holds a weak handle to it.
pub fn spawn_channel(stream: TcpStream) -> (ChannelSender, mpsc::UnboundedReceiver<ServerEvent>) {
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (sink, stream) = message_stream(stream).split();

    tokio::spawn(write_loop(sink, out_rx, event_tx.downgrade()));
    tokio::spawn(read_loop(stream, event_tx));

    (ChannelSender { tx: out_tx }, event_rx)
}

async fn write_loop(
    mut sink: SplitSink<MessageStream, bytes::Bytes>,
    mut outbound: mpsc::UnboundedReceiver<ClientMessage>,
    events: mpsc::WeakUnboundedSender<ServerEvent>,
) {
    while let Some(message) = outbound.recv().await {
        let bytes = match encode_message(&message) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Dropping unencodable {:?} request: {}", message.kind(), e);
                fail_detection(&message, &events);
                continue;
            }
        };
        if let Err(e) = sink.send(bytes).await {
            log::warn!("Detection channel write failed: {}", e);
            fail_detection(&message, &events);
            break;
        }
    }
    let _ = sink.close().await;
    log::debug!("Detection channel writer stopped");
}

/// A detection request that never left must still produce a response, or
/// the in-flight guard would stay busy.
fn fail_detection(message: &ClientMessage, events: &mpsc::WeakUnboundedSender<ServerEvent>) {
    if let (ClientMessage::DetectPose(request), Some(events)) = (message, events.upgrade()) {
        let _ = events.send(ServerEvent::PoseDetected(PoseDetection::failed(Some(
            request.seq,
        ))));
    }
}

async fn read_loop(
    mut stream: SplitStream<MessageStream>,
    events: mpsc::UnboundedSender<ServerEvent>,
) {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(bytes) => match decode_event(&bytes) {
                Ok(event) => {
                    if events.send(event).is_err() {
                        break;
                    }
                }
                Err(e) => log::warn!("Ignoring unreadable service frame: {}", e),
            },
            Err(e) => {
                log::warn!("Detection channel read failed: {}", e);
                break;
            }
        }
    }
    log::info!("Detection channel reader stopped");
}
