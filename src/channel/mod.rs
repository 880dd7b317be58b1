//! Persistent channel to the detection service.
//!
//! One framed TCP connection carries detection requests out and result events
//! back in. Size estimation and try-on share the same connection and are told
//! apart by event name.

mod backoff;
mod connection;
mod errors;
mod protocol;
mod sequence;
mod sink;

pub use backoff::{
    calculate_backoff, is_transient_io_error, DEFAULT_BACKOFF_BASE, DEFAULT_BACKOFF_MAX,
    DEFAULT_CONNECT_RETRIES,
};
pub use connection::{
    connect, connect_with_retry, message_stream, recv_frame, send_frame, spawn_channel,
    ChannelSender, MessageStream, MAX_FRAME_LENGTH,
};
pub use errors::{ChannelError, ProtocolError};
pub use protocol::{
    decode_client_message, decode_event, encode_message, ClientMessage, DetectPoseRequest,
    EstimateSizeRequest, PoseDetection, ServerEvent, SizeEstimation, TryOnResult,
    VirtualTryOnRequest,
};
pub use sequence::{RequestKind, RequestSequencer};
pub use sink::{MessageSink, RecordingSink};
