use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::TcpStream;
use bytes::Bytes;
use tokio_util::codec::Framed;
use tokio_util::codec::LengthDelimitedCodec;

use crate::constants::FRAME_LENGTH_FIELD;
use crate::Result;

pub(crate) type FramedStream = Framed<TcpStream, LengthDelimitedCodec>;

/// Wrap a TCP stream in the length-prefixed frame codec.
pub(crate) fn framed(
    stream: TcpStream,
    max_frame_bytes: usize,
) -> FramedStream {
    LengthDelimitedCodec::builder()
        .length_field_length(FRAME_LENGTH_FIELD)
        .max_frame_length(max_frame_bytes)
        .new_framed(stream)
}

/// Encode one protocol message into a frame payload.
pub(crate) fn encode<T: Serialize>(msg: &T) -> Result<Bytes> {
    let buf = bincode::serialize(msg)?;
    Ok(Bytes::from(buf))
}

/// Decode one frame payload into a protocol message.
pub(crate) fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    Ok(bincode::deserialize(payload)?)
}
