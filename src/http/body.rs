use std::io;

use bytes::{Bytes, BytesMut};
use futures_util::{Stream, TryStreamExt, stream};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::Frame;
use tokio::io::AsyncReadExt;

use crate::error::RequestError;

use super::counters::ByteCounters;
use super::options::{BodySource, BodyStream};

const STREAM_CHUNK: usize = 8 * 1024;

pub(crate) type PooledBody = BoxBody<Bytes, io::Error>;

/// A request body resolved for one call.
pub(crate) enum PreparedBody {
    Fixed(Bytes),
    Stream(BodyStream),
}

impl PreparedBody {
    /// Runs the producer for streamed sources. A producer failure is returned
    /// before anything touches the network.
    pub(crate) fn resolve(source: &BodySource) -> Result<Self, RequestError> {
        match source {
            BodySource::Fixed(bytes) => Ok(PreparedBody::Fixed(bytes.clone())),
            BodySource::Stream(producer) => producer()
                .map(PreparedBody::Stream)
                .map_err(|source| RequestError::BodyProducer { source }),
        }
    }

    pub(crate) fn into_pooled(self) -> PooledBody {
        match self {
            PreparedBody::Fixed(bytes) => Full::new(bytes).map_err(|never| match never {}).boxed(),
            PreparedBody::Stream(reader) => {
                StreamBody::new(chunk_stream(reader).map_ok(Frame::data)).boxed()
            }
        }
    }

    /// Converts into a reqwest body. Streamed chunks are added to the written
    /// counter as reqwest pulls them.
    pub(crate) fn into_standard(self, counters: &ByteCounters) -> reqwest::Body {
        match self {
            PreparedBody::Fixed(bytes) => reqwest::Body::from(bytes),
            PreparedBody::Stream(reader) => {
                let counters = counters.clone();
                reqwest::Body::wrap_stream(
                    chunk_stream(reader).inspect_ok(move |chunk| counters.add_written(chunk.len())),
                )
            }
        }
    }
}

/// Reads `reader` to EOF in fixed-size chunks. The reader is dropped, and so
/// closed, when the stream ends or is dropped.
pub(crate) fn chunk_stream(
    reader: BodyStream,
) -> impl Stream<Item = io::Result<Bytes>> + Send + Sync + 'static {
    stream::try_unfold(reader, |mut reader| async move {
        let mut buf = BytesMut::with_capacity(STREAM_CHUNK);
        let read = reader.read_buf(&mut buf).await?;
        if read == 0 {
            return Ok(None);
        }
        Ok::<_, io::Error>(Some((buf.freeze(), reader)))
    })
}
