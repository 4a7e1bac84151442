//! Response body materialization
//!
//! Reads a response body fully into memory, decoding gzip as it streams in
//! and enforcing an optional cap on the decoded size.
//!
//! Gzip bodies may hold several concatenated members; they decode to the
//! concatenation of their payloads. The cap is checked after every write to
//! the decoder. One write inflates roughly one internal decoder buffer
//! (32 KiB), so an oversized body is rejected once it passes the limit by
//! about that much, not after the whole chunk is inflated.

use crate::{Error, Result};
use flate2::write::MultiGzDecoder;
use reqwest::header::CONTENT_ENCODING;
use reqwest::Response;
use std::io::{self, Write};

/// Whether the response declares a gzip content encoding
pub fn is_gzip(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_ENCODING)
        .is_some_and(|value| value.as_bytes().eq_ignore_ascii_case(b"gzip"))
}

/// Read the whole body of `response`
///
/// The response is consumed and released whether or not reading succeeds.
///
/// # Errors
/// - [`Error::Body`] if the transport fails mid-body
/// - [`Error::Decompress`] if a gzip body is malformed
/// - [`Error::TooLarge`] if the decoded body exceeds `limit`
pub async fn read_body(mut response: Response, limit: Option<usize>) -> Result<Vec<u8>> {
    let mut sink = if is_gzip(&response) {
        BodySink::Gzip(MultiGzDecoder::new(Vec::new()))
    } else {
        BodySink::Raw(Vec::new())
    };

    while let Some(chunk) = response.chunk().await.map_err(Error::Body)? {
        sink.write(&chunk, limit)?;
    }

    let body = sink.finish()?;
    within(body.len(), limit)?;
    Ok(body)
}

fn within(len: usize, limit: Option<usize>) -> Result<()> {
    match limit {
        Some(limit) if len > limit => Err(Error::TooLarge { limit }),
        _ => Ok(()),
    }
}

enum BodySink {
    Raw(Vec<u8>),
    Gzip(MultiGzDecoder<Vec<u8>>),
}

impl BodySink {
    /// Append `chunk`, failing as soon as the decoded size passes `limit`
    fn write(&mut self, chunk: &[u8], limit: Option<usize>) -> Result<()> {
        match self {
            BodySink::Raw(buf) => buf.extend_from_slice(chunk),
            BodySink::Gzip(decoder) => {
                let mut rest = chunk;
                while !rest.is_empty() {
                    let written = decoder.write(rest).map_err(Error::Decompress)?;
                    if written == 0 {
                        return Err(Error::Decompress(io::ErrorKind::WriteZero.into()));
                    }
                    rest = &rest[written..];
                    within(decoder.get_ref().len(), limit)?;
                }
            }
        }
        self.check(limit)
    }

    fn len(&self) -> usize {
        match self {
            BodySink::Raw(buf) => buf.len(),
            BodySink::Gzip(decoder) => decoder.get_ref().len(),
        }
    }

    fn check(&self, limit: Option<usize>) -> Result<()> {
        within(self.len(), limit)
    }

    fn finish(self) -> Result<Vec<u8>> {
        match self {
            BodySink::Raw(buf) => Ok(buf),
            BodySink::Gzip(decoder) => decoder.finish().map_err(Error::Decompress),
        }
    }
}
