//! Log tail decoding.
//!
//! A followed log arrives as back-to-back JSON frames with no delimiter:
//! `{"File":"stdout.0","Offset":42,"Data":"<base64>"}{}{"FileEvent":"file deleted"}`.
//! Frame boundaries do not line up with network reads, and decoded bytes do
//! not line up with UTF-8 boundaries, so both are buffered across pushes.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::StreamExt;
use serde::Deserialize;

use super::StreamSender;
use crate::error::SourceError;

#[derive(Debug, Deserialize)]
struct LogFrame {
    #[serde(rename = "Data", default)]
    data: Option<String>,
    #[serde(rename = "FileEvent", default)]
    file_event: Option<String>,
}

#[derive(Debug, Default)]
pub struct LogFrameDecoder {
    buf: Vec<u8>,
    pending_utf8: Vec<u8>,
}

/// Takes the longest valid UTF-8 prefix, keeping an incomplete trailing sequence.
fn drain_utf8(pending: &mut Vec<u8>) -> String {
    match std::str::from_utf8(pending) {
        Ok(s) => {
            let s = s.to_string();
            pending.clear();
            s
        }
        Err(e) if e.error_len().is_none() => {
            let valid = e.valid_up_to();
            let s = String::from_utf8_lossy(&pending[..valid]).into_owned();
            pending.drain(..valid);
            s
        }
        Err(_) => {
            let s = String::from_utf8_lossy(pending).into_owned();
            pending.clear();
            s
        }
    }
}

impl LogFrameDecoder {
    /// Feeds raw bytes, returning the text of every complete frame.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>, SourceError> {
        self.buf.extend_from_slice(bytes);
        let mut chunks = Vec::new();
        let mut consumed = 0;
        {
            let mut frames = serde_json::Deserializer::from_slice(&self.buf).into_iter::<LogFrame>();
            loop {
                match frames.next() {
                    Some(Ok(frame)) => {
                        consumed = frames.byte_offset();
                        if let Some(event) = frame.file_event {
                            tracing::debug!("log file event: {event}");
                        }
                        let Some(data) = frame.data.filter(|d| !d.is_empty()) else {
                            continue;
                        };
                        let bytes = STANDARD
                            .decode(data)
                            .map_err(|e| SourceError::Decode(format!("log frame: {e}")))?;
                        self.pending_utf8.extend_from_slice(&bytes);
                        let text = drain_utf8(&mut self.pending_utf8);
                        if !text.is_empty() {
                            chunks.push(text);
                        }
                    }
                    Some(Err(e)) if e.is_eof() => break,
                    Some(Err(e)) => return Err(e.into()),
                    None => {
                        consumed = frames.byte_offset();
                        break;
                    }
                }
            }
        }
        self.buf.drain(..consumed);
        Ok(chunks)
    }
}

/// Reads a followed log response until it ends or the consumer goes away.
#[tracing::instrument(skip_all)]
pub async fn pump(response: reqwest::Response, output: StreamSender<String>) {
    let mut decoder = LogFrameDecoder::default();
    let mut body = response.bytes_stream();
    loop {
        let next = tokio::select! {
            next = body.next() => next,
            _ = output.closed() => return,
        };
        match next {
            Some(Ok(bytes)) => match decoder.push(&bytes) {
                Ok(chunks) => {
                    for chunk in chunks {
                        if !output.send(chunk) {
                            return;
                        }
                    }
                }
                Err(e) => {
                    output.fail(e);
                    return;
                }
            },
            Some(Err(e)) => {
                output.fail(e.into());
                return;
            }
            None => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(text: &str) -> String {
        format!(r#"{{"File":"stdout.0","Offset":1,"Data":"{}"}}"#, STANDARD.encode(text))
    }

    #[test]
    fn test_concatenated_frames() {
        let mut decoder = LogFrameDecoder::default();
        let input = format!("{}{{}}{}", frame("one\n"), frame("two"));
        let chunks = decoder.push(input.as_bytes()).unwrap();
        assert_eq!(chunks, vec!["one\n".to_string(), "two".to_string()]);
    }

    #[test]
    fn test_frame_split_across_reads() {
        let mut decoder = LogFrameDecoder::default();
        let input = frame("hello world\n");
        let (a, b) = input.as_bytes().split_at(input.len() / 2);
        assert!(decoder.push(a).unwrap().is_empty());
        assert_eq!(decoder.push(b).unwrap(), vec!["hello world\n".to_string()]);
    }

    #[test]
    fn test_utf8_split_across_frames() {
        let mut decoder = LogFrameDecoder::default();
        let bytes = "é".as_bytes();
        let first = format!(r#"{{"Data":"{}"}}"#, STANDARD.encode(&bytes[..1]));
        let second = format!(r#"{{"Data":"{}"}}"#, STANDARD.encode(&bytes[1..]));
        assert!(decoder.push(first.as_bytes()).unwrap().is_empty());
        assert_eq!(decoder.push(second.as_bytes()).unwrap(), vec!["é".to_string()]);
    }

    #[test]
    fn test_file_event_and_heartbeat_skipped() {
        let mut decoder = LogFrameDecoder::default();
        let chunks = decoder
            .push(br#"{}{"File":"stdout.0","FileEvent":"file deleted"}"#)
            .unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let mut decoder = LogFrameDecoder::default();
        assert!(matches!(decoder.push(b"]]"), Err(SourceError::Decode(_))));
    }
}
