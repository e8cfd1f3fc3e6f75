//! Exec session framing over a websocket.
//!
//! Outbound frames are JSON text messages:
//!
//! ```text
//! {"stdin":{"data":"<base64>"}}
//! {"tty_size":{"height":40,"width":120}}
//! {}                                      heartbeat
//! ```
//!
//! Inbound frames carry base64 `stdout`/`stderr` data, `close` flags, an
//! `exited` flag and an optional `result.exit_code`. A close flag, an exit
//! signal and a normal socket closure all end the session the same way.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use super::StreamSender;
use crate::error::SourceError;
use crate::structs::TtySize;

pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_COMMAND: &str = "/bin/sh";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecFrame {
    Stdin(Vec<u8>),
    Resize(TtySize),
    Heartbeat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecEvent {
    Output(String),
    /// Session finished; the exit code when the server reported one.
    Complete(Option<i32>),
}

#[derive(Serialize)]
struct StdinData {
    data: String,
}

#[derive(Serialize, Default)]
struct OutboundFrame {
    #[serde(skip_serializing_if = "Option::is_none")]
    stdin: Option<StdinData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tty_size: Option<TtySize>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct OutputChunk {
    data: Option<String>,
    close: bool,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ExitResult {
    exit_code: i32,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct InboundFrame {
    stdout: Option<OutputChunk>,
    stderr: Option<OutputChunk>,
    exited: bool,
    result: Option<ExitResult>,
}

impl ExecFrame {
    pub fn encode(&self) -> Result<String, SourceError> {
        let frame = match self {
            ExecFrame::Stdin(bytes) => OutboundFrame {
                stdin: Some(StdinData {
                    data: STANDARD.encode(bytes),
                }),
                ..Default::default()
            },
            ExecFrame::Resize(size) => OutboundFrame {
                tty_size: Some(*size),
                ..Default::default()
            },
            ExecFrame::Heartbeat => OutboundFrame::default(),
        };
        Ok(serde_json::to_string(&frame)?)
    }
}

fn decode_chunk(chunk: &OutputChunk, out: &mut Vec<u8>) -> Result<(), SourceError> {
    if let Some(data) = chunk.data.as_deref().filter(|d| !d.is_empty()) {
        let bytes = STANDARD
            .decode(data)
            .map_err(|e| SourceError::Decode(format!("exec output: {e}")))?;
        out.extend_from_slice(&bytes);
    }
    Ok(())
}

/// Decodes one inbound text frame. An exit signal wins over any output in the same frame.
pub fn decode_frame(text: &str) -> Result<Vec<ExecEvent>, SourceError> {
    let frame: InboundFrame = serde_json::from_str(text)?;

    if frame.exited || frame.result.is_some() {
        let code = frame.result.map(|r| r.exit_code);
        return Ok(vec![ExecEvent::Complete(code)]);
    }

    let mut bytes = Vec::new();
    let mut closed = false;
    for chunk in [&frame.stdout, &frame.stderr].into_iter().flatten() {
        decode_chunk(chunk, &mut bytes)?;
        closed |= chunk.close;
    }

    let mut events = Vec::new();
    if !bytes.is_empty() {
        events.push(ExecEvent::Output(String::from_utf8_lossy(&bytes).into_owned()));
    }
    if closed {
        events.push(ExecEvent::Complete(None));
    }
    Ok(events)
}

/// Moves frames between the socket and the session channels until the session ends.
///
/// Ends when the remote side signals completion or the socket closes. Dropping
/// the input sender (detach) closes the socket even while a read is pending.
#[tracing::instrument(skip_all)]
pub async fn pump<S>(mut socket: S, output: StreamSender<ExecEvent>, mut input: mpsc::UnboundedReceiver<ExecFrame>)
where
    S: Stream<Item = Result<Message, WsError>> + Sink<Message, Error = WsError> + Unpin,
{
    loop {
        if !output.is_active() {
            tracing::debug!("exec consumer gone, closing socket");
            let _ = socket.close().await;
            return;
        }
        tokio::select! {
            _ = output.closed() => continue,
            frame = input.recv() => {
                let Some(frame) = frame else {
                    tracing::debug!("exec input closed, closing socket");
                    let _ = socket.close().await;
                    return;
                };
                let text = match frame.encode() {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!("failed to encode exec frame: {e}");
                        continue;
                    }
                };
                if let Err(e) = socket.send(Message::Text(text)).await {
                    output.fail(e.into());
                    return;
                }
            }
            message = socket.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => match decode_frame(&text) {
                        Ok(events) => {
                            for event in events {
                                let done = matches!(event, ExecEvent::Complete(_));
                                if !output.send(event) || done {
                                    let _ = socket.close().await;
                                    return;
                                }
                            }
                        }
                        Err(e) => {
                            output.fail(e);
                            return;
                        }
                    },
                    Some(Ok(Message::Close(frame))) => {
                        tracing::debug!(?frame, "exec socket closed by server");
                        output.send(ExecEvent::Complete(None));
                        return;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        output.fail(e.into());
                        return;
                    }
                    None => {
                        output.send(ExecEvent::Complete(None));
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::{stream_channel, ExecHandle, StreamRead};
    use futures::channel::mpsc as fmpsc;
    use std::pin::Pin;
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    };
    use std::task::{Context, Poll};
    use tokio_tungstenite::tungstenite::error::ProtocolError;

    /// In-memory socket: frames pushed into `inbound` are read by the pump,
    /// frames the pump sends land in `sent`.
    struct FakeSocket {
        inbound: fmpsc::UnboundedReceiver<Result<Message, WsError>>,
        sent: Arc<Mutex<Vec<Message>>>,
        closed: Arc<AtomicBool>,
    }

    struct Remote {
        inbound: fmpsc::UnboundedSender<Result<Message, WsError>>,
        sent: Arc<Mutex<Vec<Message>>>,
        closed: Arc<AtomicBool>,
    }

    fn fake_socket() -> (FakeSocket, Remote) {
        let (tx, rx) = fmpsc::unbounded();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));
        (
            FakeSocket {
                inbound: rx,
                sent: sent.clone(),
                closed: closed.clone(),
            },
            Remote {
                inbound: tx,
                sent,
                closed,
            },
        )
    }

    impl Stream for FakeSocket {
        type Item = Result<Message, WsError>;

        fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
            self.inbound.poll_next_unpin(cx)
        }
    }

    impl Sink<Message> for FakeSocket {
        type Error = WsError;

        fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), WsError>> {
            Poll::Ready(Ok(()))
        }

        fn start_send(self: Pin<&mut Self>, item: Message) -> Result<(), WsError> {
            self.sent.lock().unwrap().push(item);
            Ok(())
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), WsError>> {
            Poll::Ready(Ok(()))
        }

        fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), WsError>> {
            self.closed.store(true, Ordering::SeqCst);
            Poll::Ready(Ok(()))
        }
    }

    fn start(socket: FakeSocket) -> (ExecHandle, tokio::task::JoinHandle<()>) {
        let (output_tx, output) = stream_channel::<ExecEvent>("exec");
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(pump(socket, output_tx, input_rx));
        (ExecHandle::new(output, input_tx), task)
    }

    async fn finished(task: tokio::task::JoinHandle<()>) -> bool {
        tokio::time::timeout(Duration::from_secs(2), task).await.is_ok()
    }

    #[tokio::test]
    async fn test_pump_writes_input_frames() {
        let (socket, remote) = fake_socket();
        let (handle, task) = start(socket);
        assert!(handle.send(ExecFrame::Stdin(b"ls\r".to_vec())));
        assert!(handle.send(ExecFrame::Heartbeat));
        tokio::time::timeout(Duration::from_secs(2), async {
            while remote.sent.lock().unwrap().len() < 2 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        remote
            .inbound
            .unbounded_send(Ok(Message::Text(r#"{"exited":true}"#.into())))
            .unwrap();
        assert!(matches!(
            handle.output.read_next().await,
            StreamRead::Item(ExecEvent::Complete(None))
        ));
        assert!(finished(task).await);

        let sent = remote.sent.lock().unwrap().clone();
        assert_eq!(
            sent,
            vec![
                Message::Text(r#"{"stdin":{"data":"bHMN"}}"#.into()),
                Message::Text("{}".into()),
            ]
        );
        assert!(remote.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_detach_closes_idle_socket() {
        let (socket, remote) = fake_socket();
        let (handle, task) = start(socket);

        let reader = handle.output.clone();
        let pending = tokio::spawn(async move { reader.read_next().await });

        handle.close();
        drop(handle);
        assert!(finished(task).await);
        assert!(remote.closed.load(Ordering::SeqCst));
        assert!(matches!(pending.await.unwrap(), StreamRead::Closed));
    }

    #[tokio::test]
    async fn test_server_close_completes_session() {
        let (socket, remote) = fake_socket();
        let (handle, task) = start(socket);
        remote.inbound.unbounded_send(Ok(Message::Close(None))).unwrap();
        assert!(matches!(
            handle.output.read_next().await,
            StreamRead::Item(ExecEvent::Complete(None))
        ));
        assert!(finished(task).await);
    }

    #[tokio::test]
    async fn test_stream_end_completes_session() {
        let (socket, remote) = fake_socket();
        let (handle, task) = start(socket);
        remote
            .inbound
            .unbounded_send(Ok(Message::Text(r#"{"stdout":{"data":"aGkK"}}"#.into())))
            .unwrap();
        drop(remote.inbound);
        assert!(matches!(
            handle.output.read_next().await,
            StreamRead::Item(ExecEvent::Output(ref s)) if s == "hi\n"
        ));
        assert!(matches!(
            handle.output.read_next().await,
            StreamRead::Item(ExecEvent::Complete(None))
        ));
        assert!(finished(task).await);
    }

    #[tokio::test]
    async fn test_abnormal_closure_reads_as_closed() {
        let (socket, remote) = fake_socket();
        let (handle, task) = start(socket);
        remote
            .inbound
            .unbounded_send(Err(WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake)))
            .unwrap();
        assert!(matches!(handle.output.read_next().await, StreamRead::Closed));
        assert!(finished(task).await);
    }

    #[test]
    fn test_outbound_frames() {
        assert_eq!(ExecFrame::Heartbeat.encode().unwrap(), "{}");
        assert_eq!(
            ExecFrame::Stdin(b"ls\r".to_vec()).encode().unwrap(),
            r#"{"stdin":{"data":"bHMN"}}"#
        );
        assert_eq!(
            ExecFrame::Resize(TtySize { height: 40, width: 120 }).encode().unwrap(),
            r#"{"tty_size":{"height":40,"width":120}}"#
        );
    }

    #[test]
    fn test_decode_output() {
        let events = decode_frame(r#"{"stdout":{"data":"aGVsbG8K"}}"#).unwrap();
        assert_eq!(events, vec![ExecEvent::Output("hello\n".into())]);
        assert!(decode_frame("{}").unwrap().is_empty());
    }

    #[test]
    fn test_exited_wins_over_buffered_output() {
        let events = decode_frame(r#"{"stdout":{"data":"aGVsbG8K"},"exited":true}"#).unwrap();
        assert_eq!(events, vec![ExecEvent::Complete(None)]);

        let events = decode_frame(r#"{"exited":true,"result":{"exit_code":3}}"#).unwrap();
        assert_eq!(events, vec![ExecEvent::Complete(Some(3))]);
    }

    #[test]
    fn test_close_flag_completes_after_output() {
        let events = decode_frame(r#"{"stderr":{"data":"b29wcw==","close":true}}"#).unwrap();
        assert_eq!(
            events,
            vec![ExecEvent::Output("oops".into()), ExecEvent::Complete(None)]
        );
    }

    #[test]
    fn test_malformed_frame_is_decode_error() {
        assert!(matches!(decode_frame("not json"), Err(SourceError::Decode(_))));
        assert!(matches!(
            decode_frame(r#"{"stdout":{"data":"***"}}"#),
            Err(SourceError::Decode(_))
        ));
    }
}
