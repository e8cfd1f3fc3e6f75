//! Cluster event feed.
//!
//! The server pushes newline-delimited JSON batches. An empty object is a
//! keep-alive and carries no events.

use futures::StreamExt;
use serde::Deserialize;
use serde_json::Value;

use super::StreamSender;
use crate::error::SourceError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClusterEvent {
    pub topic: String,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub index: u64,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct EventBatch {
    events: Vec<ClusterEvent>,
}

/// What a subscription is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventScope {
    /// Configured topics across the configured namespace.
    Global { topics: Vec<String>, namespace: String },
    Job { namespace: String, job_id: String },
    Alloc { namespace: String, alloc_id: String },
}

impl EventScope {
    /// `topic` query values for the subscription.
    pub fn topics(&self) -> Vec<String> {
        match self {
            EventScope::Global { topics, .. } => topics
                .iter()
                .map(|t| if t.contains(':') { t.clone() } else { format!("{t}:*") })
                .collect(),
            EventScope::Job { job_id, .. } => vec![
                format!("Job:{job_id}"),
                "Allocation:*".to_string(),
                "Evaluation:*".to_string(),
                "Deployment:*".to_string(),
            ],
            EventScope::Alloc { alloc_id, .. } => vec![format!("Allocation:{alloc_id}")],
        }
    }

    pub fn namespace(&self) -> &str {
        match self {
            EventScope::Global { namespace, .. }
            | EventScope::Job { namespace, .. }
            | EventScope::Alloc { namespace, .. } => namespace,
        }
    }

    /// Client-side narrowing for topics the server cannot filter by job.
    pub fn matches(&self, event: &ClusterEvent) -> bool {
        match self {
            EventScope::Global { .. } => true,
            EventScope::Alloc { alloc_id, .. } => event.key == *alloc_id,
            EventScope::Job { job_id, .. } => {
                if event.topic == "Job" {
                    return event.key == *job_id;
                }
                event
                    .payload
                    .as_object()
                    .map(|objects| {
                        objects
                            .values()
                            .any(|obj| obj.get("JobID").and_then(Value::as_str) == Some(job_id.as_str()))
                    })
                    .unwrap_or(false)
            }
        }
    }
}

impl ClusterEvent {
    /// One-line summary used as the row text.
    pub fn summary(&self) -> String {
        format!(
            "{:>8}  {:<12} {:<28} {}/{}",
            self.index, self.topic, self.kind, self.namespace, self.key
        )
    }

    pub fn pretty_payload(&self) -> String {
        serde_json::to_string_pretty(&self.payload).unwrap_or_else(|_| self.payload.to_string())
    }
}

/// Splits a byte stream into lines, holding back an unterminated tail.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buf: Vec<u8>,
}

impl LineDecoder {
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line[..line.len() - 1]);
            let text = text.trim();
            if !text.is_empty() {
                lines.push(text.to_string());
            }
        }
        lines
    }
}

/// Decodes one feed line. Keep-alive lines yield no events.
pub fn decode_line(line: &str) -> Result<Vec<ClusterEvent>, SourceError> {
    let batch: EventBatch = serde_json::from_str(line)?;
    Ok(batch.events)
}

/// Reads the feed until it ends or the consumer goes away.
#[tracing::instrument(skip(response, output))]
pub async fn pump(response: reqwest::Response, scope: EventScope, output: StreamSender<ClusterEvent>) {
    let mut decoder = LineDecoder::default();
    let mut body = response.bytes_stream();
    loop {
        let next = tokio::select! {
            next = body.next() => next,
            _ = output.closed() => return,
        };
        match next {
            Some(Ok(bytes)) => {
                for line in decoder.push(&bytes) {
                    let events = match decode_line(&line) {
                        Ok(events) => events,
                        Err(e) => {
                            output.fail(e);
                            return;
                        }
                    };
                    for event in events.into_iter().filter(|e| scope.matches(e)) {
                        if !output.send(event) {
                            return;
                        }
                    }
                }
            }
            Some(Err(e)) => {
                output.fail(e.into());
                return;
            }
            None => return,
        }
    }
}
