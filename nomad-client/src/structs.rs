use serde::{Deserialize, Serialize};

/// Separator used inside composite row keys. Never appears in ids or names.
const KEY_SEP: char = '\u{1f}';

/// One addressable line of display content.
///
/// `key` is opaque to the viewport; the navigator decodes it per page kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub key: String,
    pub text: String,
}

impl Row {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }
}

/// Result of a successful page fetch.
#[derive(Debug, Clone, Default)]
pub struct PageData {
    pub header: Vec<String>,
    pub rows: Vec<Row>,
    /// Text ended mid-line; the next streamed chunk continues the last row.
    pub partial_last: bool,
}

impl PageData {
    pub fn new(header: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            header,
            rows,
            partial_last: false,
        }
    }

    /// Builds headerless content from plain text, one row per line.
    pub fn from_text(text: &str) -> Self {
        let rows = text
            .lines()
            .enumerate()
            .map(|(i, line)| Row::new(crate::utils::pad_key(i), crate::utils::sanitize_line(line)))
            .collect();
        Self {
            header: Vec::new(),
            rows,
            partial_last: !text.is_empty() && !text.ends_with('\n'),
        }
    }
}

/// Which log stream of a task is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    #[default]
    Stdout,
    Stderr,
}

impl LogKind {
    pub fn toggle(self) -> Self {
        match self {
            LogKind::Stdout => LogKind::Stderr,
            LogKind::Stderr => LogKind::Stdout,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogKind::Stdout => "stdout",
            LogKind::Stderr => "stderr",
        }
    }
}

/// Key of a row on the jobs page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobKey {
    pub namespace: String,
    pub job_id: String,
}

impl JobKey {
    pub fn encode(&self) -> String {
        format!("{}{KEY_SEP}{}", self.namespace, self.job_id)
    }

    pub fn decode(key: &str) -> Option<Self> {
        let (namespace, job_id) = key.split_once(KEY_SEP)?;
        Some(Self {
            namespace: namespace.to_string(),
            job_id: job_id.to_string(),
        })
    }
}

/// Key of a row on a task list page: one allocation task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskKey {
    pub namespace: String,
    pub job_id: String,
    pub alloc_id: String,
    pub alloc_name: String,
    pub task: String,
}

impl TaskKey {
    pub fn encode(&self) -> String {
        [
            self.namespace.as_str(),
            self.job_id.as_str(),
            self.alloc_id.as_str(),
            self.alloc_name.as_str(),
            self.task.as_str(),
        ]
        .join(&KEY_SEP.to_string())
    }

    pub fn decode(key: &str) -> Option<Self> {
        let mut parts = key.split(KEY_SEP);
        let key = Self {
            namespace: parts.next()?.to_string(),
            job_id: parts.next()?.to_string(),
            alloc_id: parts.next()?.to_string(),
            alloc_name: parts.next()?.to_string(),
            task: parts.next()?.to_string(),
        };
        if parts.next().is_some() {
            return None;
        }
        Some(key)
    }
}

/// Terminal size reported to a remote exec session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TtySize {
    pub height: u16,
    pub width: u16,
}
