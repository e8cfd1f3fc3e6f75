//! Writing page snapshots to disk.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tokio::io::AsyncWriteExt;

const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

fn expand_home(raw: &str) -> PathBuf {
    if raw == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

/// `name_<suffix>.ext`, or `name_<suffix>` without an extension.
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}_{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{suffix}"),
    };
    path.with_file_name(name)
}

/// Target path and the names to try, in order, when it is taken.
struct SaveTarget {
    path: PathBuf,
    stamp: String,
}

impl SaveTarget {
    /// The n-th candidate: the path itself, then a timestamp before the
    /// extension, then the timestamp plus a counter.
    fn candidate(&self, n: u32) -> PathBuf {
        match n {
            0 => self.path.clone(),
            1 => with_suffix(&self.path, &self.stamp),
            n => with_suffix(&self.path, &format!("{}-{}", self.stamp, n - 1)),
        }
    }
}

/// Resolves the target for a snapshot, creating missing directories.
///
/// An empty input or a directory gets a timestamp file name.
async fn save_target(raw: &str, now: DateTime<Local>) -> std::io::Result<SaveTarget> {
    let stamp = now.format(TIMESTAMP_FORMAT).to_string();
    let default_name = format!("nomad-tui-{stamp}.txt");
    let raw = raw.trim();

    let mut path = if raw.is_empty() {
        PathBuf::from(".").join(&default_name)
    } else {
        expand_home(raw)
    };
    let names_dir = raw.ends_with('/') || raw == "~" || tokio::fs::metadata(&path).await.map(|m| m.is_dir()).unwrap_or(false);
    if names_dir {
        path = path.join(&default_name);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(SaveTarget { path, stamp })
}

/// Creates the first free candidate and writes `content` into it. Files are
/// opened with `create_new`, so an existing file is never overwritten, even
/// by a concurrent save racing for the same name.
async fn write_new(target: &SaveTarget, content: &str) -> std::io::Result<PathBuf> {
    let mut n = 0;
    loop {
        let candidate = target.candidate(n);
        let opened = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
            .await;
        match opened {
            Ok(mut file) => {
                file.write_all(content.as_bytes()).await?;
                file.flush().await?;
                return Ok(candidate);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => n += 1,
            Err(e) => return Err(e),
        }
    }
}

async fn save_at(raw: &str, content: &str, now: DateTime<Local>) -> std::io::Result<PathBuf> {
    let target = save_target(raw, now).await?;
    write_new(&target, content).await
}

/// Writes `content` to a fresh path derived from `raw`.
#[tracing::instrument(skip(content), fields(bytes = content.len()))]
pub async fn save_snapshot(raw: &str, content: &str) -> std::io::Result<PathBuf> {
    let path = save_at(raw, content, Local::now()).await?;
    tracing::info!(path = %path.display(), "snapshot saved");
    Ok(path)
}
