//! Side effects requested by the navigator.
//!
//! Every [`Command`] runs as one spawned task that reports back with exactly
//! one [`Msg`]. Tasks never touch navigator state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;

use crate::nav::page_kind::PageKind;
use crate::nav::Msg;
use crate::source::{DataSource, ExecRequest, FetchRequest, LogRequest};
use crate::streaming::events::{ClusterEvent, EventScope};
use crate::streaming::exec::ExecEvent;
use crate::streaming::StreamHandle;

pub mod admin;
pub mod save;

use admin::AdminAction;

#[derive(Debug)]
pub enum Command {
    Fetch {
        page: PageKind,
        gen: u64,
        silent: bool,
        request: FetchRequest,
    },
    OpenEventStream {
        page: PageKind,
        gen: u64,
        scope: EventScope,
    },
    ReadEvent {
        page: PageKind,
        gen: u64,
        handle: StreamHandle<ClusterEvent>,
    },
    OpenLogTail {
        page: PageKind,
        gen: u64,
        request: LogRequest,
    },
    ReadLog {
        page: PageKind,
        gen: u64,
        handle: StreamHandle<String>,
    },
    OpenExec {
        page: PageKind,
        gen: u64,
        request: ExecRequest,
    },
    ReadExec {
        page: PageKind,
        gen: u64,
        handle: StreamHandle<ExecEvent>,
    },
    SchedulePoll {
        page: PageKind,
        gen: u64,
        after: Duration,
    },
    ScheduleHeartbeat {
        page: PageKind,
        gen: u64,
        after: Duration,
    },
    RunAdmin(AdminAction),
    Save {
        path: String,
        content: String,
    },
    ExpireToast {
        id: u64,
        after: Duration,
    },
    Quit,
}

fn reply(tx: &UnboundedSender<Msg>, msg: Msg) {
    if tx.send(msg).is_err() {
        tracing::debug!("update loop gone, dropping result");
    }
}

/// Spawns the task for `command`. `Quit` is handled by the session loop and ignored here.
pub fn execute(command: Command, source: Arc<dyn DataSource>, tx: UnboundedSender<Msg>) {
    match command {
        Command::Fetch {
            page,
            gen,
            silent,
            request,
        } => {
            tokio::spawn(async move {
                let result = source.fetch_rows(&request).await;
                reply(&tx, Msg::Loaded { page, gen, silent, result });
            });
        }
        Command::OpenEventStream { page, gen, scope } => {
            tokio::spawn(async move {
                let result = source.open_event_stream(&scope).await;
                reply(&tx, Msg::EventStreamOpened { page, gen, result });
            });
        }
        Command::ReadEvent { page, gen, handle } => {
            tokio::spawn(async move {
                let read = handle.read_next().await;
                reply(&tx, Msg::EventRead { page, gen, handle, read });
            });
        }
        Command::OpenLogTail { page, gen, request } => {
            tokio::spawn(async move {
                let result = source.open_log_tail(&request).await;
                reply(&tx, Msg::LogTailOpened { page, gen, result });
            });
        }
        Command::ReadLog { page, gen, handle } => {
            tokio::spawn(async move {
                let read = handle.read_next().await;
                reply(&tx, Msg::LogRead { page, gen, handle, read });
            });
        }
        Command::OpenExec { page, gen, request } => {
            tokio::spawn(async move {
                let result = source.open_exec_session(&request).await;
                reply(&tx, Msg::ExecOpened { page, gen, result });
            });
        }
        Command::ReadExec { page, gen, handle } => {
            tokio::spawn(async move {
                let read = handle.read_next().await;
                reply(&tx, Msg::ExecRead { page, gen, handle, read });
            });
        }
        Command::SchedulePoll { page, gen, after } => {
            tokio::spawn(async move {
                tokio::time::sleep(after).await;
                reply(&tx, Msg::PollTick { page, gen });
            });
        }
        Command::ScheduleHeartbeat { page, gen, after } => {
            tokio::spawn(async move {
                tokio::time::sleep(after).await;
                reply(&tx, Msg::HeartbeatTick { page, gen });
            });
        }
        Command::RunAdmin(action) => {
            tokio::spawn(async move {
                let result = source.run_admin(&action).await;
                reply(&tx, Msg::AdminDone { action, result });
            });
        }
        Command::Save { path, content } => {
            tokio::spawn(async move {
                let result = save::save_snapshot(&path, &content)
                    .await
                    .map_err(|e| e.to_string());
                reply(&tx, Msg::Saved { result });
            });
        }
        Command::ExpireToast { id, after } => {
            tokio::spawn(async move {
                tokio::time::sleep(after).await;
                reply(&tx, Msg::ToastExpired { id });
            });
        }
        Command::Quit => {}
    }
}
