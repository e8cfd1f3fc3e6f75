//! Navigation: the page graph, cross-page context and the controller.
//!
//! ```text
//!  terminal keys ─┐
//!  fetch results ─┼─► Msg ─► Navigator::update ─► Vec<Command> ─► cmd::execute
//!  stream reads  ─┤                                                   │
//!  timers        ─┘◄──────────────── one Msg per command ◄─────────────┘
//! ```

pub mod context;
pub mod navigator;
pub mod page_kind;

use std::path::PathBuf;

use crossterm::event::KeyEvent;

use crate::cmd::admin::AdminAction;
use crate::error::SourceError;
use crate::streaming::events::ClusterEvent;
use crate::streaming::exec::ExecEvent;
use crate::streaming::{ExecHandle, StreamHandle, StreamRead};
use crate::structs::PageData;

pub use navigator::{Navigator, Toast};
pub use page_kind::PageKind;

/// Everything the update loop reacts to.
///
/// Results of page-bound work carry the page and the generation id they were
/// issued under; the navigator drops them when either no longer matches.
#[derive(Debug)]
pub enum Msg {
    Key(KeyEvent),
    Resize(u16, u16),
    Loaded {
        page: PageKind,
        gen: u64,
        /// Background poll: no loading indicator, no re-entry side effects.
        silent: bool,
        result: Result<PageData, SourceError>,
    },
    PollTick {
        page: PageKind,
        gen: u64,
    },
    EventStreamOpened {
        page: PageKind,
        gen: u64,
        result: Result<StreamHandle<ClusterEvent>, SourceError>,
    },
    EventRead {
        page: PageKind,
        gen: u64,
        handle: StreamHandle<ClusterEvent>,
        read: StreamRead<ClusterEvent>,
    },
    LogTailOpened {
        page: PageKind,
        gen: u64,
        result: Result<StreamHandle<String>, SourceError>,
    },
    LogRead {
        page: PageKind,
        gen: u64,
        handle: StreamHandle<String>,
        read: StreamRead<String>,
    },
    ExecOpened {
        page: PageKind,
        gen: u64,
        result: Result<ExecHandle, SourceError>,
    },
    ExecRead {
        page: PageKind,
        gen: u64,
        handle: StreamHandle<ExecEvent>,
        read: StreamRead<ExecEvent>,
    },
    HeartbeatTick {
        page: PageKind,
        gen: u64,
    },
    AdminDone {
        action: AdminAction,
        result: Result<String, SourceError>,
    },
    Saved {
        result: Result<PathBuf, String>,
    },
    ToastExpired {
        id: u64,
    },
}
