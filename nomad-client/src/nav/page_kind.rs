//! Page kinds, their static capabilities and the page graph.
//!
//! Everything here is declarative data so the controller never branches on
//! page kinds to decide what a page can do.

use crate::filter::FilterMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKind {
    Jobs,
    JobSpec,
    JobMeta,
    JobEvents,
    JobEvent,
    JobAdminMenu,
    JobAdminConfirm,
    AllTasks,
    JobTasks,
    AllocSpec,
    AllocEvents,
    AllocEvent,
    AllEvents,
    AllEvent,
    Logs,
    Logline,
    Exec,
    ExecComplete,
    Stats,
    TaskAdminMenu,
    TaskAdminConfirm,
}

/// Long-lived feed a page reads from while it is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Events,
    LogTail,
    Exec,
}

/// Where the back key goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Back {
    /// Nowhere: the page heads the graph.
    Head,
    Fixed(PageKind),
    /// Whichever page this one was entered from.
    Origin,
}

#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    pub kind: PageKind,
    pub title: &'static str,
    /// Issues a fetch on entry.
    pub loads_on_enter: bool,
    /// Responds to the manual reload key.
    pub reloadable: bool,
    /// Re-fetches itself on the poll interval while current.
    pub polls_while_active: bool,
    pub selectable: bool,
    pub filter_mode: FilterMode,
    pub stream: Option<StreamKind>,
    /// May sit at the head of the graph; an empty load there is a soft error.
    pub head: bool,
    pub forward: Option<PageKind>,
    pub back: Back,
}

const fn page(kind: PageKind, title: &'static str) -> Capabilities {
    Capabilities {
        kind,
        title,
        loads_on_enter: false,
        reloadable: false,
        polls_while_active: false,
        selectable: false,
        filter_mode: FilterMode::Contextual,
        stream: None,
        head: false,
        forward: None,
        back: Back::Origin,
    }
}

/// A table listing: fetched, reloadable, selectable, exclusive filter.
const fn table(kind: PageKind, title: &'static str, forward: Option<PageKind>, back: Back) -> Capabilities {
    Capabilities {
        loads_on_enter: true,
        reloadable: true,
        polls_while_active: true,
        selectable: true,
        filter_mode: FilterMode::Exclusive,
        forward,
        back,
        ..page(kind, title)
    }
}

/// A fetched text document.
const fn document(kind: PageKind, title: &'static str) -> Capabilities {
    Capabilities {
        loads_on_enter: true,
        reloadable: true,
        ..page(kind, title)
    }
}

/// A live event feed whose rows open the selected event.
const fn feed(kind: PageKind, title: &'static str, forward: PageKind) -> Capabilities {
    Capabilities {
        reloadable: true,
        selectable: true,
        stream: Some(StreamKind::Events),
        forward: Some(forward),
        ..page(kind, title)
    }
}

/// A local menu of choices.
const fn menu(kind: PageKind, title: &'static str, forward: Option<PageKind>, back: Back) -> Capabilities {
    Capabilities {
        selectable: true,
        filter_mode: FilterMode::Exclusive,
        forward,
        back,
        ..page(kind, title)
    }
}

use PageKind as K;

/// Indexed by `PageKind as usize`.
static CAPABILITIES: [Capabilities; 21] = [
    Capabilities { head: true, ..table(K::Jobs, "jobs", Some(K::JobTasks), Back::Head) },
    document(K::JobSpec, "job spec"),
    document(K::JobMeta, "job meta"),
    feed(K::JobEvents, "job events", K::JobEvent),
    Capabilities { back: Back::Fixed(K::JobEvents), ..page(K::JobEvent, "job event") },
    menu(K::JobAdminMenu, "job admin", Some(K::JobAdminConfirm), Back::Origin),
    menu(K::JobAdminConfirm, "confirm", None, Back::Fixed(K::JobAdminMenu)),
    Capabilities { head: true, ..table(K::AllTasks, "all tasks", Some(K::Logs), Back::Origin) },
    table(K::JobTasks, "tasks", Some(K::Logs), Back::Fixed(K::Jobs)),
    document(K::AllocSpec, "allocation spec"),
    feed(K::AllocEvents, "allocation events", K::AllocEvent),
    Capabilities { back: Back::Fixed(K::AllocEvents), ..page(K::AllocEvent, "allocation event") },
    feed(K::AllEvents, "all events", K::AllEvent),
    Capabilities { back: Back::Fixed(K::AllEvents), ..page(K::AllEvent, "event") },
    Capabilities {
        selectable: true,
        stream: Some(StreamKind::LogTail),
        forward: Some(K::Logline),
        ..document(K::Logs, "logs")
    },
    Capabilities { back: Back::Fixed(K::Logs), ..page(K::Logline, "log line") },
    Capabilities { stream: Some(StreamKind::Exec), ..page(K::Exec, "exec") },
    page(K::ExecComplete, "exec finished"),
    Capabilities {
        loads_on_enter: true,
        reloadable: true,
        polls_while_active: true,
        filter_mode: FilterMode::Exclusive,
        ..page(K::Stats, "stats")
    },
    menu(K::TaskAdminMenu, "task admin", Some(K::TaskAdminConfirm), Back::Origin),
    menu(K::TaskAdminConfirm, "confirm", None, Back::Fixed(K::TaskAdminMenu)),
];

/// Page-level actions reachable by a shortcut key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Spec,
    Meta,
    Events,
    AllEvents,
    Exec,
    Admin,
    Stats,
    AllTasks,
}

impl PageKind {
    pub const ALL: [PageKind; 21] = [
        K::Jobs,
        K::JobSpec,
        K::JobMeta,
        K::JobEvents,
        K::JobEvent,
        K::JobAdminMenu,
        K::JobAdminConfirm,
        K::AllTasks,
        K::JobTasks,
        K::AllocSpec,
        K::AllocEvents,
        K::AllocEvent,
        K::AllEvents,
        K::AllEvent,
        K::Logs,
        K::Logline,
        K::Exec,
        K::ExecComplete,
        K::Stats,
        K::TaskAdminMenu,
        K::TaskAdminConfirm,
    ];

    pub fn capabilities(self) -> &'static Capabilities {
        &CAPABILITIES[self as usize]
    }

    pub fn title(self) -> &'static str {
        self.capabilities().title
    }

    pub fn forward(self) -> Option<PageKind> {
        self.capabilities().forward
    }

    pub fn back(self) -> Back {
        self.capabilities().back
    }

    /// Rows identify a single task (allocation + task name).
    pub fn lists_tasks(self) -> bool {
        matches!(self, K::JobTasks | K::AllTasks)
    }

    /// Task context is already fixed when this page is current.
    pub fn within_task(self) -> bool {
        matches!(self, K::Logs | K::Logline | K::Stats | K::AllocSpec | K::AllocEvents)
    }

    /// Target of a shortcut from this page, if it is available here.
    pub fn shortcut(self, shortcut: Shortcut) -> Option<PageKind> {
        use Shortcut as S;
        match (self, shortcut) {
            (_, S::AllEvents) if !matches!(self, K::AllEvents | K::AllEvent | K::Exec) => Some(K::AllEvents),
            (K::Jobs | K::JobTasks, S::Spec) => Some(K::JobSpec),
            (K::Jobs | K::JobTasks, S::Meta) => Some(K::JobMeta),
            (K::Jobs | K::JobTasks, S::Events) => Some(K::JobEvents),
            (K::Jobs, S::Admin) => Some(K::JobAdminMenu),
            (K::Jobs, S::AllTasks) => Some(K::AllTasks),
            (k, S::Spec) if k == K::AllTasks || k == K::Logs => Some(K::AllocSpec),
            (k, S::Events) if k == K::AllTasks || k == K::Logs => Some(K::AllocEvents),
            (k, S::Exec) if k.lists_tasks() || k == K::Logs => Some(K::Exec),
            (k, S::Admin) if k.lists_tasks() || k == K::Logs => Some(K::TaskAdminMenu),
            (k, S::Stats) if k.lists_tasks() || k == K::Logs => Some(K::Stats),
            _ => None,
        }
    }
}
