use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, warn};

use super::context::NavigationContext;
use super::page_kind::{Back, PageKind, Shortcut, StreamKind};
use super::Msg;
use crate::cmd::admin::AdminAction;
use crate::cmd::Command;
use crate::config::Config;
use crate::error::SourceError;
use crate::source::{ExecRequest, FetchRequest, LogRequest};
use crate::streaming::events::{ClusterEvent, EventScope};
use crate::streaming::exec::{ExecEvent, ExecFrame, DEFAULT_COMMAND, HEARTBEAT_INTERVAL};
use crate::streaming::{ExecHandle, StreamHandle, StreamRead};
use crate::structs::{JobKey, PageData, Row, TaskKey, TtySize};
use crate::ui::events::{handle_scroll_key, is_detach_key, is_quit_key, key_to_bytes};
use crate::ui::input::InputOutcome;
use crate::ui::layout::body_size;
use crate::ui::page::Page;
use crate::utils::pad_key;

pub const TOAST_DURATION: Duration = Duration::from_secs(4);
const PAN_STEP: isize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub text: String,
    pub error: bool,
}

/// Owns every page and decides what happens next.
///
/// All state changes go through [`Navigator::update`]; anything slow is
/// returned as a [`Command`] for the session to run.
pub struct Navigator {
    config: Arc<Config>,
    pages: HashMap<PageKind, Page>,
    current: PageKind,
    ctx: NavigationContext,
    /// Which job/alloc/task a page's rows belong to. Entering with a different scope starts empty.
    loaded_scope: HashMap<PageKind, String>,
    exec: Option<ExecHandle>,
    toast: Option<Toast>,
    next_toast_id: u64,
    size: (u16, u16),
    quit: bool,
}

impl Navigator {
    pub fn new(config: Arc<Config>) -> Self {
        let current = if config.start_all_tasks { PageKind::AllTasks } else { PageKind::Jobs };
        Self {
            config,
            pages: HashMap::new(),
            current,
            ctx: NavigationContext::default(),
            loaded_scope: HashMap::new(),
            exec: None,
            toast: None,
            next_toast_id: 0,
            size: (80, 24),
            quit: false,
        }
    }

    /// Enters the head page.
    pub fn start(&mut self) -> Vec<Command> {
        let head = self.head();
        let cmds = self.enter(head, None);
        if self.config.start_filtering {
            self.page_mut(head).start_filter();
        }
        cmds
    }

    pub fn current(&self) -> PageKind {
        self.current
    }

    pub fn current_page(&self) -> Option<&Page> {
        self.pages.get(&self.current)
    }

    pub fn context(&self) -> &NavigationContext {
        &self.ctx
    }

    pub fn toast(&self) -> Option<&Toast> {
        self.toast.as_ref()
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn compact(&self) -> bool {
        self.config.compact
    }

    /// Keys go to the remote shell.
    pub fn exec_live(&self) -> bool {
        self.current == PageKind::Exec && self.exec.is_some()
    }

    pub fn update(&mut self, msg: Msg) -> Vec<Command> {
        match msg {
            Msg::Key(key) => self.on_key(key),
            Msg::Resize(width, height) => self.resize(width, height),
            Msg::Loaded {
                page,
                gen,
                silent,
                result,
            } => self.on_loaded(page, gen, silent, result),
            Msg::PollTick { page, gen } => {
                if self.is_stale(page, gen) {
                    return Vec::new();
                }
                self.load(page, gen, true)
            }
            Msg::EventStreamOpened { page, gen, result } => {
                if self.is_stale(page, gen) {
                    return Vec::new();
                }
                match result {
                    Ok(handle) => {
                        self.page_mut(page).set_loading(false);
                        vec![Command::ReadEvent { page, gen, handle }]
                    }
                    Err(e) => self.fail(page, &e),
                }
            }
            Msg::EventRead {
                page,
                gen,
                handle,
                read,
            } => self.on_event_read(page, gen, handle, read),
            Msg::LogTailOpened { page, gen, result } => {
                if self.is_stale(page, gen) {
                    return Vec::new();
                }
                match result {
                    Ok(handle) => vec![Command::ReadLog { page, gen, handle }],
                    Err(e) => self.fail(page, &e),
                }
            }
            Msg::LogRead {
                page,
                gen,
                handle,
                read,
            } => self.on_log_read(page, gen, handle, read),
            Msg::ExecOpened { page, gen, result } => self.on_exec_opened(page, gen, result),
            Msg::ExecRead {
                page,
                gen,
                handle,
                read,
            } => self.on_exec_read(page, gen, handle, read),
            Msg::HeartbeatTick { page, gen } => {
                if self.is_stale(page, gen) {
                    return Vec::new();
                }
                match &self.exec {
                    Some(exec) if exec.send(ExecFrame::Heartbeat) => vec![Command::ScheduleHeartbeat {
                        page,
                        gen,
                        after: HEARTBEAT_INTERVAL,
                    }],
                    _ => Vec::new(),
                }
            }
            Msg::AdminDone { action, result } => {
                let cmd = match result {
                    Ok(_) => self.show_toast(action.success_message(), false),
                    Err(e) => {
                        warn!(error = %e, "admin action failed");
                        self.show_toast(action.failure_message(&e.to_string()), true)
                    }
                };
                vec![cmd]
            }
            Msg::Saved { result } => {
                let cmd = match result {
                    Ok(path) => self.show_toast(format!("saved to {}", path.display()), false),
                    Err(e) => self.show_toast(format!("save failed: {e}"), true),
                };
                vec![cmd]
            }
            Msg::ToastExpired { id } => {
                if self.toast.as_ref().is_some_and(|t| t.id == id) {
                    self.toast = None;
                }
                Vec::new()
            }
        }
    }

    // --- pages ---------------------------------------------------------

    fn head(&self) -> PageKind {
        if self.config.start_all_tasks {
            PageKind::AllTasks
        } else {
            PageKind::Jobs
        }
    }

    fn page_mut(&mut self, kind: PageKind) -> &mut Page {
        let (width, height) = body_size(self.size.0, self.size.1, self.config.compact);
        let config = &self.config;
        self.pages.entry(kind).or_insert_with(|| {
            let caps = kind.capabilities();
            let wrap = config.wrap || kind == PageKind::Logline;
            let mut page = Page::new(caps.filter_mode, caps.selectable, wrap, config.compact);
            page.viewport_mut().resize(width, height);
            page
        })
    }

    fn is_stale(&self, page: PageKind, gen: u64) -> bool {
        let stale = page != self.current || gen != self.ctx.update_id;
        if stale {
            debug!(?page, gen, current = ?self.current, "dropping stale message");
        }
        stale
    }

    fn fail(&mut self, page: PageKind, error: &SourceError) -> Vec<Command> {
        warn!(?page, %error, "page update failed");
        self.page_mut(page).set_error(error.banner());
        Vec::new()
    }

    fn show_toast(&mut self, text: String, error: bool) -> Command {
        self.next_toast_id += 1;
        let id = self.next_toast_id;
        self.toast = Some(Toast { id, text, error });
        Command::ExpireToast {
            id,
            after: TOAST_DURATION,
        }
    }

    fn resize(&mut self, width: u16, height: u16) -> Vec<Command> {
        self.size = (width, height);
        let (body_width, body_height) = body_size(width, height, self.config.compact);
        for page in self.pages.values_mut() {
            page.viewport_mut().resize(body_width, body_height);
        }
        if let Some(exec) = self.exec.as_ref().filter(|_| self.current == PageKind::Exec) {
            exec.send(ExecFrame::Resize(TtySize {
                height: body_height,
                width: body_width,
            }));
        }
        Vec::new()
    }

    fn scope_key(&self, kind: PageKind) -> Option<String> {
        let ctx = &self.ctx;
        match kind {
            PageKind::Jobs | PageKind::AllTasks => Some(String::new()),
            PageKind::JobSpec | PageKind::JobMeta | PageKind::JobTasks => {
                Some(format!("{}/{}", ctx.namespace, ctx.job_id))
            }
            PageKind::AllocSpec | PageKind::Stats => Some(ctx.alloc_id.clone()),
            PageKind::Logs => Some(format!("{}/{}/{}", ctx.alloc_id, ctx.task, ctx.log_kind.as_str())),
            _ => None,
        }
    }

    fn log_request(&self) -> LogRequest {
        LogRequest {
            namespace: self.ctx.namespace.clone(),
            alloc_id: self.ctx.alloc_id.clone(),
            task: self.ctx.task.clone(),
            kind: self.ctx.log_kind,
            offset: self.config.log_offset,
        }
    }

    fn fetch_request(&self, kind: PageKind) -> Option<FetchRequest> {
        let namespace = self.ctx.namespace.clone();
        let request = match kind {
            PageKind::Jobs => FetchRequest::Jobs,
            PageKind::AllTasks => FetchRequest::AllTasks,
            PageKind::JobSpec => FetchRequest::JobSpec {
                namespace,
                job_id: self.ctx.job_id.clone(),
            },
            PageKind::JobMeta => FetchRequest::JobMeta {
                namespace,
                job_id: self.ctx.job_id.clone(),
            },
            PageKind::JobTasks => FetchRequest::JobTasks {
                namespace,
                job_id: self.ctx.job_id.clone(),
            },
            PageKind::AllocSpec => FetchRequest::AllocSpec {
                namespace,
                alloc_id: self.ctx.alloc_id.clone(),
            },
            PageKind::Stats => FetchRequest::Stats {
                namespace,
                alloc_id: self.ctx.alloc_id.clone(),
            },
            PageKind::Logs => FetchRequest::Logs(self.log_request()),
            _ => return None,
        };
        Some(request)
    }

    fn event_scope(&self, kind: PageKind) -> EventScope {
        match kind {
            PageKind::JobEvents => EventScope::Job {
                namespace: self.ctx.namespace.clone(),
                job_id: self.ctx.job_id.clone(),
            },
            PageKind::AllocEvents => EventScope::Alloc {
                namespace: self.ctx.namespace.clone(),
                alloc_id: self.ctx.alloc_id.clone(),
            },
            _ => EventScope::Global {
                topics: self.config.event_topics.clone(),
                namespace: self.config.event_namespace.clone(),
            },
        }
    }

    fn load(&mut self, kind: PageKind, gen: u64, silent: bool) -> Vec<Command> {
        let Some(request) = self.fetch_request(kind) else {
            return Vec::new();
        };
        if !silent {
            self.page_mut(kind).set_loading(true);
        }
        vec![Command::Fetch {
            page: kind,
            gen,
            silent,
            request,
        }]
    }

    fn open_events(&mut self, kind: PageKind, gen: u64) -> Vec<Command> {
        self.ctx.events.clear();
        let page = self.page_mut(kind);
        page.clear();
        page.set_loading(true);
        vec![Command::OpenEventStream {
            page: kind,
            gen,
            scope: self.event_scope(kind),
        }]
    }

    fn enter(&mut self, kind: PageKind, from: Option<PageKind>) -> Vec<Command> {
        if let Some(from) = from {
            if kind.back() == Back::Origin {
                self.ctx.record_origin(kind, from);
            }
        }
        if kind != PageKind::Exec {
            if let Some(exec) = self.exec.take() {
                exec.close();
                debug!("detached from exec session");
            }
        }
        self.current = kind;
        let gen = self.ctx.next_update_id();
        debug!(page = ?kind, gen, "enter page");

        if let Some(scope) = self.scope_key(kind) {
            if self.loaded_scope.get(&kind) != Some(&scope) {
                self.page_mut(kind).clear();
                self.loaded_scope.insert(kind, scope);
            }
        }
        self.page_mut(kind).clear_banner();
        self.populate_local(kind);

        let caps = kind.capabilities();
        if caps.stream == Some(StreamKind::Events) {
            return self.open_events(kind, gen);
        }
        if caps.loads_on_enter {
            return self.load(kind, gen, false);
        }
        Vec::new()
    }

    /// Fills pages whose content comes from the context rather than the cluster.
    fn populate_local(&mut self, kind: PageKind) {
        match kind {
            PageKind::JobEvent | PageKind::AllocEvent | PageKind::AllEvent => {
                let text = self
                    .ctx
                    .selected_event
                    .as_ref()
                    .map(ClusterEvent::pretty_payload)
                    .unwrap_or_default();
                self.page_mut(kind).set_data(PageData::from_text(&text));
            }
            PageKind::Logline => {
                let text = pretty_line(&self.ctx.log_line);
                self.page_mut(kind).set_data(PageData::from_text(&text));
            }
            PageKind::JobAdminMenu | PageKind::TaskAdminMenu => {
                self.ctx.admin_menu = if kind == PageKind::JobAdminMenu {
                    AdminAction::job_menu(&self.ctx)
                } else {
                    AdminAction::task_menu(&self.ctx)
                };
                let rows = AdminAction::menu_rows(&self.ctx.admin_menu);
                self.page_mut(kind).set_data(PageData::new(Vec::new(), rows));
            }
            PageKind::JobAdminConfirm | PageKind::TaskAdminConfirm => {
                let prompt = self
                    .ctx
                    .pending_admin
                    .as_ref()
                    .map(AdminAction::confirm_prompt)
                    .unwrap_or_else(|| "Nothing selected".to_string());
                self.page_mut(kind).set_data(PageData::new(Vec::new(), vec![Row::new(pad_key(0), prompt)]));
            }
            PageKind::Exec => {
                let initial = if self.ctx.exec_command.is_empty() {
                    DEFAULT_COMMAND.to_string()
                } else {
                    self.ctx.exec_command.clone()
                };
                let page = self.page_mut(kind);
                page.clear();
                page.open_input(&initial);
            }
            _ => {}
        }
    }

    // --- fetch and stream results ---------------------------------------

    fn on_loaded(
        &mut self,
        page: PageKind,
        gen: u64,
        silent: bool,
        result: Result<PageData, SourceError>,
    ) -> Vec<Command> {
        if self.is_stale(page, gen) {
            return Vec::new();
        }
        let caps = page.capabilities();
        let mut cmds = Vec::new();
        match result {
            Ok(data) => {
                let view = self.page_mut(page);
                if caps.head && data.rows.is_empty() {
                    view.set_message(empty_head_message(page));
                } else {
                    view.set_data(data);
                }
                if page == PageKind::Logs && !silent {
                    view.viewport_mut().to_bottom();
                    if self.config.log_tail {
                        cmds.push(Command::OpenLogTail {
                            page,
                            gen,
                            request: self.log_request(),
                        });
                    }
                }
            }
            Err(e) => {
                self.fail(page, &e);
            }
        }
        if caps.polls_while_active {
            if let Some(after) = self.config.update_interval {
                cmds.push(Command::SchedulePoll { page, gen, after });
            }
        }
        cmds
    }

    fn on_event_read(
        &mut self,
        page: PageKind,
        gen: u64,
        handle: StreamHandle<ClusterEvent>,
        read: StreamRead<ClusterEvent>,
    ) -> Vec<Command> {
        if self.is_stale(page, gen) {
            debug!(stream = handle.id(), "abandoning event stream");
            return Vec::new();
        }
        match read {
            StreamRead::Item(event) if event.payload.is_null() => {
                vec![Command::ReadEvent { page, gen, handle }]
            }
            StreamRead::Item(event) => {
                let row = Row::new(pad_key(self.ctx.events.len()), event.summary());
                self.ctx.events.push(event);
                self.page_mut(page).append_rows(vec![row]);
                vec![Command::ReadEvent { page, gen, handle }]
            }
            StreamRead::Closed => {
                self.page_mut(page).set_error("Event stream closed, press r to reconnect");
                Vec::new()
            }
            StreamRead::Error(e) => self.fail(page, &e),
        }
    }

    fn on_log_read(
        &mut self,
        page: PageKind,
        gen: u64,
        handle: StreamHandle<String>,
        read: StreamRead<String>,
    ) -> Vec<Command> {
        if self.is_stale(page, gen) {
            debug!(stream = handle.id(), "abandoning log tail");
            return Vec::new();
        }
        match read {
            StreamRead::Item(chunk) => {
                self.page_mut(page).append_text(&chunk);
                vec![Command::ReadLog { page, gen, handle }]
            }
            StreamRead::Closed => {
                self.page_mut(page).set_error("Log stream ended, press r to reload");
                Vec::new()
            }
            StreamRead::Error(e) => self.fail(page, &e),
        }
    }

    // --- exec ----------------------------------------------------------

    fn start_exec(&mut self) -> Vec<Command> {
        let command = self
            .page_mut(PageKind::Exec)
            .take_input()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_COMMAND.to_string());
        let Some(argv) = shlex::split(&command) else {
            warn!(%command, "cannot split exec command");
            self.page_mut(PageKind::Exec).open_input(&command);
            return vec![self.show_toast(format!("unbalanced quotes in: {command}"), true)];
        };
        self.ctx.exec_command = command;
        let (width, height) = body_size(self.size.0, self.size.1, self.config.compact);
        let page = self.page_mut(PageKind::Exec);
        page.clear();
        page.set_loading(true);
        vec![Command::OpenExec {
            page: PageKind::Exec,
            gen: self.ctx.update_id,
            request: ExecRequest {
                namespace: self.ctx.namespace.clone(),
                alloc_id: self.ctx.alloc_id.clone(),
                task: self.ctx.task.clone(),
                command: argv,
                size: TtySize { height, width },
            },
        }]
    }

    fn on_exec_opened(&mut self, page: PageKind, gen: u64, result: Result<ExecHandle, SourceError>) -> Vec<Command> {
        if self.is_stale(page, gen) {
            return Vec::new();
        }
        match result {
            Ok(handle) => {
                let output = handle.output.clone();
                self.exec = Some(handle);
                self.page_mut(page).set_loading(false);
                vec![
                    Command::ReadExec {
                        page,
                        gen,
                        handle: output,
                    },
                    Command::ScheduleHeartbeat {
                        page,
                        gen,
                        after: HEARTBEAT_INTERVAL,
                    },
                ]
            }
            Err(e) => self.fail(page, &e),
        }
    }

    fn on_exec_read(
        &mut self,
        page: PageKind,
        gen: u64,
        handle: StreamHandle<ExecEvent>,
        read: StreamRead<ExecEvent>,
    ) -> Vec<Command> {
        if self.is_stale(page, gen) {
            return Vec::new();
        }
        match read {
            StreamRead::Item(ExecEvent::Output(text)) => {
                let view = self.page_mut(page);
                view.append_text(&text);
                view.viewport_mut().to_bottom();
                vec![Command::ReadExec { page, gen, handle }]
            }
            StreamRead::Item(ExecEvent::Complete(code)) => self.finish_exec(code.map_or_else(
                || "[session finished]".to_string(),
                |code| format!("[session finished, exit code {code}]"),
            )),
            StreamRead::Closed => self.finish_exec("[session finished]".to_string()),
            StreamRead::Error(e) => {
                warn!(error = %e, "exec session failed");
                self.finish_exec(format!("[session failed: {}]", e.banner()))
            }
        }
    }

    /// Moves the transcript to the completion page.
    fn finish_exec(&mut self, status: String) -> Vec<Command> {
        if let Some(exec) = self.exec.take() {
            exec.close();
        }
        let mut rows = self.page_mut(PageKind::Exec).all_rows().to_vec();
        rows.push(Row::new(pad_key(rows.len()), status));
        let complete = self.page_mut(PageKind::ExecComplete);
        complete.set_data(PageData::new(Vec::new(), rows));
        complete.viewport_mut().to_bottom();
        if let Some(origin) = self.ctx.origin(PageKind::Exec) {
            self.ctx.record_origin(PageKind::ExecComplete, origin);
        }
        self.enter(PageKind::ExecComplete, None)
    }

    // --- keys ----------------------------------------------------------

    fn on_key(&mut self, key: KeyEvent) -> Vec<Command> {
        if let Some(cmds) = self.modal_key(key) {
            return cmds;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit = true;
            return vec![Command::Quit];
        }
        if self.current_page().is_some_and(|p| p.filter().is_focused()) {
            self.filter_key(key);
            return Vec::new();
        }
        self.nav_key(key)
    }

    /// Prompts and live sessions capture every key.
    fn modal_key(&mut self, key: KeyEvent) -> Option<Vec<Command>> {
        let kind = self.current;

        if let Some(input) = self.page_mut(kind).input_mut() {
            return Some(match input.handle_key(key) {
                InputOutcome::Submit if kind == PageKind::Exec => self.start_exec(),
                InputOutcome::Cancel => {
                    self.page_mut(kind).take_input();
                    self.back()
                }
                _ => Vec::new(),
            });
        }

        if let Some(prompt) = self.page_mut(kind).viewport_mut().save_prompt_mut() {
            return Some(match prompt.handle_key(key) {
                InputOutcome::Submit => {
                    let page = self.page_mut(kind);
                    let path = page.viewport_mut().take_save_prompt().unwrap_or_default();
                    vec![Command::Save {
                        path,
                        content: page.snapshot(),
                    }]
                }
                InputOutcome::Cancel => {
                    self.page_mut(kind).viewport_mut().take_save_prompt();
                    Vec::new()
                }
                _ => Vec::new(),
            });
        }

        if self.exec_live() {
            if is_detach_key(&key) {
                return Some(self.back());
            }
            if let (Some(exec), Some(bytes)) = (&self.exec, key_to_bytes(&key)) {
                exec.send(ExecFrame::Stdin(bytes));
            }
            return Some(Vec::new());
        }
        None
    }

    fn filter_key(&mut self, key: KeyEvent) {
        let page = self.page_mut(self.current);
        match key.code {
            KeyCode::Esc => page.cancel_filter(),
            KeyCode::Enter => page.confirm_filter(),
            KeyCode::Backspace => page.filter_backspace(),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => page.filter_push(c),
            _ => {}
        }
    }

    fn nav_key(&mut self, key: KeyEvent) -> Vec<Command> {
        let kind = self.current;
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if !ctrl && handle_scroll_key(self.page_mut(kind).viewport_mut(), key.code) {
            return Vec::new();
        }

        if is_quit_key(&key) {
            self.quit = true;
            return vec![Command::Quit];
        }

        let page = self.page_mut(kind);
        match (key.code, ctrl) {
            (KeyCode::Esc, _) => {
                if page.filter().is_active() {
                    page.clear_filter();
                } else {
                    return self.back();
                }
            }
            (KeyCode::Enter, _) => return self.forward(),
            (KeyCode::Char('r'), false) => return self.reload(),
            (KeyCode::Char('/'), false) => page.start_filter(),
            (KeyCode::Char('n'), false) => page.cycle_next(),
            (KeyCode::Char('N'), false) => page.cycle_prev(),
            (KeyCode::Char('w'), false) => {
                let wrap = !page.viewport().wrap();
                page.viewport_mut().set_wrap(wrap);
            }
            (KeyCode::Char('f'), true) => page.viewport_mut().page(1),
            (KeyCode::Char('b'), true) => page.viewport_mut().page(-1),
            (KeyCode::Char('d'), true) => page.viewport_mut().half_page(1),
            (KeyCode::Char('u'), true) => page.viewport_mut().half_page(-1),
            (KeyCode::Char('s'), true) => page.viewport_mut().open_save_prompt(),
            (KeyCode::Char('g'), false) | (KeyCode::Home, _) => page.viewport_mut().to_top(),
            (KeyCode::Char('G'), false) | (KeyCode::End, _) => page.viewport_mut().to_bottom(),
            (KeyCode::Char('h'), false) | (KeyCode::Left, _) => page.viewport_mut().pan(-PAN_STEP),
            (KeyCode::Char('l'), false) | (KeyCode::Right, _) => page.viewport_mut().pan(PAN_STEP),
            (KeyCode::Char('t'), false) if kind == PageKind::Logs => {
                self.ctx.log_kind = self.ctx.log_kind.toggle();
                return self.enter(PageKind::Logs, None);
            }
            (KeyCode::Char('v'), false) => return self.shortcut(Shortcut::Spec),
            (KeyCode::Char('m'), false) => return self.shortcut(Shortcut::Meta),
            (KeyCode::Char('e'), false) => return self.shortcut(Shortcut::Events),
            (KeyCode::Char('E'), false) => return self.shortcut(Shortcut::AllEvents),
            (KeyCode::Char('x'), false) => return self.shortcut(Shortcut::Exec),
            (KeyCode::Char('X'), false) => return self.shortcut(Shortcut::Admin),
            (KeyCode::Char('S'), false) => return self.shortcut(Shortcut::Stats),
            (KeyCode::Char('T'), false) => return self.shortcut(Shortcut::AllTasks),
            _ => {}
        }
        Vec::new()
    }

    // --- transitions ---------------------------------------------------

    fn back(&mut self) -> Vec<Command> {
        let target = match self.current.back() {
            Back::Head => None,
            Back::Fixed(kind) => Some(kind),
            Back::Origin => self.ctx.origin(self.current),
        };
        match target {
            Some(kind) => self.enter(kind, None),
            None => Vec::new(),
        }
    }

    fn forward(&mut self) -> Vec<Command> {
        let kind = self.current;
        if matches!(kind, PageKind::JobAdminConfirm | PageKind::TaskAdminConfirm) {
            return self.confirm_admin();
        }
        let Some(target) = kind.forward() else {
            return Vec::new();
        };
        if !self.absorb_selection(kind) {
            return Vec::new();
        }
        self.enter(target, Some(kind))
    }

    fn shortcut(&mut self, shortcut: Shortcut) -> Vec<Command> {
        let kind = self.current;
        let Some(target) = kind.shortcut(shortcut) else {
            return Vec::new();
        };
        let needs_row = !matches!(shortcut, Shortcut::AllEvents | Shortcut::AllTasks)
            && (kind == PageKind::Jobs || kind.lists_tasks());
        if needs_row && !self.absorb_selection(kind) {
            return Vec::new();
        }
        self.enter(target, Some(kind))
    }

    fn reload(&mut self) -> Vec<Command> {
        let kind = self.current;
        let caps = kind.capabilities();
        if !caps.reloadable {
            return Vec::new();
        }
        let gen = self.ctx.next_update_id();
        self.page_mut(kind).clear_banner();
        if caps.stream == Some(StreamKind::Events) {
            return self.open_events(kind, gen);
        }
        self.load(kind, gen, false)
    }

    /// Copies what the selected row identifies into the context.
    fn absorb_selection(&mut self, kind: PageKind) -> bool {
        let Some(row) = self.current_page().and_then(Page::selected_row).cloned() else {
            return false;
        };
        let index = row.key.parse::<usize>().ok();
        match kind {
            PageKind::Jobs => match JobKey::decode(&row.key) {
                Some(key) => {
                    self.ctx.set_job(key);
                    true
                }
                None => false,
            },
            PageKind::JobTasks | PageKind::AllTasks => match TaskKey::decode(&row.key) {
                Some(key) => {
                    self.ctx.set_task(key);
                    true
                }
                None => false,
            },
            PageKind::Logs => {
                self.ctx.log_line = row.text;
                true
            }
            PageKind::JobEvents | PageKind::AllocEvents | PageKind::AllEvents => {
                self.ctx.selected_event = index.and_then(|i| self.ctx.events.get(i).cloned());
                self.ctx.selected_event.is_some()
            }
            PageKind::JobAdminMenu | PageKind::TaskAdminMenu => {
                self.ctx.pending_admin = index.and_then(|i| self.ctx.admin_menu.get(i).cloned());
                self.ctx.pending_admin.is_some()
            }
            _ => true,
        }
    }

    fn confirm_admin(&mut self) -> Vec<Command> {
        let Some(action) = self.ctx.pending_admin.take() else {
            return Vec::new();
        };
        let menu = if self.current == PageKind::JobAdminConfirm {
            PageKind::JobAdminMenu
        } else {
            PageKind::TaskAdminMenu
        };
        let return_to = self.ctx.origin(menu).unwrap_or_else(|| self.head());
        let toast = self.show_toast(format!("{}...", action.label()), false);
        let mut cmds = vec![Command::RunAdmin(action), toast];
        cmds.extend(self.enter(return_to, None));
        cmds
    }
}

fn empty_head_message(kind: PageKind) -> &'static str {
    if kind == PageKind::AllTasks {
        "No tasks found. If the cluster is not empty, check that NOMAD_TOKEN grants read access."
    } else {
        "No jobs found. If the cluster is not empty, check that NOMAD_TOKEN grants read access."
    }
}

/// JSON log lines are shown indented; anything else as is.
fn pretty_line(line: &str) -> String {
    serde_json::from_str::<serde_json::Value>(line.trim())
        .ok()
        .filter(|v| v.is_object() || v.is_array())
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or_else(|| line.to_string())
}
