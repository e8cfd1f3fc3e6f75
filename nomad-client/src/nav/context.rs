use std::collections::HashMap;

use crate::cmd::admin::AdminAction;
use crate::nav::page_kind::PageKind;
use crate::streaming::events::ClusterEvent;
use crate::structs::{JobKey, LogKind, TaskKey};

/// Identifiers threaded across pages.
#[derive(Debug, Default)]
pub struct NavigationContext {
    pub namespace: String,
    pub job_id: String,
    pub alloc_id: String,
    pub alloc_name: String,
    pub task: String,
    pub log_kind: LogKind,
    /// Selected row of the log page, for the log line view.
    pub log_line: String,
    /// Events received by the current event page; rows are keyed by index into this.
    pub events: Vec<ClusterEvent>,
    pub selected_event: Option<ClusterEvent>,
    /// Choices of the admin menu currently shown.
    pub admin_menu: Vec<AdminAction>,
    pub pending_admin: Option<AdminAction>,
    pub exec_command: String,
    /// Bumped on every page entry and reload; timers and streams carry the value they were issued under.
    pub update_id: u64,
    entered_from: HashMap<PageKind, PageKind>,
}

impl NavigationContext {
    pub fn next_update_id(&mut self) -> u64 {
        self.update_id += 1;
        self.update_id
    }

    pub fn set_job(&mut self, key: JobKey) {
        self.namespace = key.namespace;
        self.job_id = key.job_id;
    }

    pub fn set_task(&mut self, key: TaskKey) {
        self.namespace = key.namespace;
        self.job_id = key.job_id;
        self.alloc_id = key.alloc_id;
        self.alloc_name = key.alloc_name;
        self.task = key.task;
    }

    pub fn record_origin(&mut self, page: PageKind, from: PageKind) {
        self.entered_from.insert(page, from);
    }

    pub fn origin(&self, page: PageKind) -> Option<PageKind> {
        self.entered_from.get(&page).copied()
    }

    /// `job / alloc / task` trail for the header, omitting unset parts.
    pub fn breadcrumbs(&self, page: PageKind) -> String {
        let mut parts: Vec<&str> = Vec::new();
        let scoped_to_job = !matches!(page, PageKind::Jobs | PageKind::AllTasks | PageKind::AllEvents | PageKind::AllEvent);
        if scoped_to_job && !self.job_id.is_empty() {
            parts.push(&self.job_id);
        }
        let scoped_to_task = page.within_task()
            || matches!(
                page,
                PageKind::AllocEvent
                    | PageKind::Exec
                    | PageKind::ExecComplete
                    | PageKind::TaskAdminMenu
                    | PageKind::TaskAdminConfirm
            );
        if scoped_to_task && !self.task.is_empty() {
            parts.push(&self.alloc_name);
            parts.push(&self.task);
        }
        parts.join(" / ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_id_is_monotonic() {
        let mut ctx = NavigationContext::default();
        let a = ctx.next_update_id();
        let b = ctx.next_update_id();
        assert!(b > a);
        assert_eq!(ctx.update_id, b);
    }

    #[test]
    fn test_breadcrumbs_follow_page_scope() {
        let mut ctx = NavigationContext::default();
        ctx.set_task(TaskKey {
            namespace: "default".into(),
            job_id: "web".into(),
            alloc_id: "a1".into(),
            alloc_name: "web.api[0]".into(),
            task: "server".into(),
        });
        assert_eq!(ctx.breadcrumbs(PageKind::Jobs), "");
        assert_eq!(ctx.breadcrumbs(PageKind::JobTasks), "web");
        assert_eq!(ctx.breadcrumbs(PageKind::Logs), "web / web.api[0] / server");
    }

    #[test]
    fn test_origin() {
        let mut ctx = NavigationContext::default();
        assert_eq!(ctx.origin(PageKind::Logs), None);
        ctx.record_origin(PageKind::Logs, PageKind::AllTasks);
        assert_eq!(ctx.origin(PageKind::Logs), Some(PageKind::AllTasks));
    }
}
