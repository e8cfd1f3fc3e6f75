//! Administrative actions offered by the admin menus.

use crate::nav::context::NavigationContext;
use crate::structs::Row;
use crate::utils::pad_key;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminAction {
    RestartTask {
        namespace: String,
        alloc_id: String,
        alloc_name: String,
        task: String,
    },
    RestartAlloc {
        namespace: String,
        alloc_id: String,
        alloc_name: String,
    },
    StopAlloc {
        namespace: String,
        alloc_id: String,
        alloc_name: String,
    },
    StopJob {
        namespace: String,
        job_id: String,
    },
    PurgeJob {
        namespace: String,
        job_id: String,
    },
}

impl AdminAction {
    /// Actions available for the task held in the context.
    pub fn task_menu(ctx: &NavigationContext) -> Vec<AdminAction> {
        vec![
            AdminAction::RestartTask {
                namespace: ctx.namespace.clone(),
                alloc_id: ctx.alloc_id.clone(),
                alloc_name: ctx.alloc_name.clone(),
                task: ctx.task.clone(),
            },
            AdminAction::RestartAlloc {
                namespace: ctx.namespace.clone(),
                alloc_id: ctx.alloc_id.clone(),
                alloc_name: ctx.alloc_name.clone(),
            },
            AdminAction::StopAlloc {
                namespace: ctx.namespace.clone(),
                alloc_id: ctx.alloc_id.clone(),
                alloc_name: ctx.alloc_name.clone(),
            },
        ]
    }

    /// Actions available for the job held in the context.
    pub fn job_menu(ctx: &NavigationContext) -> Vec<AdminAction> {
        vec![
            AdminAction::StopJob {
                namespace: ctx.namespace.clone(),
                job_id: ctx.job_id.clone(),
            },
            AdminAction::PurgeJob {
                namespace: ctx.namespace.clone(),
                job_id: ctx.job_id.clone(),
            },
        ]
    }

    /// Menu rows keyed by position.
    pub fn menu_rows(actions: &[AdminAction]) -> Vec<Row> {
        actions
            .iter()
            .enumerate()
            .map(|(i, action)| Row::new(pad_key(i), action.label()))
            .collect()
    }

    pub fn label(&self) -> String {
        match self {
            AdminAction::RestartTask { task, alloc_name, .. } => format!("Restart task {task} of {alloc_name}"),
            AdminAction::RestartAlloc { alloc_name, .. } => format!("Restart all tasks of {alloc_name}"),
            AdminAction::StopAlloc { alloc_name, .. } => format!("Stop allocation {alloc_name}"),
            AdminAction::StopJob { job_id, .. } => format!("Stop job {job_id}"),
            AdminAction::PurgeJob { job_id, .. } => format!("Stop and purge job {job_id}"),
        }
    }

    pub fn confirm_prompt(&self) -> String {
        format!("{}? Press enter to confirm, esc to cancel", self.label())
    }

    /// Toast text after the server accepted the action.
    pub fn success_message(&self) -> String {
        match self {
            AdminAction::RestartTask { task, alloc_name, .. } => format!("Restarted {task} of {alloc_name}"),
            AdminAction::RestartAlloc { alloc_name, .. } => format!("Restarted {alloc_name}"),
            AdminAction::StopAlloc { alloc_name, .. } => format!("Stopped {alloc_name}"),
            AdminAction::StopJob { job_id, .. } => format!("Stopped job {job_id}"),
            AdminAction::PurgeJob { job_id, .. } => format!("Purged job {job_id}"),
        }
    }

    pub fn failure_message(&self, reason: &str) -> String {
        format!("Failed to {}: {reason}", lowercase_first(&self.label()))
    }
}

fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> NavigationContext {
        let mut ctx = NavigationContext::default();
        ctx.namespace = "default".into();
        ctx.job_id = "web".into();
        ctx.alloc_id = "a1".into();
        ctx.alloc_name = "web.api[0]".into();
        ctx.task = "server".into();
        ctx
    }

    #[test]
    fn test_task_menu() {
        let actions = AdminAction::task_menu(&ctx());
        assert_eq!(actions.len(), 3);
        let rows = AdminAction::menu_rows(&actions);
        assert_eq!(rows[0].text, "Restart task server of web.api[0]");
        assert_eq!(rows[2].key, pad_key(2));
    }

    #[test]
    fn test_messages() {
        let purge = &AdminAction::job_menu(&ctx())[1];
        assert_eq!(purge.success_message(), "Purged job web");
        assert_eq!(purge.failure_message("403"), "Failed to stop and purge job web: 403");
        assert!(purge.confirm_prompt().starts_with("Stop and purge job web?"));
    }
}
