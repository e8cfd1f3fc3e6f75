//! Turns API models into page rows.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use super::model::{AllocResourceUsage, AllocStub, JobStub, ResourceUsage};
use crate::structs::{JobKey, PageData, Row, TaskKey};
use crate::table_format::{format_table, Record};
use crate::utils::{format_bytes, pad_key, time_since};

const SHORT_ID_LEN: usize = 8;

fn short_id(id: &str) -> String {
    id.chars().take(SHORT_ID_LEN).collect()
}

fn age_nanos(nanos: i64, now: DateTime<Utc>) -> String {
    if nanos <= 0 {
        return "-".to_string();
    }
    time_since(&Utc.timestamp_nanos(nanos), now)
}

fn table(records: &[Record], keys: Vec<String>, columns: &[String]) -> PageData {
    let formatted = format_table(records, columns);
    let rows = keys
        .into_iter()
        .zip(formatted.lines)
        .map(|(key, text)| Row::new(key, text))
        .collect();
    PageData::new(vec![formatted.header], rows)
}

/// Jobs, ordered by namespace then id.
pub fn job_rows(mut jobs: Vec<JobStub>, columns: &[String], now: DateTime<Utc>) -> PageData {
    jobs.sort_by(|a, b| (&a.namespace, &a.id).cmp(&(&b.namespace, &b.id)));
    let mut records = Vec::with_capacity(jobs.len());
    let mut keys = Vec::with_capacity(jobs.len());
    for job in jobs {
        let mut record = Record::new();
        record.insert("id", job.id.clone());
        record.insert("name", job.name);
        record.insert("type", job.kind);
        record.insert("namespace", job.namespace.clone());
        record.insert("priority", job.priority.to_string());
        record.insert("status", job.status);
        record.insert("submitted", age_nanos(job.submit_time, now));
        records.push(record);
        keys.push(
            JobKey {
                namespace: job.namespace,
                job_id: job.id,
            }
            .encode(),
        );
    }
    table(&records, keys, columns)
}

/// One row per task of every allocation, newest allocation first.
pub fn task_rows(mut allocs: Vec<AllocStub>, columns: &[String], now: DateTime<Utc>) -> PageData {
    allocs.sort_by(|a, b| b.create_time.cmp(&a.create_time).then_with(|| a.name.cmp(&b.name)));
    let mut records = Vec::new();
    let mut keys = Vec::new();
    for alloc in &allocs {
        let Some(states) = alloc.task_states.as_ref() else {
            continue;
        };
        let mut tasks: Vec<_> = states.iter().collect();
        tasks.sort_by(|a, b| a.0.cmp(b.0));
        for (task, state) in tasks {
            let mut record = Record::new();
            record.insert("job", alloc.job_id.clone());
            record.insert("node", alloc.node_name.clone());
            record.insert("alloc_id", short_id(&alloc.id));
            record.insert("alloc_name", alloc.name.clone());
            record.insert("task", task.clone());
            let status = if state.failed {
                format!("{} (failed)", state.state)
            } else {
                state.state.clone()
            };
            record.insert("state", status);
            record.insert(
                "started",
                state.started().map(|t| time_since(t, now)).unwrap_or_else(|| "-".into()),
            );
            record.insert(
                "finished",
                state.finished().map(|t| time_since(t, now)).unwrap_or_else(|| "-".into()),
            );
            records.push(record);
            keys.push(
                TaskKey {
                    namespace: alloc.namespace.clone(),
                    job_id: alloc.job_id.clone(),
                    alloc_id: alloc.id.clone(),
                    alloc_name: alloc.name.clone(),
                    task: task.clone(),
                }
                .encode(),
            );
        }
    }
    table(&records, keys, columns)
}

fn usage_record(name: String, usage: &ResourceUsage) -> Record {
    let mut record = Record::new();
    record.insert("task", name);
    record.insert("cpu", format!("{:.2}%", usage.cpu_stats.percent));
    record.insert("cpu_ticks", format!("{:.0}", usage.cpu_stats.total_ticks));
    record.insert("memory_rss", format_bytes(usage.memory_stats.rss));
    record.insert("memory_usage", format_bytes(usage.memory_stats.usage));
    record.insert("memory_cache", format_bytes(usage.memory_stats.cache));
    record
}

/// Per-task resource usage followed by the allocation total.
pub fn stats_rows(usage: &AllocResourceUsage) -> PageData {
    let columns: Vec<String> = ["Task", "CPU", "CPU Ticks", "Memory RSS", "Memory Usage", "Memory Cache"]
        .iter()
        .map(|c| c.to_string())
        .collect();
    let mut tasks: Vec<_> = usage.tasks.iter().collect();
    tasks.sort_by(|a, b| a.0.cmp(b.0));

    let mut records: Vec<Record> = tasks
        .into_iter()
        .map(|(name, task)| usage_record(name.clone(), &task.resource_usage))
        .collect();
    records.push(usage_record("(total)".to_string(), &usage.resource_usage));
    let keys = (0..records.len()).map(pad_key).collect();
    table(&records, keys, &columns)
}

/// Pretty JSON document, one row per line.
pub fn json_rows(value: &Value) -> PageData {
    let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    PageData::from_text(&text)
}

/// `key = value` lines of a job's meta block, sorted by key.
pub fn meta_rows(job: &Value) -> PageData {
    let mut lines: Vec<String> = job
        .get("Meta")
        .and_then(Value::as_object)
        .map(|meta| {
            meta.iter()
                .map(|(k, v)| match v.as_str() {
                    Some(s) => format!("{k} = {s}"),
                    None => format!("{k} = {v}"),
                })
                .collect()
        })
        .unwrap_or_default();
    if lines.is_empty() {
        return PageData::from_text("(no meta)");
    }
    lines.sort();
    PageData::from_text(&lines.join("\n"))
}
