//! HTTP and websocket client for the cluster API.

use std::net::ToSocketAddrs;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use http::HeaderValue;
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;

use super::model::{AllocResourceUsage, AllocStub, JobStub};
use super::{rows, DataSource, ExecRequest, FetchRequest, LogRequest};
use crate::cmd::admin::AdminAction;
use crate::config::{Config, TlsConfig};
use crate::error::{ConfigError, SourceError};
use crate::streaming::events::{self, ClusterEvent, EventScope};
use crate::streaming::exec::{self, ExecFrame};
use crate::streaming::{logs, stream_channel, ExecHandle, StreamHandle};
use crate::structs::PageData;

const TOKEN_HEADER: &str = "X-Nomad-Token";
const USER_AGENT: &str = concat!("nomad-tui/", env!("CARGO_PKG_VERSION"));

pub struct NomadSource {
    client: reqwest::Client,
    /// Base for HTTP requests; its host is the TLS server name when one is configured.
    base: Url,
    config: Arc<Config>,
}

impl std::fmt::Debug for NomadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NomadSource")
            .field("base", &self.base.as_str())
            .field("token", &self.config.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn read_pem(path: &std::path::Path) -> Result<Vec<u8>, ConfigError> {
    std::fs::read(path).map_err(|e| ConfigError::Tls {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn tls_error(path: &std::path::Path, e: impl std::fmt::Display) -> ConfigError {
    ConfigError::Tls {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

/// Applies CA, client identity and verification options to the client builder.
fn apply_tls(
    mut builder: reqwest::ClientBuilder,
    tls: &TlsConfig,
    address: &Url,
) -> Result<(reqwest::ClientBuilder, Url), ConfigError> {
    if let Some(ca) = &tls.ca_cert {
        let cert = reqwest::Certificate::from_pem(&read_pem(ca)?).map_err(|e| tls_error(ca, e))?;
        builder = builder.add_root_certificate(cert);
    }

    match (&tls.client_cert, &tls.client_key) {
        (Some(cert), Some(key)) => {
            let mut pem = read_pem(cert)?;
            pem.push(b'\n');
            pem.extend(read_pem(key)?);
            let identity = reqwest::Identity::from_pem(&pem).map_err(|e| tls_error(cert, e))?;
            builder = builder.identity(identity);
        }
        (Some(path), None) | (None, Some(path)) => {
            return Err(tls_error(path, "client certificate and key must be given together"));
        }
        (None, None) => {}
    }

    if tls.skip_verify {
        tracing::warn!("TLS certificate verification disabled");
        builder = builder.danger_accept_invalid_certs(true);
    }

    // Verify against the server name while still connecting to the configured host.
    let mut base = address.clone();
    if let Some(name) = &tls.server_name {
        let host = address.host_str().unwrap_or_default();
        let port = address.port_or_known_default().unwrap_or(4646);
        let addr = (host, port)
            .to_socket_addrs()
            .map_err(|e| tls_error(std::path::Path::new(name), e))?
            .next()
            .ok_or_else(|| tls_error(std::path::Path::new(name), "address did not resolve"))?;
        builder = builder.resolve(name, addr);
        base.set_host(Some(name.as_str()))
            .map_err(|e| tls_error(std::path::Path::new(name), e))?;
    }
    Ok((builder, base))
}

impl NomadSource {
    pub fn new(config: Arc<Config>) -> Result<Self, ConfigError> {
        let builder = reqwest::Client::builder().user_agent(USER_AGENT);
        let (builder, base) = apply_tls(builder, &config.tls, &config.address)?;
        let client = builder.build().map_err(|e| ConfigError::Tls {
            path: config.address.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { client, base, config })
    }

    fn url(&self, path: &str) -> Result<Url, SourceError> {
        self.base
            .join(path)
            .map_err(|e| SourceError::Transport(format!("invalid url {path}: {e}")))
    }

    fn request(&self, method: Method, path: &str, namespace: Option<&str>) -> Result<RequestBuilder, SourceError> {
        let mut builder = self.client.request(method, self.url(path)?);
        if let Some(token) = &self.config.token {
            builder = builder.header(TOKEN_HEADER, token);
        }
        if let Some(region) = &self.config.region {
            builder = builder.query(&[("region", region)]);
        }
        if let Some(namespace) = namespace {
            builder = builder.query(&[("namespace", namespace)]);
        }
        Ok(builder)
    }

    /// Sends a request, turning non-success statuses into errors.
    async fn send(&self, builder: RequestBuilder) -> Result<Response, SourceError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SourceError::from_status(status.as_u16(), body.trim().to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, namespace: Option<&str>) -> Result<T, SourceError> {
        let response = self.send(self.request(Method::GET, path, namespace)?).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn log_request(&self, request: &LogRequest, follow: bool) -> Result<RequestBuilder, SourceError> {
        let path = format!("/v1/client/fs/logs/{}", request.alloc_id);
        let builder = self
            .request(Method::GET, &path, Some(request.namespace.as_str()))?
            .query(&[
                ("task", request.task.as_str()),
                ("type", request.kind.as_str()),
                ("origin", "end"),
            ]);
        Ok(if follow {
            builder.query(&[("offset", "0"), ("follow", "true")])
        } else {
            builder.query(&[("offset", request.offset.to_string().as_str()), ("plain", "true")])
        })
    }

    fn exec_url(&self, request: &ExecRequest) -> Result<Url, SourceError> {
        let mut url = self
            .config
            .websocket_base()
            .join(&format!("/v1/client/allocation/{}/exec", request.alloc_id))
            .map_err(|e| SourceError::Transport(e.to_string()))?;
        let command = serde_json::to_string(&request.command)?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("task", &request.task)
                .append_pair("tty", "true")
                .append_pair("command", &command)
                .append_pair("namespace", &request.namespace);
            if let Some(region) = &self.config.region {
                query.append_pair("region", region);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl DataSource for NomadSource {
    #[tracing::instrument(skip(self))]
    async fn fetch_rows(&self, request: &FetchRequest) -> Result<PageData, SourceError> {
        let now = Utc::now();
        let scope = self.config.namespace.as_str();
        match request {
            FetchRequest::Jobs => {
                let jobs: Vec<JobStub> = self.get_json("/v1/jobs", Some(scope)).await?;
                Ok(rows::job_rows(jobs, &self.config.job_columns, now))
            }
            FetchRequest::JobSpec { namespace, job_id } => {
                let job: Value = self.get_json(&format!("/v1/job/{job_id}"), Some(namespace.as_str())).await?;
                Ok(rows::json_rows(&job))
            }
            FetchRequest::JobMeta { namespace, job_id } => {
                let job: Value = self.get_json(&format!("/v1/job/{job_id}"), Some(namespace.as_str())).await?;
                Ok(rows::meta_rows(&job))
            }
            FetchRequest::JobTasks { namespace, job_id } => {
                let allocs: Vec<AllocStub> = self
                    .get_json(&format!("/v1/job/{job_id}/allocations"), Some(namespace.as_str()))
                    .await?;
                Ok(rows::task_rows(allocs, &self.config.task_columns, now))
            }
            FetchRequest::AllTasks => {
                let allocs: Vec<AllocStub> = self.get_json("/v1/allocations", Some(scope)).await?;
                Ok(rows::task_rows(allocs, &self.config.all_task_columns, now))
            }
            FetchRequest::AllocSpec { namespace, alloc_id } => {
                let alloc: Value = self
                    .get_json(&format!("/v1/allocation/{alloc_id}"), Some(namespace.as_str()))
                    .await?;
                Ok(rows::json_rows(&alloc))
            }
            FetchRequest::Logs(log) => {
                let response = self.send(self.log_request(log, false)?).await?;
                let bytes = response.bytes().await?;
                Ok(PageData::from_text(&String::from_utf8_lossy(&bytes)))
            }
            FetchRequest::Stats { namespace, alloc_id } => {
                let usage: AllocResourceUsage = self
                    .get_json(&format!("/v1/client/allocation/{alloc_id}/stats"), Some(namespace.as_str()))
                    .await?;
                Ok(rows::stats_rows(&usage))
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn open_event_stream(&self, scope: &EventScope) -> Result<StreamHandle<ClusterEvent>, SourceError> {
        let topics: Vec<(&str, String)> = scope.topics().into_iter().map(|t| ("topic", t)).collect();
        let builder = self
            .request(Method::GET, "/v1/event/stream", Some(scope.namespace()))?
            .query(&topics);
        let response = self.send(builder).await?;
        let (tx, handle) = stream_channel(format!("events:{}", scope.namespace()));
        tokio::spawn(events::pump(response, scope.clone(), tx));
        Ok(handle)
    }

    #[tracing::instrument(skip(self))]
    async fn open_log_tail(&self, request: &LogRequest) -> Result<StreamHandle<String>, SourceError> {
        let response = self.send(self.log_request(request, true)?).await?;
        let (tx, handle) = stream_channel(format!(
            "logs:{}/{}/{}",
            request.alloc_id,
            request.task,
            request.kind.as_str()
        ));
        tokio::spawn(logs::pump(response, tx));
        Ok(handle)
    }

    #[tracing::instrument(skip(self))]
    async fn open_exec_session(&self, request: &ExecRequest) -> Result<ExecHandle, SourceError> {
        let url = self.exec_url(request)?;
        let mut ws_request = url.as_str().into_client_request()?;
        if let Some(token) = &self.config.token {
            let value = HeaderValue::from_str(token)
                .map_err(|e| SourceError::Transport(format!("invalid token header: {e}")))?;
            ws_request.headers_mut().insert(TOKEN_HEADER, value);
        }
        let (socket, _) = tokio_tungstenite::connect_async(ws_request).await?;
        tracing::info!(alloc = %request.alloc_id, task = %request.task, "exec session opened");

        let (tx, output) = stream_channel(format!("exec:{}/{}", request.alloc_id, request.task));
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let handle = ExecHandle::new(output, input_tx);
        handle.send(ExecFrame::Resize(request.size));
        tokio::spawn(exec::pump(socket, tx, input_rx));
        Ok(handle)
    }

    #[tracing::instrument(skip(self))]
    async fn run_admin(&self, action: &AdminAction) -> Result<String, SourceError> {
        let builder = match action {
            AdminAction::RestartTask {
                namespace,
                alloc_id,
                task,
                ..
            } => self
                .request(
                    Method::POST,
                    &format!("/v1/client/allocation/{alloc_id}/restart"),
                    Some(namespace.as_str()),
                )?
                .json(&json!({ "TaskName": task })),
            AdminAction::RestartAlloc { namespace, alloc_id, .. } => self
                .request(
                    Method::POST,
                    &format!("/v1/client/allocation/{alloc_id}/restart"),
                    Some(namespace.as_str()),
                )?
                .json(&json!({ "AllTasks": true })),
            AdminAction::StopAlloc { namespace, alloc_id, .. } => {
                self.request(Method::POST, &format!("/v1/allocation/{alloc_id}/stop"), Some(namespace.as_str()))?
            }
            AdminAction::StopJob { namespace, job_id } => {
                self.request(Method::DELETE, &format!("/v1/job/{job_id}"), Some(namespace.as_str()))?
            }
            AdminAction::PurgeJob { namespace, job_id } => self
                .request(Method::DELETE, &format!("/v1/job/{job_id}"), Some(namespace.as_str()))?
                .query(&[("purge", "true")]),
        };
        self.send(builder).await?;
        tracing::info!(?action, "admin action accepted");
        Ok(action.success_message())
    }
}
