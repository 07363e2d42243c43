// Hand-crafted async HTTP client for the infrastructure backend.
//
// Base path: /api/infrastructure/
// Auth: optional bearer token injected by TransportConfig.

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::Error;
use crate::transport::TransportConfig;
use crate::types::{
    BulkImportRequest, BulkImportResult, BulkResult, Container, ContainerSyncResult, ControlAction,
    DashboardSummary, DeviceBulkUpdate, DiscoveredEntity, DockerSetupOutcome, DockerSetupRequest,
    Host, HostCreateResponse, HostPatch, Incident, IncidentPatch, IncidentStatus, MetricLatest,
    MetricPoint, NetworkDevice, NetworkDevicePatch, NewHost, NewIncident, NewNetworkDevice,
    NewService, Room, Service, ServicePatch, SmartHomeDashboard, SourceType,
};

// ── Error response shape from the backend ────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default, alias = "message")]
    error: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the infrastructure backend.
///
/// All feature surfaces reach the backend only through this type: JSON
/// request bodies, URL-encoded query parameters, and one shared response
/// handler that turns 4xx/5xx into structured errors.
pub struct HubClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HubClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL and transport config.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(base_url, http)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Ensure the base URL ends with `/api/infrastructure/`.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();

        if path.ends_with("/api/infrastructure") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/api/infrastructure/"));
        }

        Ok(url)
    }

    /// Absolute URL of the smart-home SSE stream.
    pub fn stream_url(&self) -> Url {
        self.url("smarthome/stream")
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path (e.g. `"hosts"`) onto the base URL.
    fn url(&self, path: &str) -> Url {
        // base_url always ends with `/api/infrastructure/`, so joining works.
        self.base_url
            .join(path)
            .expect("path should be valid relative URL")
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path);
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        Self::handle_response(resp).await
    }

    async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path);
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        Self::handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path);
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    async fn post_empty(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path);
        debug!("POST {url}");

        let resp = self.http.post(url).send().await?;
        Self::handle_empty(resp).await
    }

    async fn post_no_response<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<(), Error> {
        let url = self.url(path);
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        Self::handle_empty(resp).await
    }

    async fn post_empty_with_response<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path);
        debug!("POST {url}");

        let resp = self.http.post(url).send().await?;
        Self::handle_response(resp).await
    }

    async fn patch<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path);
        debug!("PATCH {url}");

        let resp = self.http.patch(url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    async fn delete(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path);
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        Self::handle_empty(resp).await
    }

    async fn delete_with_body<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path);
        debug!("DELETE {url}");

        let resp = self.http.delete(url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    // ── Multipart upload ─────────────────────────────────────────────

    /// Upload a file as multipart form data. Separate entry point from the
    /// JSON verbs, but failures surface through the same error shape.
    pub async fn upload(
        &self,
        path: &str,
        field: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<serde_json::Value, Error> {
        let url = self.url(path);
        debug!("POST {url} (multipart, {} bytes)", bytes.len());

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_owned());
        let form = reqwest::multipart::Form::new().part(field.to_owned(), part);

        let resp = self.http.post(url).multipart(form).send().await?;

        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            if body.is_empty() {
                return Ok(serde_json::Value::Null);
            }
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body,
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview = &body[..body.len().min(200)];
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    /// 2xx without a body is the "ok" marker.
    async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();

        let (message, code) = match serde_json::from_str::<ErrorResponse>(&raw) {
            Ok(err) => (err.error, err.code),
            Err(_) => (None, None),
        };

        let message = message.unwrap_or_else(|| {
            if raw.is_empty() {
                status.to_string()
            } else {
                raw
            }
        });

        if status.is_server_error() {
            Error::Server {
                status: status.as_u16(),
                message,
            }
        } else {
            Error::Client {
                status: status.as_u16(),
                code,
                message,
            }
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Dashboard ────────────────────────────────────────────────────

    pub async fn dashboard(&self) -> Result<DashboardSummary, Error> {
        self.get("dashboard").await
    }

    // ── Hosts ────────────────────────────────────────────────────────

    pub async fn list_hosts(&self) -> Result<Vec<Host>, Error> {
        self.get("hosts").await
    }

    pub async fn get_host(&self, id: i64) -> Result<Host, Error> {
        self.get(&format!("hosts/{id}")).await
    }

    pub async fn create_host(&self, body: &NewHost) -> Result<HostCreateResponse, Error> {
        self.post("hosts", body).await
    }

    pub async fn update_host(&self, id: i64, body: &HostPatch) -> Result<Host, Error> {
        self.patch(&format!("hosts/{id}"), body).await
    }

    pub async fn delete_host(&self, id: i64) -> Result<(), Error> {
        self.delete(&format!("hosts/{id}")).await
    }

    /// Scan the host and replace its hardware record with the result.
    pub async fn detect_hardware(&self, id: i64) -> Result<Host, Error> {
        self.post_empty_with_response(&format!("hosts/{id}/detect-hardware"))
            .await
    }

    pub async fn setup_docker(
        &self,
        id: i64,
        body: &DockerSetupRequest,
    ) -> Result<DockerSetupOutcome, Error> {
        self.post(&format!("hosts/{id}/setup-docker"), body).await
    }

    // ── Containers ───────────────────────────────────────────────────

    pub async fn list_containers(&self) -> Result<Vec<Container>, Error> {
        self.get("containers").await
    }

    pub async fn sync_containers(&self, host_id: i64) -> Result<ContainerSyncResult, Error> {
        self.post_empty_with_response(&format!("containers/sync/{host_id}"))
            .await
    }

    // ── Services ─────────────────────────────────────────────────────

    pub async fn list_services(&self) -> Result<Vec<Service>, Error> {
        self.get("services").await
    }

    pub async fn create_service(&self, body: &NewService) -> Result<Service, Error> {
        self.post("services", body).await
    }

    pub async fn update_service(&self, id: i64, body: &ServicePatch) -> Result<Service, Error> {
        self.patch(&format!("services/{id}"), body).await
    }

    pub async fn delete_service(&self, id: i64) -> Result<(), Error> {
        self.delete(&format!("services/{id}")).await
    }

    /// Run an immediate health check against the service.
    pub async fn check_service(&self, id: i64) -> Result<Service, Error> {
        self.post_empty_with_response(&format!("services/{id}/check"))
            .await
    }

    // ── Network devices ──────────────────────────────────────────────

    pub async fn list_network_devices(&self) -> Result<Vec<NetworkDevice>, Error> {
        self.get("network").await
    }

    pub async fn create_network_device(
        &self,
        body: &NewNetworkDevice,
    ) -> Result<NetworkDevice, Error> {
        self.post("network", body).await
    }

    pub async fn update_network_device(
        &self,
        id: i64,
        body: &NetworkDevicePatch,
    ) -> Result<NetworkDevice, Error> {
        self.patch(&format!("network/{id}"), body).await
    }

    pub async fn delete_network_device(&self, id: i64) -> Result<(), Error> {
        self.delete(&format!("network/{id}")).await
    }

    // ── Incidents ────────────────────────────────────────────────────

    pub async fn list_incidents(
        &self,
        status: Option<IncidentStatus>,
    ) -> Result<Vec<Incident>, Error> {
        match status {
            Some(s) => {
                self.get_with_params("incidents", &[("status", s.as_str().to_owned())])
                    .await
            }
            None => self.get("incidents").await,
        }
    }

    pub async fn create_incident(&self, body: &NewIncident) -> Result<Incident, Error> {
        self.post("incidents", body).await
    }

    pub async fn update_incident(&self, id: i64, body: &IncidentPatch) -> Result<Incident, Error> {
        self.patch(&format!("incidents/{id}"), body).await
    }

    pub async fn delete_incident(&self, id: i64) -> Result<(), Error> {
        self.delete(&format!("incidents/{id}")).await
    }

    // ── Metrics ──────────────────────────────────────────────────────

    pub async fn metrics_latest(
        &self,
        source_type: SourceType,
        source_id: i64,
    ) -> Result<Vec<MetricLatest>, Error> {
        self.get_with_params(
            "metrics/latest",
            &[
                ("source_type", source_type.as_str().to_owned()),
                ("source_id", source_id.to_string()),
            ],
        )
        .await
    }

    /// Time-series query. The backend answers newest-first — callers
    /// normalize ordering themselves.
    pub async fn metrics_query(
        &self,
        source_type: SourceType,
        source_id: i64,
        metric_name: &str,
        from: chrono::DateTime<chrono::Utc>,
        to: chrono::DateTime<chrono::Utc>,
        resolution: &str,
    ) -> Result<Vec<MetricPoint>, Error> {
        self.get_with_params(
            "metrics/query",
            &[
                ("source_type", source_type.as_str().to_owned()),
                ("source_id", source_id.to_string()),
                ("metric_name", metric_name.to_owned()),
                ("from", from.to_rfc3339()),
                ("to", to.to_rfc3339()),
                ("resolution", resolution.to_owned()),
            ],
        )
        .await
    }

    // ── Smart home ───────────────────────────────────────────────────

    pub async fn smarthome_dashboard(&self) -> Result<SmartHomeDashboard, Error> {
        self.get("smarthome/dashboard").await
    }

    pub async fn list_rooms(&self) -> Result<Vec<Room>, Error> {
        self.get("smarthome/rooms").await
    }

    /// All entities known to the integration, grouped by domain, with the
    /// registered flag set for those already imported.
    pub async fn discover_entities(
        &self,
    ) -> Result<std::collections::BTreeMap<String, Vec<DiscoveredEntity>>, Error> {
        self.get("smarthome/discover").await
    }

    pub async fn bulk_import_devices(
        &self,
        body: &BulkImportRequest,
    ) -> Result<BulkImportResult, Error> {
        self.post("smarthome/devices/bulk-import", body).await
    }

    pub async fn bulk_update_devices(&self, body: &DeviceBulkUpdate) -> Result<BulkResult, Error> {
        self.patch("smarthome/devices/bulk-update", body).await
    }

    pub async fn bulk_delete_devices(&self, ids: &[i64]) -> Result<BulkResult, Error> {
        #[derive(Serialize)]
        struct Body<'a> {
            ids: &'a [i64],
        }

        self.delete_with_body("smarthome/devices/bulk-delete", &Body { ids })
            .await
    }

    pub async fn control_device(&self, id: i64, action: ControlAction) -> Result<(), Error> {
        #[derive(Serialize)]
        struct Body {
            action: ControlAction,
        }

        self.post_no_response(&format!("smarthome/devices/{id}/control"), &Body { action })
            .await
    }

    /// Idempotent favorite flip.
    pub async fn favorite_device(&self, id: i64) -> Result<(), Error> {
        self.post_empty(&format!("smarthome/devices/{id}/favorite"))
            .await
    }
}
