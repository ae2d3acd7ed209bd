//! REST 远程存储
//!
//! 通过 HTTP 调用血库服务端的 REST 接口

use async_trait::async_trait;
use bloodbank_core::{
    BloodBankError, BloodRequest, DashboardStats, Donor, DonationPayload, DonationReceipt,
    DonorProfile, DonorRegistration, Hospital, HospitalPayload, InventoryPayload, InventoryRecord,
    NewRequestPayload, RecordId, RequestStatus, Result, StatusUpdate, UnavailableDate,
    UnavailableDatesPayload,
};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::store::RemoteStore;

/// 远程存储连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// 接口根地址，如 `http://127.0.0.1:5000/api`
    pub endpoint: String,
    pub authentication: AuthenticationConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:5000/api".to_string(),
            authentication: AuthenticationConfig::None,
        }
    }
}

/// 认证配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthenticationConfig {
    None,
    BearerToken { token: String },
    ApiKey { key: String, header: Option<String> },
}

/// 基于 HTTP 的远程存储
#[derive(Debug, Clone)]
pub struct HttpStore {
    config: StoreConfig,
    client: reqwest::Client,
}

impl HttpStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.client.request(method, self.url(path));
        Self::add_auth_headers(request, &self.config.authentication)
    }

    /// 添加认证头
    fn add_auth_headers(request: RequestBuilder, auth: &AuthenticationConfig) -> RequestBuilder {
        match auth {
            AuthenticationConfig::None => request,
            AuthenticationConfig::BearerToken { token } => request.bearer_auth(token),
            AuthenticationConfig::ApiKey { key, header } => {
                let header_name = header.as_deref().unwrap_or("X-API-Key");
                request.header(header_name, key)
            }
        }
    }

    /// 发送请求并解析 JSON 响应
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, operation: &str) -> Result<T> {
        let response = self.dispatch(request, operation).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| BloodBankError::RemoteFailure(format!("{}: invalid response body: {}", operation, e)))
    }

    /// 拉取列表；单条记录解析失败时跳过并告警，不影响其余记录
    async fn send_list<T: DeserializeOwned>(&self, request: RequestBuilder, operation: &str) -> Result<Vec<T>> {
        let values: Vec<serde_json::Value> = self.send(request, operation).await?;
        Ok(parse_records(values, operation))
    }

    async fn dispatch(&self, request: RequestBuilder, operation: &str) -> Result<reqwest::Response> {
        debug!("Dispatching {} to {}", operation, self.config.endpoint);

        let response = request.send().await.map_err(|e| {
            warn!("{} failed to reach store: {}", operation, e);
            BloodBankError::RemoteFailure(format!("{}: {}", operation, e))
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // 服务端错误体形如 {"error": "..."}
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or(body);

        warn!("{} rejected by store with {}: {}", operation, status, detail);
        Err(BloodBankError::RemoteFailure(format!("{} ({}): {}", operation, status, detail)))
    }
}

fn parse_records<T: DeserializeOwned>(values: Vec<serde_json::Value>, operation: &str) -> Vec<T> {
    let total = values.len();
    let records: Vec<T> = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<T>(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("{}: skipping malformed record at index {}: {}", operation, index, e);
                None
            }
        })
        .collect();

    if records.len() < total {
        warn!("{}: kept {} of {} records", operation, records.len(), total);
    }
    records
}

#[async_trait]
impl RemoteStore for HttpStore {
    fn name(&self) -> &str {
        &self.config.endpoint
    }

    async fn list_requests(&self) -> Result<Vec<BloodRequest>> {
        self.send_list(self.request(Method::GET, "/requests"), "list requests").await
    }

    async fn create_request(&self, payload: &NewRequestPayload) -> Result<BloodRequest> {
        let request = self.request(Method::POST, "/requests").json(payload);
        self.send(request, "create request").await
    }

    async fn update_request_status(&self, id: RecordId, status: RequestStatus) -> Result<BloodRequest> {
        let request = self
            .request(Method::PATCH, &format!("/requests/{}", id))
            .json(&StatusUpdate { status });
        self.send(request, "update request status").await
    }

    async fn list_inventory(&self) -> Result<Vec<InventoryRecord>> {
        self.send_list(self.request(Method::GET, "/inventory"), "list inventory").await
    }

    async fn create_inventory(&self, payload: &InventoryPayload) -> Result<InventoryRecord> {
        let request = self.request(Method::POST, "/inventory").json(payload);
        self.send(request, "create inventory").await
    }

    async fn update_inventory(&self, id: RecordId, payload: &InventoryPayload) -> Result<InventoryRecord> {
        let request = self
            .request(Method::PATCH, &format!("/inventory/{}", id))
            .json(payload);
        self.send(request, "update inventory").await
    }

    async fn list_hospitals(&self) -> Result<Vec<Hospital>> {
        self.send_list(self.request(Method::GET, "/hospitals"), "list hospitals").await
    }

    async fn create_hospital(&self, payload: &HospitalPayload) -> Result<Hospital> {
        let request = self.request(Method::POST, "/hospitals").json(payload);
        self.send(request, "create hospital").await
    }

    async fn update_hospital(&self, id: RecordId, payload: &HospitalPayload) -> Result<Hospital> {
        let request = self
            .request(Method::PATCH, &format!("/hospitals/{}", id))
            .json(payload);
        self.send(request, "update hospital").await
    }

    async fn toggle_hospital(&self, id: RecordId) -> Result<Hospital> {
        let request = self.request(Method::PATCH, &format!("/hospitals/{}/toggle", id));
        self.send(request, "toggle hospital").await
    }

    async fn delete_hospital(&self, id: RecordId) -> Result<()> {
        let request = self.request(Method::DELETE, &format!("/hospitals/{}", id));
        self.dispatch(request, "delete hospital").await?;
        Ok(())
    }

    async fn list_donors(&self) -> Result<Vec<Donor>> {
        self.send_list(self.request(Method::GET, "/donors"), "list donors").await
    }

    async fn register_donor(&self, payload: &DonorRegistration) -> Result<Donor> {
        let request = self.request(Method::POST, "/donors/register").json(payload);
        self.send(request, "register donor").await
    }

    async fn toggle_donor(&self, id: RecordId) -> Result<Donor> {
        let request = self.request(Method::PATCH, &format!("/donors/{}/toggle", id));
        self.send(request, "toggle donor").await
    }

    async fn update_unavailable_dates(&self, id: RecordId, dates: &[UnavailableDate]) -> Result<Donor> {
        let payload = UnavailableDatesPayload {
            unavailable_dates: dates.to_vec(),
        };
        let request = self
            .request(Method::PATCH, &format!("/donors/{}/unavailable-dates", id))
            .json(&payload);
        self.send(request, "update unavailable dates").await
    }

    async fn record_donation(&self, id: RecordId, payload: &DonationPayload) -> Result<DonationReceipt> {
        let request = self
            .request(Method::PATCH, &format!("/donors/{}/record-donation", id))
            .json(payload);
        self.send(request, "record donation").await
    }

    async fn donor_profile(&self, email: &str) -> Result<DonorProfile> {
        let request = self.request(Method::GET, &format!("/donors/profile/{}", email.trim()));
        self.send(request, "fetch donor profile").await
    }

    async fn stats(&self) -> Result<DashboardStats> {
        self.send(self.request(Method::GET, "/stats"), "fetch stats").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(auth: AuthenticationConfig) -> HttpStore {
        HttpStore::new(StoreConfig {
            endpoint: "http://localhost:5000/api/".to_string(),
            authentication: auth,
        })
    }

    #[test]
    fn test_url_joining() {
        let store = store_with(AuthenticationConfig::None);
        assert_eq!(store.url("/requests/7"), "http://localhost:5000/api/requests/7");
    }

    #[test]
    fn test_bearer_auth_header() {
        let store = store_with(AuthenticationConfig::BearerToken {
            token: "abc".to_string(),
        });
        let request = store.request(Method::GET, "/stats").build().unwrap();
        assert_eq!(request.headers()["authorization"], "Bearer abc");
    }

    #[test]
    fn test_api_key_default_header() {
        let store = store_with(AuthenticationConfig::ApiKey {
            key: "secret".to_string(),
            header: None,
        });
        let request = store.request(Method::DELETE, "/hospitals/1").build().unwrap();
        assert_eq!(request.headers()["x-api-key"], "secret");
        assert_eq!(request.method(), &Method::DELETE);
    }

    #[test]
    fn test_malformed_list_records_are_skipped() {
        let donors: Vec<serde_json::Value> = serde_json::from_str(
            r#"[
                {"id": 1, "name": "Asha", "email": "asha@example.org", "phone": "555-0101",
                 "city": "Pune", "bloodGroup": "B+", "available": true},
                {"id": 2, "name": "Ravi", "email": "ravi@example.org", "phone": "555-0102",
                 "city": "Pune", "bloodGroup": "", "available": false}
            ]"#,
        )
        .unwrap();
        let parsed: Vec<Donor> = parse_records(donors, "list donors");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name, "Asha");

        let requests: Vec<serde_json::Value> = serde_json::from_str(
            r#"[
                {"id": 1, "bloodGroup": "A-", "units": 1, "urgency": "LOW", "status": "OPEN"},
                {"id": 2, "hospitalId": 1, "bloodGroup": "O+", "units": 2, "urgency": "HIGH", "status": "OPEN"}
            ]"#,
        )
        .unwrap();
        let parsed: Vec<BloodRequest> = parse_records(requests, "list requests");
        let ids: Vec<RecordId> = parsed.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_profile_route() {
        let store = store_with(AuthenticationConfig::None);
        let request = store
            .request(Method::GET, "/donors/profile/asha@example.org")
            .build()
            .unwrap();
        assert_eq!(request.url().path(), "/api/donors/profile/asha@example.org");
    }

    #[test]
    fn test_auth_config_from_toml_shape() {
        let auth: AuthenticationConfig =
            serde_json::from_str(r#"{"type": "bearer_token", "token": "t"}"#).unwrap();
        assert_eq!(auth, AuthenticationConfig::BearerToken { token: "t".to_string() });
    }
}
