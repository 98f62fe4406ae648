//! Dashboard resource endpoints
//!
//! Bodies and responses are opaque JSON; the backend owns their shape.

use super::{ApiClient, ClientError, RequestOptions};
use serde_json::Value;
use url::form_urlencoded;

/// Append URL-encoded query parameters to `path`
pub fn with_query(path: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    format!("{path}?{query}")
}

impl ApiClient {
    async fn get_json(&self, endpoint: &str) -> Result<Value, ClientError> {
        self.request(endpoint, RequestOptions::get()).await
    }

    // Admin

    pub async fn admin_summary(&self) -> Result<Value, ClientError> {
        self.get_json("/admin/summary").await
    }

    pub async fn list_clients(&self, params: &[(&str, &str)]) -> Result<Value, ClientError> {
        self.get_json(&with_query("/admin/clients", params)).await
    }

    pub async fn create_client(&self, client: &Value) -> Result<Value, ClientError> {
        self.request("/admin/clients", RequestOptions::post(client.clone()))
            .await
    }

    pub async fn update_client(&self, client_id: &str, client: &Value) -> Result<Value, ClientError> {
        self.request(
            &format!("/admin/clients/{client_id}"),
            RequestOptions::patch(client.clone()),
        )
        .await
    }

    pub async fn delete_client(&self, client_id: &str) -> Result<Value, ClientError> {
        self.request(&format!("/admin/clients/{client_id}"), RequestOptions::delete())
            .await
    }

    pub async fn list_incidents(&self, params: &[(&str, &str)]) -> Result<Value, ClientError> {
        self.get_json(&with_query("/incidents", params)).await
    }

    pub async fn create_incident(&self, incident: &Value) -> Result<Value, ClientError> {
        self.request("/incidents", RequestOptions::post(incident.clone()))
            .await
    }

    pub async fn update_incident(
        &self,
        incident_id: &str,
        incident: &Value,
    ) -> Result<Value, ClientError> {
        self.request(
            &format!("/incidents/{incident_id}"),
            RequestOptions::patch(incident.clone()),
        )
        .await
    }

    pub async fn list_reports(&self, params: &[(&str, &str)]) -> Result<Value, ClientError> {
        self.get_json(&with_query("/reports", params)).await
    }

    pub async fn export_report(&self, report: &Value) -> Result<Value, ClientError> {
        self.request("/reports/export", RequestOptions::post(report.clone()))
            .await
    }

    pub async fn team(&self) -> Result<Value, ClientError> {
        self.get_json("/admin/users").await
    }

    pub async fn update_user_role(&self, user_id: &str, role: &Value) -> Result<Value, ClientError> {
        self.request(
            &format!("/admin/roles/{user_id}"),
            RequestOptions::patch(role.clone()),
        )
        .await
    }

    pub async fn settings(&self) -> Result<Value, ClientError> {
        self.get_json("/settings").await
    }

    pub async fn update_settings(&self, settings: &Value) -> Result<Value, ClientError> {
        self.request("/settings", RequestOptions::patch(settings.clone()))
            .await
    }

    // Client portal

    pub async fn client_summary(&self) -> Result<Value, ClientError> {
        self.get_json("/client/summary").await
    }

    pub async fn client_dashboard(&self) -> Result<Value, ClientError> {
        self.get_json("/client/dashboard").await
    }

    pub async fn client_incidents(&self) -> Result<Value, ClientError> {
        self.get_json("/client/incidents").await
    }

    pub async fn report_incident(&self, incident: &Value) -> Result<Value, ClientError> {
        self.request(
            "/client/incidents/report",
            RequestOptions::post(incident.clone()),
        )
        .await
    }

    pub async fn client_reports(&self) -> Result<Value, ClientError> {
        self.get_json("/client/reports").await
    }

    pub async fn compliance(&self) -> Result<Value, ClientError> {
        self.get_json("/compliance").await
    }

    pub async fn update_compliance(&self, compliance: &Value) -> Result<Value, ClientError> {
        self.request("/compliance", RequestOptions::patch(compliance.clone()))
            .await
    }

    pub async fn training_modules(&self) -> Result<Value, ClientError> {
        self.get_json("/training/modules").await
    }

    pub async fn training_progress(&self) -> Result<Value, ClientError> {
        self.get_json("/training/progress").await
    }

    pub async fn update_training_progress(&self, progress: &Value) -> Result<Value, ClientError> {
        self.request("/training/progress", RequestOptions::post(progress.clone()))
            .await
    }

    pub async fn messages(&self) -> Result<Value, ClientError> {
        self.get_json("/messages").await
    }

    pub async fn send_message(&self, message: &Value) -> Result<Value, ClientError> {
        self.request("/messages", RequestOptions::post(message.clone()))
            .await
    }

    pub async fn billing(&self) -> Result<Value, ClientError> {
        self.get_json("/billing").await
    }

    pub async fn account(&self) -> Result<Value, ClientError> {
        self.get_json("/account").await
    }

    pub async fn update_account(&self, account: &Value) -> Result<Value, ClientError> {
        self.request("/account", RequestOptions::patch(account.clone()))
            .await
    }
}
