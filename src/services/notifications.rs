use reqwest::Method;

use crate::client::{ApiClient, ApiResult};
use crate::models::{
    ActionResponse, DeviceTokenCreate, DeviceTokenResponse, NotificationsListResponse,
};

impl ApiClient {
    pub async fn list_notifications(&self) -> ApiResult<NotificationsListResponse> {
        self.get("/notifications/").await
    }

    pub async fn mark_notification_read(&self, id: i64) -> ApiResult<ActionResponse> {
        let path = format!("/notifications/{id}/read");
        let req = self.request(Method::PUT, &path);
        self.fetch(Method::PUT, &path, req).await
    }

    pub async fn mark_all_notifications_read(&self) -> ApiResult<ActionResponse> {
        let path = "/notifications/read-all";
        let req = self.request(Method::PUT, path);
        self.fetch(Method::PUT, path, req).await
    }

    pub async fn delete_notification(&self, id: i64) -> ApiResult<ActionResponse> {
        let path = format!("/notifications/{id}");
        let req = self.request(Method::DELETE, &path);
        self.fetch(Method::DELETE, &path, req).await
    }

    /// Register a push token issued by the messaging provider. Delivery
    /// itself is handled by the backend.
    pub async fn register_device_token(&self, token: &str) -> ApiResult<DeviceTokenResponse> {
        let path = "/notifications/register-token";
        let req = self.request(Method::POST, path).json(&DeviceTokenCreate {
            token: token.to_string(),
            device_type: "web".to_string(),
        });
        self.fetch(Method::POST, path, req).await
    }

    /// Mark every unread notification that refers to `turn_id` as read.
    /// Returns how many were marked.
    pub async fn mark_turn_notifications_read(&self, turn_id: i64) -> ApiResult<usize> {
        let list = self.list_notifications().await?;
        let mut marked = 0;
        for n in list
            .notifications
            .iter()
            .filter(|n| !n.is_read && n.turn_id() == Some(turn_id))
        {
            self.mark_notification_read(n.id).await?;
            marked += 1;
        }
        Ok(marked)
    }
}
