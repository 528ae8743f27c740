use reqwest::Method;

use crate::client::{ApiClient, ApiResult};
use crate::models::{ActionResponse, InvitationsResponse};

impl ApiClient {
    pub async fn list_invitations(&self, turn_id: i64) -> ApiResult<InvitationsResponse> {
        self.get(&format!("/invitations/turn/{turn_id}")).await
    }

    pub async fn cancel_invitation(&self, id: i64) -> ApiResult<ActionResponse> {
        let path = format!("/invitations/{id}");
        let req = self.request(Method::DELETE, &path);
        self.fetch(Method::DELETE, &path, req).await
    }
}

#[cfg(test)]
mod tests {
    use crate::client::test_support::*;
    use crate::models::InvitationStatus;

    #[tokio::test]
    async fn lists_invitations_of_a_turn() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/invitations/turn/40")
            .with_status(200)
            .with_body(
                r#"{"success": true, "total_count": 1, "invitations": [
                    {"id": 3, "turn_id": 40, "inviter_id": 1, "invited_player_id": 9,
                     "status": "PENDING", "is_validated_invitation": false,
                     "is_external_request": true, "invited_player_name": "Leo"}]}"#,
            )
            .create_async()
            .await;

        let client = logged_in_client_for(&server, "tok");
        let resp = client.list_invitations(40).await.unwrap();
        let inv = &resp.invitations[0];
        assert_eq!(inv.status, InvitationStatus::Pending);
        assert_eq!(inv.status_label(), "Solicitud pendiente");
    }
}
