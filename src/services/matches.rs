use reqwest::{Method, StatusCode};
use tracing::warn;

use crate::client::{ApiClient, ApiResult};
use crate::models::{Match, MatchFilters};

impl ApiClient {
    /// Matches visible to the admin. The endpoint is restricted to super
    /// admins on some deployments; a 403 yields an empty list.
    pub async fn list_matches(&self, filters: &MatchFilters) -> ApiResult<Vec<Match>> {
        let path = "/matches/";
        let req = self.request(Method::GET, path).query(filters);
        match self.get_list(path, req).await {
            Err(e) if e.status() == Some(StatusCode::FORBIDDEN) => {
                warn!("Matches endpoint not available for this account");
                Ok(Vec::new())
            }
            other => other,
        }
    }

    pub async fn get_match(&self, id: i64) -> ApiResult<Match> {
        self.get(&format!("/matches/{id}")).await
    }
}
