use reqwest::{Method, StatusCode};
use tracing::debug;

use crate::client::{ApiClient, ApiResult};
use crate::models::Player;

impl ApiClient {
    pub async fn search_players(
        &self,
        query: Option<&str>,
        turn_id: Option<i64>,
    ) -> ApiResult<Vec<Player>> {
        let path = "/players/search";
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(q) = query.filter(|q| !q.is_empty()) {
            params.push(("q", q.to_string()));
        }
        if let Some(id) = turn_id {
            params.push(("turn_id", id.to_string()));
        }
        let req = self.request(Method::GET, path).query(&params);
        self.get_list(path, req).await
    }

    /// Players are users on the backend. Some deployments hide `/users/{id}`
    /// from club admins; on 404 the search listing is used instead.
    pub async fn get_player(&self, id: i64) -> ApiResult<Player> {
        match self.get::<Player>(&format!("/users/{id}")).await {
            Err(e) if e.status() == Some(StatusCode::NOT_FOUND) => {
                debug!("User {} not found directly, searching players", id);
                let players = self.search_players(None, None).await?;
                players.into_iter().find(|p| p.id == id).ok_or(e)
            }
            other => other,
        }
    }
}
