use reqwest::Method;

use crate::client::{ApiClient, ApiResult};
use crate::models::{Court, CourtCreate, CourtUpdate};

impl ApiClient {
    /// Courts visible to the authenticated admin. The backend scopes the list
    /// to the admin's club but callers still filter by `club_id`.
    pub async fn list_courts(&self) -> ApiResult<Vec<Court>> {
        let path = "/courts/";
        self.get_list(path, self.request(Method::GET, path)).await
    }

    pub async fn get_court(&self, id: i64) -> ApiResult<Court> {
        self.get(&format!("/courts/{id}")).await
    }

    pub async fn create_court(&self, court: &CourtCreate) -> ApiResult<Court> {
        let path = "/courts/";
        let req = self.request(Method::POST, path).json(court);
        self.fetch(Method::POST, path, req).await
    }

    pub async fn update_court(&self, id: i64, update: &CourtUpdate) -> ApiResult<Court> {
        let path = format!("/courts/{id}");
        let req = self.request(Method::PUT, &path).json(update);
        self.fetch(Method::PUT, &path, req).await
    }

    pub async fn delete_court(&self, id: i64) -> ApiResult<()> {
        let path = format!("/courts/{id}");
        let req = self.request(Method::DELETE, &path);
        self.execute(Method::DELETE, &path, req).await?;
        Ok(())
    }
}
