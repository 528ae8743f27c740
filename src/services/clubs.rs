use reqwest::Method;

use crate::client::{ApiClient, ApiResult};
use crate::models::{Club, ClubUpdate};

pub const DEFAULT_DAYS_AHEAD: u32 = 30;

impl ApiClient {
    pub async fn get_club(&self, id: i64) -> ApiResult<Club> {
        self.get(&format!("/clubs/{id}")).await
    }

    pub async fn update_club(&self, id: i64, update: &ClubUpdate) -> ApiResult<Club> {
        let path = format!("/clubs/{id}");
        let req = self.request(Method::PUT, &path).json(update);
        self.fetch(Method::PUT, &path, req).await
    }

    /// Regenerate bookable turns after the schedule changed.
    pub async fn generate_turns(&self, id: i64, days_ahead: u32) -> ApiResult<()> {
        let path = format!("/clubs/{id}/generate-turns");
        let req = self
            .request(Method::POST, &path)
            .query(&[("days_ahead", days_ahead)]);
        self.execute(Method::POST, &path, req).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::client::test_support::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn get_club_and_generate_turns() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/clubs/3")
            .with_status(200)
            .with_body(
                r#"{"id": 3, "name": "Padel Sur", "address": "Av. 1",
                    "price_per_turn": 5000, "sunday_open": false}"#,
            )
            .create_async()
            .await;
        let generate = server
            .mock("POST", "/clubs/3/generate-turns")
            .match_query(Matcher::UrlEncoded("days_ahead".into(), "30".into()))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = logged_in_client_for(&server, "tok");
        let club = client.get_club(3).await.unwrap();
        assert_eq!(club.price_per_turn, Some(5000));
        assert!(!club.open_days()[6]);

        client
            .generate_turns(3, super::DEFAULT_DAYS_AHEAD)
            .await
            .unwrap();
        generate.assert_async().await;
    }
}
