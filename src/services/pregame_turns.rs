use chrono::NaiveDate;
use reqwest::Method;

use crate::client::{ApiClient, ApiResult};
use crate::models::{
    CreateTurnByClub, CreateTurnResponse, PregameTurn, PregameTurnUpdate, PregameTurnsResponse,
};

impl ApiClient {
    /// Turns of a club, optionally restricted to one day.
    pub async fn list_pregame_turns(
        &self,
        club_id: i64,
        date: Option<NaiveDate>,
    ) -> ApiResult<PregameTurnsResponse> {
        let path = format!("/pregame-turns/clubs/{club_id}/pregame-turns");
        let mut req = self.request(Method::GET, &path);
        if let Some(d) = date {
            req = req.query(&[("target_date", d.format("%Y-%m-%d").to_string())]);
        }
        self.fetch(Method::GET, &path, req).await
    }

    pub async fn get_pregame_turn(&self, id: i64) -> ApiResult<PregameTurn> {
        self.get(&format!("/pregame-turns/{id}")).await
    }

    /// Last write wins: the backend does no version check.
    pub async fn update_pregame_turn(
        &self,
        id: i64,
        update: &PregameTurnUpdate,
    ) -> ApiResult<PregameTurn> {
        let path = format!("/pregame-turns/{id}");
        let req = self.request(Method::PUT, &path).json(update);
        self.fetch(Method::PUT, &path, req).await
    }

    pub async fn create_turn_by_club(
        &self,
        params: &CreateTurnByClub,
    ) -> ApiResult<CreateTurnResponse> {
        let path = "/pregame-turns/create-turn-by-club";
        let req = self.request(Method::POST, path).query(params);
        self.fetch(Method::POST, path, req).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use mockito::Matcher;

    use crate::client::test_support::*;
    use crate::models::{CreateTurnByClub, PlayerField, PregameTurnUpdate, Side};

    #[tokio::test]
    async fn list_for_a_day_sends_target_date() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/pregame-turns/clubs/3/pregame-turns")
            .match_query(Matcher::UrlEncoded("target_date".into(), "2024-01-05".into()))
            .with_status(200)
            .with_body(
                r#"{"club_id": 3, "club_name": "Sur", "total_pregame_turns": 1,
                    "pregame_turns": [{"id": 1, "date": "2024-01-05", "status": "PENDING"}]}"#,
            )
            .create_async()
            .await;

        let client = logged_in_client_for(&server, "tok");
        let day = NaiveDate::from_ymd_opt(2024, 1, 5);
        let resp = client.list_pregame_turns(3, day).await.unwrap();
        mock.assert_async().await;
        assert_eq!(resp.pregame_turns.len(), 1);
    }

    #[tokio::test]
    async fn update_sends_nulls_for_cleared_fields() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/pregame-turns/7")
            .match_body(Matcher::Json(serde_json::json!({
                "player2_id": null,
                "player2_side": null,
                "player2_court_position": null,
                "player3_side": "drive"
            })))
            .with_status(200)
            .with_body(r#"{"id": 7, "status": "PENDING"}"#)
            .create_async()
            .await;

        let mut update = PregameTurnUpdate::default();
        let cleared = update.player_mut(PlayerField::Player2);
        cleared.player_id = Some(None);
        cleared.side = Some(None);
        cleared.court_position = Some(None);
        update.player_mut(PlayerField::Player3).side = Some(Some(Side::Drive));

        let client = logged_in_client_for(&server, "tok");
        let turn = client.update_pregame_turn(7, &update).await.unwrap();
        mock.assert_async().await;
        assert_eq!(turn.id, 7);
    }

    #[tokio::test]
    async fn create_by_club_uses_query_string() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/pregame-turns/create-turn-by-club")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("club_id".into(), "3".into()),
                Matcher::UrlEncoded("start_time".into(), "18:00".into()),
                Matcher::UrlEncoded("player_side".into(), "reves".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"success": true, "message": "ok", "turn_id": 90,
                    "pregame_turn": {"id": 55, "status": "PENDING"}}"#,
            )
            .create_async()
            .await;

        let client = logged_in_client_for(&server, "tok");
        let resp = client
            .create_turn_by_club(&CreateTurnByClub {
                club_id: 3,
                start_time: "18:00".into(),
                target_date: "2024-01-05".into(),
                court_id: 1,
                organizer_player_id: 4,
                player_side: Some(Side::Reves),
                player_position: None,
                category_restricted: None,
                category_restriction_type: None,
                is_mixed_match: None,
                free_category: None,
            })
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(resp.pregame_turn.id, 55);
    }
}
