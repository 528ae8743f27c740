use axum::extract::{Path, Query, State};
use axum::response::Html;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::WebError;
use super::views::render_page;
use super::AppState;
use crate::calendar;
use crate::client::ApiError;
use crate::models::{CourtPosition, PregameTurn, PregameTurnUpdate, Side, TurnStatus};
use crate::slots::{self, AxisValue, Slot, SlotEdit, SlotError, SlotIssue, TurnLabel};
use crate::stats::{self, ClubStatistics};

/// Slot layout of one turn as served to the browser.
#[derive(Debug, Serialize)]
pub(crate) struct TurnSlotsView {
    pub(crate) turn_id: i64,
    pub(crate) status: TurnStatus,
    pub(crate) label: TurnLabel,
    pub(crate) slots: [Slot; 4],
    pub(crate) issues: Vec<SlotIssue>,
    /// Partial update that was (or, on a dry run, would be) sent.
    pub(crate) update: Option<PregameTurnUpdate>,
    pub(crate) applied: bool,
}

impl TurnSlotsView {
    fn of(turn: &PregameTurn, update: Option<PregameTurnUpdate>, applied: bool) -> Self {
        Self {
            turn_id: turn.id,
            status: turn.status.clone(),
            label: slots::turn_label(turn),
            slots: slots::to_slots(turn),
            issues: slots::consistency_report(turn),
            update,
            applied,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EditOptions {
    #[serde(default)]
    pub(crate) dry_run: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssignRequest {
    pub(crate) player_id: i64,
    pub(crate) slot: usize,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RemoveRequest {
    pub(crate) player_id: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MoveRequest {
    pub(crate) from: usize,
    pub(crate) to: usize,
}

/// Exactly one of `side` or `position` must be given.
#[derive(Debug, Deserialize)]
pub(crate) struct AxisRequest {
    pub(crate) player_id: i64,
    #[serde(default)]
    pub(crate) side: Option<Side>,
    #[serde(default)]
    pub(crate) position: Option<CourtPosition>,
}

impl AxisRequest {
    fn value(&self) -> Result<AxisValue, WebError> {
        match (self.side, self.position) {
            (Some(side), None) => Ok(AxisValue::Side(side)),
            (None, Some(position)) => Ok(AxisValue::Position(position)),
            _ => Err(WebError::BadRequest(
                "give exactly one of `side` or `position`".into(),
            )),
        }
    }
}

fn require_session(state: &AppState) -> Result<(), WebError> {
    if state.client.session().token().is_none() {
        return Err(ApiError::NotLoggedIn.into());
    }
    Ok(())
}

pub(crate) async fn dashboard_handler(State(state): State<AppState>) -> Html<String> {
    let today = calendar::today_in(state.tz);
    let club_id = state.config.club.id;

    let (stats, turns) = if state.client.session().token().is_none() {
        let msg = ApiError::NotLoggedIn.to_string();
        (Err(msg.clone()), Err(msg))
    } else {
        match stats::fetch_club_overview(&state.client, club_id, today).await {
            Ok(overview) => (Ok(overview.statistics), Ok(overview.today_turns)),
            Err(e) => {
                let msg = format!("Failed to load club data: {e}");
                (Err(msg.clone()), Err(msg))
            }
        }
    };

    let snapshot = state.snapshot().clone();
    let html = render_page(club_id, today, stats.as_ref(), turns.as_deref(), &snapshot, state.tz);
    Html(html)
}

pub(crate) async fn statistics_handler(
    State(state): State<AppState>,
) -> Result<Json<ClubStatistics>, WebError> {
    require_session(&state)?;
    let today = calendar::today_in(state.tz);
    let stats = stats::fetch_club_statistics(&state.client, state.config.club.id, today).await?;
    Ok(Json(stats))
}

pub(crate) async fn slots_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TurnSlotsView>, WebError> {
    require_session(&state)?;
    let turn = state.client.get_pregame_turn(id).await?;
    Ok(Json(TurnSlotsView::of(&turn, None, false)))
}

/// Fetch the turn, build the edit, and submit it unless it is a no-op or a
/// dry run.
async fn apply_edit<F>(
    state: &AppState,
    id: i64,
    opts: EditOptions,
    build: F,
) -> Result<Json<TurnSlotsView>, WebError>
where
    F: FnOnce(&PregameTurn) -> Result<SlotEdit, SlotError>,
{
    require_session(state)?;
    let turn = state.client.get_pregame_turn(id).await?;
    let edit = build(&turn)?;
    if edit.is_noop() {
        return Ok(Json(TurnSlotsView::of(&turn, None, false)));
    }

    let update = edit.to_update();
    if opts.dry_run {
        return Ok(Json(TurnSlotsView::of(
            &edit.preview(&turn),
            Some(update),
            false,
        )));
    }

    let updated = state.client.update_pregame_turn(id, &update).await?;
    info!("Turn {}: applied {} slot intent(s)", id, edit.intents().len());
    Ok(Json(TurnSlotsView::of(&updated, Some(update), true)))
}

pub(crate) async fn assign_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(opts): Query<EditOptions>,
    Json(req): Json<AssignRequest>,
) -> Result<Json<TurnSlotsView>, WebError> {
    apply_edit(&state, id, opts, |t| {
        slots::assign_player(t, req.slot, req.player_id)
    })
    .await
}

pub(crate) async fn remove_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(opts): Query<EditOptions>,
    Json(req): Json<RemoveRequest>,
) -> Result<Json<TurnSlotsView>, WebError> {
    apply_edit(&state, id, opts, |t| slots::remove_player(t, req.player_id)).await
}

pub(crate) async fn move_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(opts): Query<EditOptions>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<TurnSlotsView>, WebError> {
    apply_edit(&state, id, opts, |t| slots::drag_reorder(t, req.from, req.to)).await
}

pub(crate) async fn axis_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(opts): Query<EditOptions>,
    Json(req): Json<AxisRequest>,
) -> Result<Json<TurnSlotsView>, WebError> {
    let value = req.value()?;
    apply_edit(&state, id, opts, |t| {
        slots::change_side_or_position(t, req.player_id, value)
    })
    .await
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use mockito::Matcher;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use crate::client::test_support::*;
    use crate::web::{router, AppState};

    const TURN: &str = r#"{
        "id": 7, "date": "2024-01-05", "start_time": "18:00", "end_time": "19:30",
        "status": "PENDING", "court_id": 1,
        "player1_id": 11, "player1_side": "drive", "player1_court_position": "izquierda",
        "player2_id": 22, "player2_side": "reves", "player2_court_position": "derecha"
    }"#;

    fn app_for(server: &mockito::Server, logged_in: bool) -> axum::Router {
        let config = toml::from_str(&format!(
            "[api]\nbase_url = \"{}\"\n[club]\nid = 3\n",
            server.url()
        ))
        .unwrap();
        let client = if logged_in {
            logged_in_client_for(server, "tok")
        } else {
            client_for(server)
        };
        router(AppState::new(config, client).unwrap())
    }

    async fn send(
        app: axum::Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let req = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(b) => req
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn mock_turn(server: &mut mockito::Server) -> mockito::Mock {
        server
            .mock("GET", "/pregame-turns/7")
            .with_status(200)
            .with_body(TURN)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn slots_endpoint_returns_canonical_layout() {
        let mut server = mockito::Server::new_async().await;
        let _turn = mock_turn(&mut server).await;

        let (status, body) = send(app_for(&server, true), "GET", "/api/turns/7/slots", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["label"], "incompleto");
        let slots = body["slots"].as_array().unwrap();
        assert_eq!(slots.len(), 4);
        assert_eq!(slots[0]["occupant"]["player_id"], 11);
        assert!(slots[1]["occupant"].is_null());
        assert!(slots[2]["occupant"].is_null());
        assert_eq!(slots[3]["occupant"]["player_id"], 22);
    }

    #[tokio::test]
    async fn assign_to_occupied_slot_is_refused_before_writing() {
        let mut server = mockito::Server::new_async().await;
        let _turn = mock_turn(&mut server).await;
        let put = server
            .mock("PUT", "/pregame-turns/7")
            .expect(0)
            .create_async()
            .await;

        let (status, body) = send(
            app_for(&server, true),
            "POST",
            "/api/turns/7/assign",
            Some(json!({"player_id": 33, "slot": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("occupied"));
        put.assert_async().await;
    }

    #[tokio::test]
    async fn move_swaps_with_the_destination_player() {
        let mut server = mockito::Server::new_async().await;
        let _turn = mock_turn(&mut server).await;
        let put = server
            .mock("PUT", "/pregame-turns/7")
            .match_body(Matcher::Json(json!({
                "player1_side": "reves",
                "player1_court_position": "derecha",
                "player2_side": "drive",
                "player2_court_position": "izquierda"
            })))
            .with_status(200)
            .with_body(
                r#"{"id": 7, "status": "PENDING",
                    "player1_id": 11, "player1_side": "reves",
                    "player1_court_position": "derecha",
                    "player2_id": 22, "player2_side": "drive",
                    "player2_court_position": "izquierda"}"#,
            )
            .create_async()
            .await;

        let (status, body) = send(
            app_for(&server, true),
            "POST",
            "/api/turns/7/move",
            Some(json!({"from": 0, "to": 3})),
        )
        .await;
        put.assert_async().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["applied"], true);
        assert_eq!(body["slots"][0]["occupant"]["player_id"], 22);
        assert_eq!(body["slots"][3]["occupant"]["player_id"], 11);
    }

    #[tokio::test]
    async fn dry_run_previews_without_writing() {
        let mut server = mockito::Server::new_async().await;
        let _turn = mock_turn(&mut server).await;
        let put = server
            .mock("PUT", "/pregame-turns/7")
            .expect(0)
            .create_async()
            .await;

        let (status, body) = send(
            app_for(&server, true),
            "POST",
            "/api/turns/7/axis?dry_run=true",
            Some(json!({"player_id": 11, "side": "reves"})),
        )
        .await;
        put.assert_async().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["applied"], false);
        assert_eq!(body["update"], json!({"player1_side": "reves"}));
        assert_eq!(body["slots"][1]["occupant"]["player_id"], 11);
    }

    #[tokio::test]
    async fn axis_requires_exactly_one_value() {
        let server = mockito::Server::new_async().await;
        let (status, _) = send(
            app_for(&server, true),
            "POST",
            "/api/turns/7/axis",
            Some(json!({"player_id": 11})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn api_requires_a_session() {
        let server = mockito::Server::new_async().await;
        let (status, body) = send(app_for(&server, false), "GET", "/api/statistics", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].as_str().unwrap().contains("not logged in"));
    }

    #[tokio::test]
    async fn dashboard_page_shows_statistics_and_turns() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/courts/")
            .with_status(200)
            .with_body(
                r#"[{"id": 1, "name": "Central", "club_id": 3, "is_available": false}]"#,
            )
            .create_async()
            .await;
        // today's list plus the full list, each requested once
        let turns = server
            .mock("GET", "/pregame-turns/clubs/3/pregame-turns")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(format!(r#"{{"pregame_turns": [{TURN}]}}"#))
            .expect(2)
            .create_async()
            .await;
        let _mock = server
            .mock("GET", "/clubs/3")
            .with_status(200)
            .with_body(r#"{"id": 3, "name": "Sur", "price_per_turn": 5000}"#)
            .create_async()
            .await;

        let resp = app_for(&server, true)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("1 cancha en mantenimiento"));
        assert!(html.contains("Miércoles"));
        assert!(html.contains("18:00"));
        assert!(html.contains("incompleto"));
        turns.assert_async().await;
    }
}
