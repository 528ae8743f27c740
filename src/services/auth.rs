use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use tracing::{error, info};

use crate::client::{ApiClient, ApiError, ApiResult};
use crate::models::{ChangePassword, LoginResponse, SessionUser};
use crate::session::Session;

impl ApiClient {
    /// Exchange credentials for a token and store the session.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<SessionUser> {
        let path = "/auth/token";
        let req = self
            .request(Method::POST, path)
            .header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            )
            .body(format!(
                "username={}&password={}",
                urlencoding::encode(username),
                urlencoding::encode(password)
            ));
        let resp: LoginResponse = self.fetch(Method::POST, path, req).await?;

        let session = Session {
            token: resp.access_token,
            user: resp.user.clone(),
        };
        // The token is already issued; a write failure only costs persistence.
        if let Err(e) = self.session().set(session) {
            error!("Failed to persist session: {:#}", e);
        }
        info!("Logged in as {} (club: {:?})", resp.user.email, resp.user.club_id);
        Ok(resp.user)
    }

    pub async fn change_password(&self, current: &str, new: &str) -> ApiResult<()> {
        if self.session().token().is_none() {
            return Err(ApiError::NotLoggedIn);
        }
        let path = "/auth/change-password";
        let req = self.request(Method::POST, path).json(&ChangePassword {
            current_password: current.to_string(),
            new_password: new.to_string(),
        });
        self.execute(Method::POST, path, req).await?;
        Ok(())
    }

    /// Purely local: the backend keeps no server-side session.
    pub fn logout(&self) -> anyhow::Result<()> {
        self.session().clear()
    }
}
