use color_eyre::Result;

use crate::db::models::AuthUser;
use crate::db::Db;

// ---------------------------------------------------------------------------
// AuthRepository trait
// ---------------------------------------------------------------------------

#[cfg_attr(test, mockall::automock)]
pub trait AuthRepository: Send + Sync {
    fn verify_user_password(
        &self,
        username: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<Option<AuthUser>>> + Send;

    fn create_user_session(
        &self,
        user_id: i64,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    fn delete_user_session(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

impl AuthRepository for Db {
    fn verify_user_password(
        &self,
        username: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<Option<AuthUser>>> + Send {
        Db::verify_user_password(self, username, password)
    }

    fn create_user_session(
        &self,
        user_id: i64,
    ) -> impl std::future::Future<Output = Result<String>> + Send {
        Db::create_user_session(self, user_id)
    }

    fn delete_user_session(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send {
        Db::delete_user_session(self, session_id)
    }
}

pub enum LoginOutcome {
    /// Login succeeded. Contains the session token.
    Success(String),
    EmptyFields,
    /// Unknown username or wrong password.
    InvalidCredentials,
}

// ---------------------------------------------------------------------------
// AuthService
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AuthService<R: AuthRepository = Db> {
    repo: R,
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Ok(LoginOutcome::EmptyFields);
        }

        let Some(user) = self.repo.verify_user_password(username, password).await? else {
            tracing::info!("failed login for {username}");
            return Ok(LoginOutcome::InvalidCredentials);
        };

        let session_token = self.repo.create_user_session(user.id).await?;

        Ok(LoginOutcome::Success(session_token))
    }

    pub async fn logout(&self, session_id: &str) -> Result<()> {
        self.repo.delete_user_session(session_id).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn alice() -> AuthUser {
        AuthUser {
            id: 1,
            username: "alice".to_string(),
            display_name: "Alice".to_string(),
            is_admin: false,
        }
    }

    #[tokio::test]
    async fn login_success_returns_session_token() {
        let mut mock = MockAuthRepository::new();
        mock.expect_verify_user_password()
            .withf(|username, _| username == "alice")
            .returning(|_, _| Box::pin(async { Ok(Some(alice())) }));
        mock.expect_create_user_session()
            .withf(|id| *id == 1)
            .returning(|_| Box::pin(async { Ok("session-token-123".to_string()) }));

        let svc = AuthService::new(mock);
        let outcome = svc.login("  alice ", "password").await.unwrap();

        assert!(matches!(outcome, LoginOutcome::Success(ref t) if t == "session-token-123"));
    }

    #[tokio::test]
    async fn login_wrong_password_returns_invalid_credentials() {
        let mut mock = MockAuthRepository::new();
        mock.expect_verify_user_password()
            .returning(|_, _| Box::pin(async { Ok(None) }));
        mock.expect_create_user_session().never();

        let svc = AuthService::new(mock);
        let outcome = svc.login("alice", "wrong").await.unwrap();

        assert!(matches!(outcome, LoginOutcome::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_empty_fields_skips_lookup() {
        let mut mock = MockAuthRepository::new();
        mock.expect_verify_user_password().never();

        let svc = AuthService::new(mock);
        assert!(matches!(
            svc.login("", "pw").await.unwrap(),
            LoginOutcome::EmptyFields
        ));
        assert!(matches!(
            svc.login("alice", "").await.unwrap(),
            LoginOutcome::EmptyFields
        ));
    }

    #[tokio::test]
    async fn logout_deletes_session() {
        let mut mock = MockAuthRepository::new();
        mock.expect_delete_user_session()
            .withf(|id| id == "session-123")
            .returning(|_| Box::pin(async { Ok(()) }));

        let svc = AuthService::new(mock);
        svc.logout("session-123").await.unwrap();
    }
}
