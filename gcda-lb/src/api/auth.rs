//! Authentication endpoints: login, signup, identity, logout, health probe

use tracing::{debug, warn};

use gcda_common::api::types::{
    HealthResponse, LoginRequest, LoginResponse, SignupRequest, UserInfo,
};
use gcda_common::roles::Role;
use gcda_common::{Error, Result};

use super::BackendClient;

impl BackendClient {
    /// Authenticate with username and password
    ///
    /// # Errors
    /// - `AuthRequired` for rejected credentials (401)
    /// - `Transient` for network failures
    /// - `Terminal` for other backend rejections
    /// - `Malformed` when a 2xx body does not decode
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<LoginResponse> {
        let body = LoginRequest {
            username: username.trim().to_string(),
            password: password.to_string(),
            remember_me,
        };

        debug!(username = %body.username, "Logging in");
        let response = self
            .http
            .post(self.url("/auth/login"))
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::transport_error("Login request failed", e))?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<LoginResponse>()
                .await
                .map_err(|e| Error::Malformed(format!("Login response: {}", e)))
        } else if status.as_u16() == 401 {
            Err(Error::AuthRequired(
                "Invalid username or password".to_string(),
            ))
        } else {
            Err(Self::rejection(status, response).await)
        }
    }

    /// Create a new account
    ///
    /// Callers build the request via [`validate_signup`], which mirrors the
    /// backend's own rules so obviously-bad requests never leave the client.
    pub async fn signup(&self, request: &SignupRequest) -> Result<UserInfo> {
        debug!(username = %request.username, role = %request.role, "Signing up");
        let response = self
            .http
            .post(self.url("/auth/signup"))
            .json(request)
            .send()
            .await
            .map_err(|e| Self::transport_error("Signup request failed", e))?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<UserInfo>()
                .await
                .map_err(|e| Error::Malformed(format!("Signup response: {}", e)))
        } else {
            Err(Self::rejection(status, response).await)
        }
    }

    /// Fetch the identity behind a token
    ///
    /// A 401 means the token is no longer honored; callers clear local
    /// session state in response.
    pub async fn current_user(&self, token: &str) -> Result<UserInfo> {
        let response = self
            .http
            .get(self.url("/users/me"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| Self::transport_error("Identity request failed", e))?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<UserInfo>()
                .await
                .map_err(|e| Error::Malformed(format!("Identity response: {}", e)))
        } else if status.as_u16() == 401 {
            Err(Error::AuthRequired(
                "Session token no longer valid".to_string(),
            ))
        } else {
            Err(Self::rejection(status, response).await)
        }
    }

    /// Best-effort server-side logout
    ///
    /// Local session clearing never depends on this call succeeding.
    pub async fn logout(&self, token: &str) {
        let result = self
            .http
            .post(self.url("/auth/logout"))
            .bearer_auth(token)
            .send()
            .await;
        if let Err(e) = result {
            warn!("Server-side logout failed (ignored): {}", e);
        }
    }

    /// Probe backend reachability
    pub async fn health(&self) -> Result<HealthResponse> {
        let response = self
            .http
            .get(self.url("/health"))
            .send()
            .await
            .map_err(|e| Self::transport_error("Health probe failed", e))?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<HealthResponse>()
                .await
                .map_err(|e| Error::Malformed(format!("Health response: {}", e)))
        } else {
            Err(Error::Transient(format!(
                "Backend health probe returned HTTP {}",
                status
            )))
        }
    }
}

// ============================================================================
// Signup Validation
// ============================================================================

/// Validate and normalize signup input locally
///
/// Rules mirror the backend's:
/// - username: 3-50 chars of letters, digits, underscores, or hyphens;
///   trimmed and lowercased
/// - full name: 1-100 chars after trimming
/// - password: 8-128 chars with at least one uppercase letter, one
///   lowercase letter, and one digit; must match the confirmation
/// - role: self-signup is limited to labeler and admin
pub fn validate_signup(
    username: &str,
    full_name: &str,
    password: &str,
    confirm_password: &str,
    role: Role,
) -> Result<SignupRequest> {
    let username = username.trim().to_lowercase();
    if username.len() < 3 || username.len() > 50 {
        return Err(Error::Validation(
            "Username must be 3-50 characters".to_string(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(Error::Validation(
            "Username may only contain letters, digits, underscores, and hyphens".to_string(),
        ));
    }

    let full_name = full_name.trim().to_string();
    if full_name.is_empty() || full_name.len() > 100 {
        return Err(Error::Validation(
            "Full name must be 1-100 characters".to_string(),
        ));
    }

    if password.len() < 8 || password.len() > 128 {
        return Err(Error::Validation(
            "Password must be 8-128 characters".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase())
        || !password.chars().any(|c| c.is_ascii_lowercase())
        || !password.chars().any(|c| c.is_ascii_digit())
    {
        return Err(Error::Validation(
            "Password needs an uppercase letter, a lowercase letter, and a digit".to_string(),
        ));
    }
    if password != confirm_password {
        return Err(Error::Validation("Passwords do not match".to_string()));
    }

    if role == Role::Viewer {
        return Err(Error::Validation(
            "Self-signup is limited to labeler and admin roles".to_string(),
        ));
    }

    Ok(SignupRequest {
        username,
        full_name,
        password: password.to_string(),
        confirm_password: confirm_password.to_string(),
        role,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_accepts_valid_input() {
        let request =
            validate_signup("  Kim_R ", "Kim Reviewer", "Passw0rd", "Passw0rd", Role::Labeler)
                .unwrap();
        assert_eq!(request.username, "kim_r");
        assert_eq!(request.full_name, "Kim Reviewer");
        assert_eq!(request.role, Role::Labeler);
    }

    #[test]
    fn test_signup_rejects_short_username() {
        let err = validate_signup("ab", "Kim", "Passw0rd", "Passw0rd", Role::Labeler).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_signup_rejects_bad_username_chars() {
        let err =
            validate_signup("kim r!", "Kim", "Passw0rd", "Passw0rd", Role::Labeler).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_signup_rejects_weak_passwords() {
        // Too short
        assert!(validate_signup("kim_r", "Kim", "Pw0", "Pw0", Role::Labeler).is_err());
        // No uppercase
        assert!(validate_signup("kim_r", "Kim", "passw0rd", "passw0rd", Role::Labeler).is_err());
        // No digit
        assert!(validate_signup("kim_r", "Kim", "Password", "Password", Role::Labeler).is_err());
    }

    #[test]
    fn test_signup_rejects_mismatched_confirmation() {
        let err =
            validate_signup("kim_r", "Kim", "Passw0rd", "Passw0rd2", Role::Labeler).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_signup_rejects_viewer_role() {
        let err =
            validate_signup("kim_r", "Kim", "Passw0rd", "Passw0rd", Role::Viewer).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_signup_rejects_empty_full_name() {
        let err = validate_signup("kim_r", "  ", "Passw0rd", "Passw0rd", Role::Admin).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
