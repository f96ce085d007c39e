//! The signed-in user and the credential used for API calls.
//!
//! Sessions are issued elsewhere; this crate only carries one around and
//! hands it to whatever needs to talk to the backend.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::DietitianId;

/// Platform roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Client,
    Dietitian,
    Organization,
    CorporatePartner,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Client => write!(f, "client"),
            Role::Dietitian => write!(f, "dietitian"),
            Role::Organization => write!(f, "organization"),
            Role::CorporatePartner => write!(f, "corporate-partner"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub role: Role,
}

/// API endpoint, bearer token and the acting user.
#[derive(Clone, PartialEq)]
pub struct Session {
    api_url: String,
    token: String,
    user: SessionUser,
}

impl Session {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>, user: SessionUser) -> Self {
        Self {
            api_url: api_url.into(),
            token: token.into(),
            user,
        }
    }

    /// Session for a dietitian, the only role that manages plans.
    pub fn dietitian(
        api_url: impl Into<String>,
        token: impl Into<String>,
        id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::new(
            api_url,
            token,
            SessionUser {
                id: id.into(),
                name: name.into(),
                role: Role::Dietitian,
            },
        )
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user(&self) -> &SessionUser {
        &self.user
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    /// The acting user as a dietitian, or `None` for any other role.
    pub fn dietitian_id(&self) -> Option<DietitianId> {
        (self.user.role == Role::Dietitian).then(|| DietitianId::new(self.user.id.clone()))
    }
}

// Keeps the token out of logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("api_url", &self.api_url)
            .field("token", &"****")
            .field("user", &self.user)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dietitian_session() {
        let session = Session::dietitian("http://localhost:5000", "tok", "D7", "Dr. Lee");
        assert_eq!(session.role(), Role::Dietitian);
        assert_eq!(session.dietitian_id(), Some(DietitianId::new("D7")));
    }

    #[test]
    fn test_other_roles_have_no_dietitian_id() {
        let session = Session::new(
            "http://localhost:5000",
            "tok",
            SessionUser {
                id: "A1".to_string(),
                name: "Admin".to_string(),
                role: Role::Admin,
            },
        );
        assert!(session.dietitian_id().is_none());
    }

    #[test]
    fn test_debug_masks_token() {
        let session = Session::dietitian("http://localhost", "secret-token", "D1", "Dee");
        let debug = format!("{:?}", session);
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("****"));
    }
}
