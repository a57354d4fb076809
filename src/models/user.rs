//! User model and the authenticated principal

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

/// User roles, resolved once at the auth boundary.
///
/// Role values never travel as raw numbers past this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Librarian,
    Patron,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Librarian => "librarian",
            Role::Patron => "patron",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "librarian" => Ok(Role::Librarian),
            "patron" => Ok(Role::Patron),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// User account. Creation and the credential hash belong to the auth
/// boundary; the lending core only reads email and role.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Unique email, identity key
    pub email: String,
    /// Display name
    pub name: String,
    /// Opaque credential hash, owned by the auth boundary
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
}

/// JWT claims issued by the auth boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    /// Subject: user email
    pub sub: String,
    pub role: Role,
    /// Expiration timestamp (seconds since epoch)
    pub exp: usize,
}

impl UserClaims {
    /// Validate and decode a bearer token
    pub fn from_token(token: &str, secret: &str) -> AppResult<Self> {
        let data = decode::<UserClaims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| AppError::Authentication(format!("Invalid token: {}", e)))?;
        Ok(data.claims)
    }

    pub fn principal(&self) -> Principal {
        Principal {
            email: self.sub.clone(),
            role: self.role,
        }
    }
}

/// Request-scoped identity of the acting user, passed explicitly into
/// every core operation that needs it.
#[derive(Debug, Clone)]
pub struct Principal {
    pub email: String,
    pub role: Role,
}

impl Principal {
    /// Librarian operations are open to librarians and admins
    pub fn require_librarian(&self) -> AppResult<()> {
        match self.role {
            Role::Librarian | Role::Admin => Ok(()),
            Role::Patron => Err(AppError::Authorization(
                "Librarian role required".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_its_string_form() {
        use std::str::FromStr;

        for role in [Role::Admin, Role::Librarian, Role::Patron] {
            assert_eq!(Role::from_str(role.as_str()), Ok(role));
        }
        assert!(Role::from_str("superuser").is_err());
    }

    #[test]
    fn patron_cannot_act_as_librarian() {
        let principal = Principal {
            email: "reader@example.org".to_string(),
            role: Role::Patron,
        };
        assert!(principal.require_librarian().is_err());
    }
}
