use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// What `/api/bootstrap` hands back: either a fresh/continued guest identity or
/// an authenticated user (which may itself be a guest-backed JWT).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawBootstrap")]
pub enum BootstrapBundle {
    Guest(GuestBundle),
    Authenticated(AuthenticatedBundle),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GuestBundle {
    pub temporary_user_id: String,
    pub chat_id: String,
    pub credits: Option<u32>,
    pub jwt_token: Option<String>,
    pub refresh_token: Option<String>,
    pub chat_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedBundle {
    pub is_guest_user: bool,
    pub user: Option<Value>,
    pub chat_id: String,
    pub credits: Option<u32>,
    pub chat_title: Option<String>,
}

impl BootstrapBundle {
    pub fn chat_id(&self) -> &str {
        match self {
            BootstrapBundle::Guest(b) => &b.chat_id,
            BootstrapBundle::Authenticated(b) => &b.chat_id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBootstrap {
    is_authenticated: bool,
    #[serde(default)]
    is_guest_user: bool,
    #[serde(default, deserialize_with = "lenient_id")]
    temporary_user_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    chat_id: Option<String>,
    #[serde(default)]
    credits: Option<f64>,
    #[serde(default)]
    jwt_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    chat_title: Option<String>,
    #[serde(default)]
    user: Option<Value>,
}

impl TryFrom<RawBootstrap> for BootstrapBundle {
    type Error = String;

    fn try_from(raw: RawBootstrap) -> Result<Self, Self::Error> {
        let chat_id = raw
            .chat_id
            .ok_or_else(|| "bootstrap response is missing chatId".to_string())?;
        let credits = raw.credits.map(|c| c.max(0.0) as u32);
        let chat_title = raw.chat_title.filter(|t| !t.is_empty());

        if raw.is_authenticated {
            Ok(BootstrapBundle::Authenticated(AuthenticatedBundle {
                is_guest_user: raw.is_guest_user,
                user: raw.user,
                chat_id,
                credits,
                chat_title,
            }))
        } else {
            let temporary_user_id = raw
                .temporary_user_id
                .ok_or_else(|| "guest bootstrap is missing temporaryUserId".to_string())?;
            Ok(BootstrapBundle::Guest(GuestBundle {
                temporary_user_id,
                chat_id,
                credits,
                jwt_token: raw.jwt_token.filter(|t| !t.is_empty()),
                refresh_token: raw.refresh_token.filter(|t| !t.is_empty()),
                chat_title,
            }))
        }
    }
}

/// Accepts ids sent either as JSON strings or numbers.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Token pair issued by `/api/auth/refresh` or an OAuth callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub jwt_token: String,
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_bundle_parses_numeric_ids() {
        let raw = r#"{
            "isAuthenticated": false,
            "isGuestUser": true,
            "temporaryUserId": 42,
            "chatId": 7,
            "credits": 5,
            "freeCredits": 5,
            "jwtToken": "jwt",
            "refreshToken": "refresh"
        }"#;
        let bundle: BootstrapBundle = serde_json::from_str(raw).unwrap();
        match bundle {
            BootstrapBundle::Guest(g) => {
                assert_eq!(g.temporary_user_id, "42");
                assert_eq!(g.chat_id, "7");
                assert_eq!(g.credits, Some(5));
                assert_eq!(g.jwt_token.as_deref(), Some("jwt"));
                assert_eq!(g.chat_title, None);
            }
            other => panic!("expected guest bundle, got {other:?}"),
        }
    }

    #[test]
    fn test_authenticated_bundle() {
        let raw = r#"{
            "isAuthenticated": true,
            "isGuestUser": false,
            "user": {"email": "a@b.c"},
            "chatId": "c-1",
            "chatTitle": "Backend CV",
            "credits": 12
        }"#;
        let bundle: BootstrapBundle = serde_json::from_str(raw).unwrap();
        assert_eq!(bundle.chat_id(), "c-1");
        match bundle {
            BootstrapBundle::Authenticated(a) => {
                assert!(!a.is_guest_user);
                assert_eq!(a.chat_title.as_deref(), Some("Backend CV"));
                assert_eq!(a.credits, Some(12));
            }
            other => panic!("expected authenticated bundle, got {other:?}"),
        }
    }

    #[test]
    fn test_guest_without_temporary_id_is_rejected() {
        let raw = r#"{"isAuthenticated": false, "chatId": "c"}"#;
        assert!(serde_json::from_str::<BootstrapBundle>(raw).is_err());
    }
}
