use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// Cookie carrying the session identifier
pub const SESSION_COOKIE: &str = "myvibe_session";

/// Extension type identifying the caller's session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Creates a new random session ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Reads the session cookie from request headers, ignoring malformed values
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|cookies| cookies.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
            .map(SessionId)
    }

    fn set_cookie_header(&self) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            SESSION_COOKIE, self.0
        )
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Middleware that resolves the caller's session and stores it in request extensions.
///
/// An existing `myvibe_session` cookie is reused. Otherwise a new UUID v4 session
/// is started and announced to the client with a `Set-Cookie` header.
pub async fn session_middleware(mut request: Request, next: Next) -> Response {
    let existing = SessionId::from_headers(request.headers());
    let session_id = existing.unwrap_or_default();

    request.extensions_mut().insert(session_id);

    let mut response = next.run(request).await;

    if existing.is_none() {
        if let Ok(header_value) = HeaderValue::from_str(&session_id.set_cookie_header()) {
            response
                .headers_mut()
                .append(header::SET_COOKIE, header_value);
        }
        tracing::debug!(session = %session_id, "Started new session");
    }

    response
}
