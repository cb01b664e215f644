use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;

const COOKIE_NAME: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Warning,
    Danger,
}

impl FlashLevel {
    fn as_str(self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Warning => "warning",
            FlashLevel::Danger => "danger",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "success" => Some(FlashLevel::Success),
            "warning" => Some(FlashLevel::Warning),
            "danger" => Some(FlashLevel::Danger),
            _ => None,
        }
    }
}

/// One-time status message carried across a redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

fn base_cookie(value: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(COOKIE_NAME, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

impl Flash {
    pub fn new(level: FlashLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    fn encode(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("level", self.level.as_str())
            .append_pair("message", &self.message)
            .finish()
    }

    /// Decodes a flash cookie; `None` for foreign or garbled cookies.
    pub fn from_cookie(cookie: &Cookie<'_>) -> Option<Self> {
        if cookie.name() != COOKIE_NAME {
            return None;
        }
        let mut level = None;
        let mut message = None;
        for (key, value) in url::form_urlencoded::parse(cookie.value().as_bytes()) {
            match key.as_ref() {
                "level" => level = FlashLevel::parse(&value),
                "message" => message = Some(value.into_owned()),
                _ => {}
            }
        }
        Some(Flash::new(level?, message?))
    }

    /// Queues this message for the next page the client loads.
    pub fn store(&self, jar: CookieJar) -> CookieJar {
        jar.add(base_cookie(self.encode()))
    }

    /// Reads the pending message and expires its cookie.
    pub fn take(jar: CookieJar) -> (CookieJar, Option<Self>) {
        let Some(flash) = jar.get(COOKIE_NAME).and_then(Flash::from_cookie) else {
            return (jar, None);
        };
        (jar.remove(base_cookie(String::new())), Some(flash))
    }
}
