//! Identity provider - who is making a request, and where to log in or out

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::config::SiteConfig;
use crate::content::Identity;
use crate::helpers::{encode_url, is_local_path, url_for};

/// Source of the current request's identity
pub trait IdentityProvider: Send + Sync {
    /// The logged-in identity, if any
    fn current_identity(&self, jar: &CookieJar) -> Option<Identity>;

    /// URL of the login page that returns to `return_path` afterwards
    fn login_url(&self, return_path: &str) -> String;

    /// URL that logs out and returns to `return_path`
    fn logout_url(&self, return_path: &str) -> String;
}

/// Identity carried in a plain cookie, set by the built-in login form
///
/// This trusts the client; it stands in for an external sign-in service.
#[derive(Debug, Clone)]
pub struct CookieIdentity {
    cookie_name: String,
    config: SiteConfig,
}

impl CookieIdentity {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            cookie_name: config.cookie_name.clone(),
            config: config.clone(),
        }
    }

    /// Attach the login cookie for `identity`
    pub fn log_in(&self, jar: CookieJar, identity: &Identity) -> CookieJar {
        let cookie = Cookie::build((self.cookie_name.clone(), identity.as_str().to_string()))
            .path(url_for(&self.config, "/"))
            .http_only(true)
            .same_site(SameSite::Lax)
            .build();
        tracing::info!("{} logged in", identity);
        jar.add(cookie)
    }

    /// Drop the login cookie
    pub fn log_out(&self, jar: CookieJar) -> CookieJar {
        let cookie = Cookie::build(self.cookie_name.clone())
            .path(url_for(&self.config, "/"))
            .build();
        jar.remove(cookie)
    }

    /// `path` if it stays on this site, otherwise the site root
    pub fn return_path(&self, path: &str) -> String {
        if is_local_path(path) {
            path.to_string()
        } else {
            url_for(&self.config, "/")
        }
    }

    fn with_return(&self, route: &str, return_path: &str) -> String {
        format!(
            "{}?next={}",
            url_for(&self.config, route),
            encode_url(&self.return_path(return_path))
        )
    }
}

impl IdentityProvider for CookieIdentity {
    fn current_identity(&self, jar: &CookieJar) -> Option<Identity> {
        jar.get(&self.cookie_name)
            .and_then(|cookie| Identity::new(cookie.value()))
    }

    fn login_url(&self, return_path: &str) -> String {
        self.with_return("login", return_path)
    }

    fn logout_url(&self, return_path: &str) -> String {
        self.with_return("logout", return_path)
    }
}
