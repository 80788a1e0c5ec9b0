//! Page access gating for the web shell.
//!
//! Before a page renders, the shell looks up the signed-in user. Users who
//! still have to accept the terms are sent to the acceptance page unless
//! they are already on a public page.

use reqwest::Method;
use tracing::debug;

use crate::client::AssistantClient;
use crate::http::{Transport, TransportRequest};
use crate::model::Me;

/// Pages reachable without having accepted the terms.
pub const PUBLIC_ROUTES: &[&str] = &["/privacy", "/terms", "/accept-terms"];

pub const ACCEPT_TERMS_ROUTE: &str = "/accept-terms";

/// 303 See Other
pub const REDIRECT_STATUS: u16 = 303;

#[derive(Debug, Clone, PartialEq)]
pub enum PageAccess {
    Render { me: Option<Me>, needs_terms: bool },
    Redirect { status: u16, location: &'static str },
}

/// Decide whether `path` may render for `me`.
///
/// A missing user still renders, so the shell can show an error state
/// when the backend is down.
pub fn page_access(me: Option<Me>, path: &str) -> PageAccess {
    let Some(me) = me else {
        return PageAccess::Render {
            me: None,
            needs_terms: false,
        };
    };

    let needs_terms = me.terms_required;
    if needs_terms && !PUBLIC_ROUTES.contains(&path) {
        return PageAccess::Redirect {
            status: REDIRECT_STATUS,
            location: ACCEPT_TERMS_ROUTE,
        };
    }

    PageAccess::Render {
        me: Some(me),
        needs_terms,
    }
}

impl<T: Transport> AssistantClient<T> {
    /// Signed-in user from `GET {base}/me`.
    ///
    /// Every failure, including an unreachable backend, maps to `None`.
    pub async fn me(&self) -> Option<Me> {
        let url = self.endpoint(&["me"]).ok()?;
        let response = match self.transport().send(TransportRequest::new(Method::GET, url)).await {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "user lookup failed");
                return None;
            }
        };
        if !response.is_success() {
            debug!(status = response.status, "no user for this session");
            return None;
        }
        response.json().await.ok()
    }

    /// Look up the user and gate `path`.
    pub async fn load_page(&self, path: &str) -> PageAccess {
        page_access(self.me().await, path)
    }
}
