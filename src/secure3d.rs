//! Bridging the 3-D Secure redirect surface back into the presenter.
//!
//! The challenge itself runs in an external browser surface: it loads the
//! issuer's ACS page, watches for navigation to a fixed redirect URL, and
//! hands the redirect page's rendered content back as text. This module
//! interprets those events. Reaching the redirect URL is the sole capture
//! trigger; the redirect target is never expected to load as a normal
//! page, so load errors for it are ignored, while a load error on the
//! challenge page itself is surfaced as a failure.

use crate::gateway::{ChallengeRequest, GatewayClient};
use crate::presenter::TransactionPresenter;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Redirect URL the gateway instructs the ACS page to post back to.
pub const DEFAULT_REDIRECT_URL: &str = "https://pay.cardform.dev/order/redirect";

/// The challenge result embedded in the redirect page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeOutcome {
    /// Receipt the challenge was started for; must match the receipt that
    /// requested it.
    pub receipt_id: String,
    /// The issuer rejected the authentication.
    #[serde(default)]
    pub declined: bool,
    /// Opaque merchant data echoed back by the ACS.
    #[serde(default)]
    pub md: Option<String>,
    /// Payer authentication response for the authorization call.
    #[serde(default)]
    pub pa_res: Option<String>,
}

/// An event from the redirect-capturing browser surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// A page began loading.
    Started {
        /// The page URL.
        url: String,
    },
    /// A page finished loading; for the redirect URL the surface includes
    /// the rendered content.
    Finished {
        /// The page URL.
        url: String,
        /// Rendered page text, when the surface captured it.
        content: Option<String>,
    },
    /// A page failed to load.
    LoadError {
        /// The failing URL.
        url: String,
        /// Surface-specific error code.
        code: i32,
        /// Error description.
        description: String,
    },
}

/// What an event meant, after interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeSignal {
    /// The challenge page finished loading and can be shown to the user.
    ChallengePageLoaded,
    /// The redirect URL was reached; the surface should hide itself while
    /// the result is processed.
    RedirectReached,
    /// The redirect page delivered a parseable challenge result.
    Outcome(ChallengeOutcome),
    /// The redirect page's content carried no readable result.
    MalformedPayload,
    /// The challenge page itself failed to load.
    ChallengeLoadFailed {
        /// Surface-specific error code.
        code: i32,
        /// Error description.
        description: String,
    },
    /// The event required no action.
    Ignored,
}

/// Interprets redirect-surface events for one challenge.
#[derive(Debug, Clone)]
pub struct ThreeDSecureBridge {
    acs_url: String,
    redirect_url: String,
}

impl ThreeDSecureBridge {
    /// Creates a bridge for the challenge, watching for the default
    /// redirect URL.
    pub fn new(challenge: &ChallengeRequest) -> Self {
        Self::with_redirect_url(challenge, DEFAULT_REDIRECT_URL)
    }

    /// Creates a bridge watching for a custom redirect URL.
    pub fn with_redirect_url(challenge: &ChallengeRequest, redirect_url: impl Into<String>) -> Self {
        Self {
            acs_url: challenge.acs_url.clone(),
            redirect_url: redirect_url.into(),
        }
    }

    /// The redirect URL this bridge watches for.
    pub fn redirect_url(&self) -> &str {
        &self.redirect_url
    }

    /// Interprets a single surface event.
    pub fn handle_event(&self, event: PageEvent) -> BridgeSignal {
        match event {
            PageEvent::Started { url } if url == self.redirect_url => BridgeSignal::RedirectReached,
            PageEvent::Started { .. } => BridgeSignal::Ignored,

            PageEvent::Finished { url, content } if url == self.redirect_url => {
                match content.as_deref().and_then(extract_outcome) {
                    Some(outcome) => {
                        debug!(receipt_id = %outcome.receipt_id, "challenge result captured");
                        BridgeSignal::Outcome(outcome)
                    }
                    None => {
                        warn!(%url, "redirect page carried no readable challenge result");
                        BridgeSignal::MalformedPayload
                    }
                }
            }
            PageEvent::Finished { url, .. } if url == self.acs_url => {
                BridgeSignal::ChallengePageLoaded
            }
            PageEvent::Finished { .. } => BridgeSignal::Ignored,

            PageEvent::LoadError {
                url,
                code,
                description,
            } => {
                if url.starts_with(&self.redirect_url) {
                    // The redirect target never loads as a normal page
                    BridgeSignal::Ignored
                } else {
                    warn!(%url, code, "challenge page failed to load");
                    BridgeSignal::ChallengeLoadFailed { code, description }
                }
            }
        }
    }

    /// Interprets an event and, when it carries a challenge result,
    /// resumes the presenter with it. The presenter reports its outcome
    /// through its observers; a rejected result is also logged here.
    pub async fn process<G: GatewayClient>(
        &self,
        event: PageEvent,
        presenter: &TransactionPresenter<G>,
    ) -> BridgeSignal {
        let signal = self.handle_event(event);

        if let BridgeSignal::Outcome(outcome) = &signal {
            if let Err(error) = presenter.on_challenge_result(outcome).await {
                warn!(%error, "challenge result rejected by presenter");
            }
        }

        signal
    }
}

/// Pulls the embedded JSON result out of the captured page text.
///
/// The redirect page body is the JSON document, but the capturing surface
/// hands over the full rendered markup, so this scans for the outermost
/// braces when a direct parse fails.
fn extract_outcome(content: &str) -> Option<ChallengeOutcome> {
    let trimmed = content.trim();

    if let Ok(outcome) = serde_json::from_str(trimmed) {
        return Some(outcome);
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }

    serde_json::from_str(&trimmed[start..=end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bridge() -> ThreeDSecureBridge {
        ThreeDSecureBridge::new(&ChallengeRequest {
            receipt_id: "1312".to_string(),
            acs_url: "https://acs.issuer.example/challenge".to_string(),
            md: "md-token".to_string(),
            pa_req: "pa-req-blob".to_string(),
        })
    }

    fn payload() -> String {
        r#"{"receiptId": "1312", "declined": false, "md": "md-token", "paRes": "pa-res-blob"}"#
            .to_string()
    }

    #[test]
    fn test_challenge_page_loaded() {
        let signal = bridge().handle_event(PageEvent::Finished {
            url: "https://acs.issuer.example/challenge".to_string(),
            content: None,
        });
        assert_eq!(signal, BridgeSignal::ChallengePageLoaded);
    }

    #[test]
    fn test_redirect_start_hides_surface() {
        let signal = bridge().handle_event(PageEvent::Started {
            url: DEFAULT_REDIRECT_URL.to_string(),
        });
        assert_eq!(signal, BridgeSignal::RedirectReached);
    }

    #[test]
    fn test_outcome_from_pure_json() {
        let signal = bridge().handle_event(PageEvent::Finished {
            url: DEFAULT_REDIRECT_URL.to_string(),
            content: Some(payload()),
        });

        match signal {
            BridgeSignal::Outcome(outcome) => {
                assert_eq!(outcome.receipt_id, "1312");
                assert!(!outcome.declined);
                assert_eq!(outcome.pa_res.as_deref(), Some("pa-res-blob"));
            }
            other => panic!("expected outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_outcome_from_html_wrapped_json() {
        let html = format!("<html><head></head><body><pre>{}</pre></body></html>", payload());
        let signal = bridge().handle_event(PageEvent::Finished {
            url: DEFAULT_REDIRECT_URL.to_string(),
            content: Some(html),
        });
        assert!(matches!(signal, BridgeSignal::Outcome(_)));
    }

    #[test]
    fn test_malformed_payload() {
        let signal = bridge().handle_event(PageEvent::Finished {
            url: DEFAULT_REDIRECT_URL.to_string(),
            content: Some("<html><body>Something went wrong</body></html>".to_string()),
        });
        assert_eq!(signal, BridgeSignal::MalformedPayload);

        let signal = bridge().handle_event(PageEvent::Finished {
            url: DEFAULT_REDIRECT_URL.to_string(),
            content: None,
        });
        assert_eq!(signal, BridgeSignal::MalformedPayload);
    }

    #[test]
    fn test_unrelated_pages_ignored() {
        let signal = bridge().handle_event(PageEvent::Finished {
            url: "https://acs.issuer.example/interstitial".to_string(),
            content: None,
        });
        assert_eq!(signal, BridgeSignal::Ignored);
    }

    #[test]
    fn test_redirect_load_errors_ignored() {
        let signal = bridge().handle_event(PageEvent::LoadError {
            url: format!("{}?attempt=1", DEFAULT_REDIRECT_URL),
            code: -2,
            description: "net::ERR_NAME_NOT_RESOLVED".to_string(),
        });
        assert_eq!(signal, BridgeSignal::Ignored);
    }

    #[test]
    fn test_challenge_load_errors_surfaced() {
        let signal = bridge().handle_event(PageEvent::LoadError {
            url: "https://acs.issuer.example/challenge".to_string(),
            code: -6,
            description: "net::ERR_CONNECTION_REFUSED".to_string(),
        });
        assert_eq!(
            signal,
            BridgeSignal::ChallengeLoadFailed {
                code: -6,
                description: "net::ERR_CONNECTION_REFUSED".to_string()
            }
        );
    }

    #[test]
    fn test_declined_outcome_parses() {
        let json = r#"{"receiptId": "1312", "declined": true}"#;
        let outcome: ChallengeOutcome = serde_json::from_str(json).unwrap();
        assert!(outcome.declined);
        assert_eq!(outcome.md, None);
    }
}
