//! Bot-check gate backed by a siteverify-style verification endpoint

use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::secrets::{SecretError, SecretProvider};

pub const DEFAULT_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";
pub const DEFAULT_MIN_SCORE: f64 = 0.3;
pub const DEFAULT_EXPECTED_ACTION: &str = "submitHike";
pub const DEFAULT_VERIFY_TIMEOUT_MS: u64 = 5_000;

/// Acceptance rules applied to a verification response
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationPolicy {
    /// Lowest trust score that is still accepted (inclusive)
    pub min_score: f64,
    /// When set, a response carrying a different action label is rejected.
    /// Responses without an action label are not checked.
    pub expected_action: Option<String>,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
            expected_action: Some(DEFAULT_EXPECTED_ACTION.to_string()),
        }
    }
}

/// Body returned by the verification endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct SiteVerifyResponse {
    pub success: bool,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(rename = "error-codes", default)]
    pub error_codes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    MissingToken,
    NotSuccessful { error_codes: Vec<String> },
    LowScore { score: Option<f64>, min_score: f64 },
    ActionMismatch { expected: String, actual: String },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MissingToken => write!(f, "verification token missing"),
            RejectReason::NotSuccessful { error_codes } => {
                write!(f, "verification unsuccessful (error codes: {:?})", error_codes)
            }
            RejectReason::LowScore { score, min_score } => {
                write!(f, "score {:?} below threshold {}", score, min_score)
            }
            RejectReason::ActionMismatch { expected, actual } => {
                write!(f, "action '{}' does not match expected '{}'", actual, expected)
            }
        }
    }
}

/// The verification call could not be completed
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("verification secret unavailable: {0}")]
    Secret(#[from] SecretError),

    #[error("verification request timed out after {0:?}")]
    Timeout(Duration),

    #[error("verification request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("verification endpoint returned status {0}")]
    Status(StatusCode),

    #[error("verification response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Outcome of the bot-check gate
#[derive(Debug)]
pub enum Verdict {
    Accept,
    Reject(RejectReason),
    Unavailable(VerifyError),
}

#[async_trait]
pub trait HumanVerifier: Send + Sync {
    /// Decide whether `token` was issued to a human. Makes at most one outbound call.
    async fn verify(&self, token: &str) -> Verdict;
}

/// Apply `policy` to a decoded verification response.
pub fn evaluate(
    response: &SiteVerifyResponse,
    policy: &VerificationPolicy,
) -> Result<(), RejectReason> {
    if !response.success {
        return Err(RejectReason::NotSuccessful {
            error_codes: response.error_codes.clone(),
        });
    }

    match response.score {
        Some(score) if score >= policy.min_score => {}
        score => {
            return Err(RejectReason::LowScore {
                score,
                min_score: policy.min_score,
            })
        }
    }

    if let (Some(expected), Some(actual)) = (&policy.expected_action, &response.action) {
        if expected != actual {
            return Err(RejectReason::ActionMismatch {
                expected: expected.clone(),
                actual: actual.clone(),
            });
        }
    }

    Ok(())
}

/// [`HumanVerifier`] that calls a reCAPTCHA-compatible siteverify endpoint
pub struct RecaptchaVerifier {
    client: Client,
    url: String,
    timeout: Duration,
    secrets: Arc<dyn SecretProvider>,
    secret_name: String,
    policy: VerificationPolicy,
}

impl RecaptchaVerifier {
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        secrets: Arc<dyn SecretProvider>,
        secret_name: impl Into<String>,
        policy: VerificationPolicy,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            timeout,
            secrets,
            secret_name: secret_name.into(),
            policy,
        })
    }

    async fn call(&self, token: &str) -> Result<SiteVerifyResponse, VerifyError> {
        let secret = self.secrets.secret(&self.secret_name).await?;

        let response = self
            .client
            .post(&self.url)
            .form(&[("secret", secret.as_str()), ("response", token)])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerifyError::Status(status));
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        debug!("Verification response body: {}", body);
        Ok(serde_json::from_str(&body)?)
    }

    fn transport_error(&self, e: reqwest::Error) -> VerifyError {
        if e.is_timeout() {
            VerifyError::Timeout(self.timeout)
        } else {
            VerifyError::Transport(e)
        }
    }
}

#[async_trait]
impl HumanVerifier for RecaptchaVerifier {
    async fn verify(&self, token: &str) -> Verdict {
        if token.trim().is_empty() {
            warn!("Verification token missing, skipping verification call");
            return Verdict::Reject(RejectReason::MissingToken);
        }

        let response = match self.call(token).await {
            Ok(response) => response,
            Err(e) => {
                error!("Error during verification call: {}", e);
                return Verdict::Unavailable(e);
            }
        };

        match evaluate(&response, &self.policy) {
            Ok(()) => {
                info!(score = ?response.score, "Verification successful");
                Verdict::Accept
            }
            Err(reason) => {
                warn!(
                    hostname = ?response.hostname,
                    action = ?response.action,
                    "Verification rejected: {}",
                    reason
                );
                Verdict::Reject(reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::StaticSecretProvider;
    use mockito::{Matcher, Server};

    const SECRET_NAME: &str = "RECAPTCHA_SECRET_KEY";

    fn response(success: bool, score: Option<f64>, action: Option<&str>) -> SiteVerifyResponse {
        SiteVerifyResponse {
            success,
            score,
            action: action.map(str::to_string),
            hostname: None,
            error_codes: vec![],
        }
    }

    fn verifier(url: String) -> RecaptchaVerifier {
        let secrets = Arc::new(StaticSecretProvider::new().with(SECRET_NAME, "s3cret"));
        RecaptchaVerifier::new(
            url,
            Duration::from_secs(2),
            secrets,
            SECRET_NAME,
            VerificationPolicy::default(),
        )
        .unwrap()
    }

    #[test]
    fn evaluate_accepts_score_at_threshold() {
        let policy = VerificationPolicy::default();
        assert!(evaluate(&response(true, Some(0.3), Some("submitHike")), &policy).is_ok());
        assert!(evaluate(&response(true, Some(0.9), Some("submitHike")), &policy).is_ok());
    }

    #[test]
    fn evaluate_rejects_unsuccessful() {
        let policy = VerificationPolicy::default();
        assert!(matches!(
            evaluate(&response(false, Some(0.9), Some("submitHike")), &policy),
            Err(RejectReason::NotSuccessful { .. })
        ));
    }

    #[test]
    fn evaluate_rejects_low_or_missing_score() {
        let policy = VerificationPolicy::default();
        assert!(matches!(
            evaluate(&response(true, Some(0.29), Some("submitHike")), &policy),
            Err(RejectReason::LowScore { .. })
        ));
        assert!(matches!(
            evaluate(&response(true, None, Some("submitHike")), &policy),
            Err(RejectReason::LowScore { score: None, .. })
        ));
    }

    #[test]
    fn evaluate_checks_action_only_when_configured() {
        let strict = VerificationPolicy::default();
        assert!(matches!(
            evaluate(&response(true, Some(0.9), Some("login")), &strict),
            Err(RejectReason::ActionMismatch { .. })
        ));
        // No action label in the response
        assert!(evaluate(&response(true, Some(0.9), None), &strict).is_ok());

        let lenient = VerificationPolicy {
            expected_action: None,
            ..VerificationPolicy::default()
        };
        assert!(evaluate(&response(true, Some(0.9), Some("login")), &lenient).is_ok());
    }

    #[test]
    fn decodes_error_codes_field() {
        let parsed: SiteVerifyResponse = serde_json::from_str(
            r#"{"success":false,"error-codes":["invalid-input-response"]}"#,
        )
        .unwrap();
        assert!(!parsed.success);
        assert_eq!(parsed.error_codes, vec!["invalid-input-response"]);
    }

    #[test_log::test(tokio::test)]
    async fn accepts_trusted_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/siteverify")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("secret".into(), "s3cret".into()),
                Matcher::UrlEncoded("response".into(), "token-123".into()),
            ]))
            .with_header("content-type", "application/json")
            .with_body(r#"{"success":true,"score":0.9,"action":"submitHike"}"#)
            .create_async()
            .await;

        let verdict = verifier(format!("{}/siteverify", server.url()))
            .verify("token-123")
            .await;

        assert!(matches!(verdict, Verdict::Accept));
        mock.assert_async().await;
    }

    #[test_log::test(tokio::test)]
    async fn rejects_failed_verification() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/siteverify")
            .with_body(r#"{"success":false,"error-codes":["timeout-or-duplicate"]}"#)
            .create_async()
            .await;

        let verdict = verifier(format!("{}/siteverify", server.url()))
            .verify("token-123")
            .await;

        assert!(matches!(
            verdict,
            Verdict::Reject(RejectReason::NotSuccessful { .. })
        ));
    }

    #[test_log::test(tokio::test)]
    async fn empty_token_makes_no_call() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/siteverify")
            .expect(0)
            .create_async()
            .await;

        let verdict = verifier(format!("{}/siteverify", server.url()))
            .verify("   ")
            .await;

        assert!(matches!(
            verdict,
            Verdict::Reject(RejectReason::MissingToken)
        ));
        mock.assert_async().await;
    }

    #[test_log::test(tokio::test)]
    async fn server_error_is_unavailable() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/siteverify")
            .with_status(503)
            .create_async()
            .await;

        let verdict = verifier(format!("{}/siteverify", server.url()))
            .verify("token-123")
            .await;

        assert!(matches!(
            verdict,
            Verdict::Unavailable(VerifyError::Status(status)) if status == StatusCode::SERVICE_UNAVAILABLE
        ));
    }

    #[test_log::test(tokio::test)]
    async fn garbage_body_is_unavailable() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/siteverify")
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let verdict = verifier(format!("{}/siteverify", server.url()))
            .verify("token-123")
            .await;

        assert!(matches!(verdict, Verdict::Unavailable(VerifyError::Decode(_))));
    }

    #[test_log::test(tokio::test)]
    async fn connection_refused_is_unavailable() {
        let verdict = verifier("http://127.0.0.1:1/siteverify".to_string())
            .verify("token-123")
            .await;

        assert!(matches!(verdict, Verdict::Unavailable(_)));
    }

    #[test_log::test(tokio::test)]
    async fn timeout_is_unavailable() {
        // Accepts connections and never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let timeout = Duration::from_millis(200);
        let verifier = RecaptchaVerifier::new(
            format!("http://{addr}/siteverify"),
            timeout,
            Arc::new(StaticSecretProvider::new().with(SECRET_NAME, "s3cret")),
            SECRET_NAME,
            VerificationPolicy::default(),
        )
        .unwrap();

        let verdict = verifier.verify("token-123").await;

        assert!(matches!(
            verdict,
            Verdict::Unavailable(VerifyError::Timeout(d)) if d == timeout
        ));
    }

    #[test_log::test(tokio::test)]
    async fn missing_secret_is_unavailable() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/siteverify")
            .expect(0)
            .create_async()
            .await;

        let verifier = RecaptchaVerifier::new(
            format!("{}/siteverify", server.url()),
            Duration::from_secs(2),
            Arc::new(StaticSecretProvider::new()),
            SECRET_NAME,
            VerificationPolicy::default(),
        )
        .unwrap();

        let verdict = verifier.verify("token-123").await;

        assert!(matches!(verdict, Verdict::Unavailable(VerifyError::Secret(_))));
        mock.assert_async().await;
    }
}
