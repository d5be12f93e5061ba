//! Failure classification for the generation pipeline.
//!
//! `classify` is a pure decision table: a structured description of what
//! went wrong in, the operator alert (if any) and the user-facing outcome out.
//! Rules are evaluated in priority order and the first match wins.

use crate::llm_client::CompletionError;
use crate::notify::AlertCategory;
use crate::validation::ValidationError;

const REGION_BLOCK_MARKERS: &[&str] = &[
    "unsupported_country",
    "country, region, or territory not supported",
    "unsupported_country_region_territory",
];

const GENERIC_API_MARKERS: &[&str] = &["api", "rate limit"];

const AUTH_MARKERS: &[&str] = &["authentication", "invalid", "token"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    ProviderRateLimit,
    Connection,
    Timeout,
    ProviderApi,
    Validation,
    Unexpected,
}

/// What failed, independent of which library raised it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    pub kind: FailureKind,
    pub type_name: String,
    pub message: String,
    pub status: Option<u16>,
}

impl From<&CompletionError> for FailureReport {
    fn from(e: &CompletionError) -> Self {
        let (kind, status) = match e {
            CompletionError::RateLimited { .. } => (FailureKind::ProviderRateLimit, Some(429)),
            CompletionError::Connection(_) => (FailureKind::Connection, None),
            CompletionError::Timeout(_) => (FailureKind::Timeout, None),
            CompletionError::Api { status, .. } => (FailureKind::ProviderApi, Some(*status)),
            CompletionError::Parse(_) | CompletionError::EmptyContent => {
                (FailureKind::Unexpected, None)
            }
        };
        Self {
            kind,
            type_name: e.type_name().to_string(),
            message: e.to_string(),
            status,
        }
    }
}

impl From<&ValidationError> for FailureReport {
    fn from(e: &ValidationError) -> Self {
        Self {
            kind: FailureKind::Validation,
            type_name: "ValidationError".to_string(),
            message: e.to_string(),
            status: None,
        }
    }
}

/// What the user is told.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    RegionBlocked,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub category: AlertCategory,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// `None` means log only.
    pub alert: Option<Alert>,
    pub outcome: FailureOutcome,
}

impl Verdict {
    fn failed(category: AlertCategory, details: String) -> Self {
        Self {
            alert: Some(Alert { category, details }),
            outcome: FailureOutcome::Failed,
        }
    }
}

pub fn classify(report: &FailureReport) -> Verdict {
    let message = &report.message;
    match report.kind {
        FailureKind::ProviderRateLimit => Verdict::failed(
            AlertCategory::ProviderRateLimit,
            format!("OpenAI Rate Limit Exceeded: {message}"),
        ),
        FailureKind::Connection => Verdict::failed(
            AlertCategory::ProviderConnection,
            format!("OpenAI Connection Error: {message}"),
        ),
        FailureKind::Timeout => Verdict::failed(
            AlertCategory::ProviderTimeout,
            format!("OpenAI API Timeout: {message}"),
        ),
        FailureKind::ProviderApi => classify_api_error(report),
        FailureKind::Validation => Verdict {
            alert: None,
            outcome: FailureOutcome::Failed,
        },
        FailureKind::Unexpected => Verdict::failed(
            AlertCategory::UnexpectedError,
            format!("Unexpected Error: {}\n{message}", report.type_name),
        ),
    }
}

fn classify_api_error(report: &FailureReport) -> Verdict {
    let type_name = &report.type_name;
    let message = &report.message;
    let type_lower = type_name.to_lowercase();
    let message_lower = message.to_lowercase();
    let mentions = |markers: &[&str]| markers.iter().any(|m| message_lower.contains(m));

    if mentions(REGION_BLOCK_MARKERS) {
        return Verdict {
            alert: Some(Alert {
                category: AlertCategory::RegionBlocked,
                details: format!(
                    "OpenAI API Region Blocked: {type_name}\n{message}\n\n\
                     ⚠️ The OpenAI API is not available in the user's region.\n\n\
                     Possible fixes:\n\
                     1. Route API requests through a VPN/proxy\n\
                     2. Use an alternative API endpoint (OPENAI_API_BASE)\n\
                     3. Check the OpenAI account settings\n\
                     4. Use an API key from a supported region"
                ),
            }),
            outcome: FailureOutcome::RegionBlocked,
        };
    }

    if report.status == Some(403)
        || type_lower.contains("permissiondenied")
        || message_lower.contains("403")
    {
        return Verdict::failed(
            AlertCategory::PermissionDenied,
            format!("OpenAI API Permission Denied (403): {type_name}\n{message}"),
        );
    }

    if type_lower.contains("openai") || mentions(GENERIC_API_MARKERS) {
        return Verdict::failed(
            AlertCategory::ProviderApi,
            format!("OpenAI API Error: {type_name}\n{message}"),
        );
    }

    if mentions(AUTH_MARKERS) {
        return Verdict::failed(
            AlertCategory::Authentication,
            format!("Authentication Error: {type_name}\n{message}"),
        );
    }

    Verdict::failed(
        AlertCategory::ProviderApi,
        format!("OpenAI API Error: {type_name}\n{message}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(type_name: &str, message: &str) -> FailureReport {
        FailureReport {
            kind: FailureKind::ProviderApi,
            type_name: type_name.to_string(),
            message: message.to_string(),
            status: None,
        }
    }

    fn category(report: &FailureReport) -> Option<AlertCategory> {
        classify(report).alert.map(|a| a.category)
    }

    #[test]
    fn test_transport_kinds_map_directly() {
        let timeout = FailureReport::from(&CompletionError::Timeout("30s".to_string()));
        let verdict = classify(&timeout);
        assert_eq!(verdict.outcome, FailureOutcome::Failed);
        assert_eq!(
            verdict.alert.unwrap().category,
            AlertCategory::ProviderTimeout
        );

        let conn = FailureReport::from(&CompletionError::Connection("refused".to_string()));
        assert_eq!(category(&conn), Some(AlertCategory::ProviderConnection));

        let limited = FailureReport::from(&CompletionError::RateLimited {
            message: "slow down".to_string(),
        });
        assert_eq!(category(&limited), Some(AlertCategory::ProviderRateLimit));
    }

    #[test]
    fn test_rate_limit_wins_even_with_region_text() {
        // Provider rate limits are checked before any API-error sub-rule.
        let report = FailureReport::from(&CompletionError::RateLimited {
            message: "unsupported_country".to_string(),
        });
        let verdict = classify(&report);
        assert_eq!(verdict.outcome, FailureOutcome::Failed);
        assert_eq!(verdict.alert.unwrap().category, AlertCategory::ProviderRateLimit);
    }

    #[test]
    fn test_region_block_returns_distinct_outcome() {
        let report = api(
            "PermissionDeniedError",
            "Error code: 403 - {'error': {'code': 'unsupported_country_region_territory'}}",
        );
        let verdict = classify(&report);
        assert_eq!(verdict.outcome, FailureOutcome::RegionBlocked);
        let alert = verdict.alert.unwrap();
        assert_eq!(alert.category, AlertCategory::RegionBlocked);
        assert!(alert.details.contains("VPN"));
    }

    #[test]
    fn test_region_phrase_case_insensitive() {
        let report = api("APIStatusError", "Country, Region, or Territory not supported");
        assert_eq!(classify(&report).outcome, FailureOutcome::RegionBlocked);
    }

    #[test]
    fn test_permission_denied_by_type_or_status_text() {
        assert_eq!(
            category(&api("PermissionDeniedError", "forbidden")),
            Some(AlertCategory::PermissionDenied)
        );
        assert_eq!(
            category(&api("APIStatusError", "Error code: 403 - nope")),
            Some(AlertCategory::PermissionDenied)
        );
    }

    #[test]
    fn test_permission_denied_by_http_status() {
        let report = FailureReport {
            status: Some(403),
            ..api("APIStatusError", "Project does not have access to model")
        };
        assert_eq!(category(&report), Some(AlertCategory::PermissionDenied));
    }

    #[test]
    fn test_generic_keywords_before_auth_keywords() {
        // "invalid api key" has both; the generic rule comes first.
        assert_eq!(
            category(&api("AuthenticationError", "Incorrect API key provided: invalid")),
            Some(AlertCategory::ProviderApi)
        );
        assert_eq!(
            category(&api("BadRequestError", "Rate limit on tokens per day")),
            Some(AlertCategory::ProviderApi)
        );
    }

    #[test]
    fn test_auth_keywords() {
        assert_eq!(
            category(&api("AuthenticationError", "Invalid bearer token")),
            Some(AlertCategory::Authentication)
        );
    }

    #[test]
    fn test_api_fallback() {
        let verdict = classify(&api("InternalServerError", "upstream exploded"));
        assert_eq!(verdict.outcome, FailureOutcome::Failed);
        assert_eq!(verdict.alert.unwrap().category, AlertCategory::ProviderApi);
    }

    #[test]
    fn test_validation_is_log_only() {
        let report = FailureReport::from(&ValidationError::TooLong { max: 10 });
        let verdict = classify(&report);
        assert!(verdict.alert.is_none());
        assert_eq!(verdict.outcome, FailureOutcome::Failed);
    }

    #[test]
    fn test_empty_content_is_unexpected() {
        let report = FailureReport::from(&CompletionError::EmptyContent);
        let verdict = classify(&report);
        let alert = verdict.alert.unwrap();
        assert_eq!(alert.category, AlertCategory::UnexpectedError);
        assert!(alert.details.starts_with("Unexpected Error: EmptyContentError"));
    }
}
