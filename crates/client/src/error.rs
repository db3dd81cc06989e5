//! Error taxonomy for the client engine.
//!
//! Three layers: [`ConfigError`] at startup, [`ApiError`] for anything that
//! crosses a service boundary, and [`CheckoutError`] for the orchestrated
//! checkout sequence. Cart-clear failures after a successful order are
//! deliberately absent from the taxonomy - they are logged and swallowed
//! (see `CartStore::clear`), never surfaced to a caller.

use thiserror::Error;

pub use crate::config::ConfigError;

/// Errors from a remote service call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No session token is present. No request was issued.
    #[error("not signed in")]
    Unauthenticated,

    /// A service answered 401. The session has already been invalidated.
    #[error("session is no longer valid")]
    Unauthorized,

    /// The request could not be sent or the response not read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    ///
    /// `message` carries the service's own error message verbatim when the
    /// body had one, otherwise a generic description.
    #[error("service error: {status} - {message}")]
    Service { status: u16, message: String },

    /// The response body was not the JSON we expected.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ApiError {
    /// Whether this error means the user needs to sign in (again).
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthenticated | Self::Unauthorized)
    }
}

/// The checkout step a failure occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckoutStep {
    BuildPayload,
    CreateOrder,
    InitiatePayment,
    RecordPaymentInit,
    RedirectToGateway,
}

impl std::fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::BuildPayload => "buildPayload",
            Self::CreateOrder => "createOrder",
            Self::InitiatePayment => "initiatePayment",
            Self::RecordPaymentInit => "recordPaymentInit",
            Self::RedirectToGateway => "redirectToGateway",
        };
        f.write_str(name)
    }
}

/// Errors from the checkout sequence.
///
/// Every variant is terminal for the attempt: the orchestrator never resumes
/// from a partial state, and a failure after order creation leaves the
/// durable order in place (the client has no authority to cancel it).
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No session token was present when the sequence needed one.
    #[error("not signed in")]
    Unauthenticated,

    /// Required checkout fields are missing. Nothing was sent anywhere.
    #[error("missing required fields: {}", missing_fields.join(", "))]
    Validation { missing_fields: Vec<String> },

    /// Order creation failed; no order exists for this attempt.
    #[error("order creation failed: {0}")]
    CreateOrder(#[source] ApiError),

    /// Payment creation failed. Not retried - a blind retry risks a
    /// duplicate payment intent against the already-durable order.
    #[error("payment initiation failed: {0}")]
    InitiatePayment(#[source] ApiError),

    /// Recording the payment attempt failed, so the gateway redirect was
    /// withheld (a redirect without a durable record would be invisible to
    /// reconciliation).
    #[error("recording payment attempt failed: {0}")]
    RecordPaymentInit(#[source] ApiError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_fields() {
        let err = CheckoutError::Validation {
            missing_fields: vec!["billingAddress.email".into(), "paymentMethod".into()],
        };
        assert_eq!(
            err.to_string(),
            "missing required fields: billingAddress.email, paymentMethod"
        );
    }

    #[test]
    fn step_names_match_the_operation_vocabulary() {
        assert_eq!(CheckoutStep::BuildPayload.to_string(), "buildPayload");
        assert_eq!(CheckoutStep::InitiatePayment.to_string(), "initiatePayment");
        assert_eq!(
            CheckoutStep::RedirectToGateway.to_string(),
            "redirectToGateway"
        );
    }

    #[test]
    fn service_errors_preserve_the_server_message() {
        let err = CheckoutError::InitiatePayment(ApiError::Service {
            status: 502,
            message: "gateway unreachable".into(),
        });
        assert!(err.to_string().contains("gateway unreachable"));
    }
}
