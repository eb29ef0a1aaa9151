//! Provider fault classification
//!
//! Every SDK error is mapped once, here, onto the closed `sb_core::Error`
//! taxonomy. Service faults go through an explicit code table; transport
//! faults are told apart by inspecting the error's source chain.

use std::error::Error as StdError;
use std::io;

use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_smithy_types::error::display::DisplayErrorContext;
use sb_core::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FaultKind {
    Auth,
    Bucket,
    NotFound,
}

/// S3 error codes with a dedicated kind; any other code is a generic store fault
const FAULT_CODES: &[(&str, FaultKind)] = &[
    ("InvalidAccessKeyId", FaultKind::Auth),
    ("SignatureDoesNotMatch", FaultKind::Auth),
    ("AccessDenied", FaultKind::Auth),
    ("InvalidToken", FaultKind::Auth),
    ("ExpiredToken", FaultKind::Auth),
    ("InvalidSecurity", FaultKind::Auth),
    ("InvalidBucketName", FaultKind::Bucket),
    ("NoSuchBucket", FaultKind::NotFound),
    ("NoSuchKey", FaultKind::NotFound),
    ("NotFound", FaultKind::NotFound),
];

/// Fragments of resolver errors, lowercased
const DNS_MARKERS: &[&str] = &[
    "dns error",
    "failed to lookup address",
    "name or service not known",
    "nodename nor servname",
    "no such host",
];

fn fault_for_code(code: &str) -> Option<FaultKind> {
    FAULT_CODES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, kind)| *kind)
}

/// Classify an error response from the store
pub(crate) fn classify_service_fault(code: Option<&str>, status: u16, message: String) -> Error {
    let kind = match code {
        Some(code) => fault_for_code(code),
        // HEAD requests carry no body, so only the status is available
        None => match status {
            401 | 403 => Some(FaultKind::Auth),
            404 => Some(FaultKind::NotFound),
            _ => None,
        },
    };

    match kind {
        Some(FaultKind::Auth) => Error::Auth(message),
        Some(FaultKind::Bucket) => Error::Bucket(message),
        Some(FaultKind::NotFound) => Error::NotFound(message),
        None => Error::Store(message),
    }
}

/// Classify a request that never got a response
pub(crate) fn classify_transport_fault(err: &(dyn StdError + 'static), message: String) -> Error {
    let refused = std::iter::successors(Some(err), |&e| e.source()).any(|e| {
        e.downcast_ref::<io::Error>()
            .is_some_and(|io| io.kind() == io::ErrorKind::ConnectionRefused)
    });

    let lower = message.to_lowercase();
    if refused || lower.contains("connection refused") {
        Error::ConnectionRefused(message)
    } else if DNS_MARKERS.iter().any(|marker| lower.contains(marker)) {
        Error::Resolution(message)
    } else {
        Error::Connection(message)
    }
}

/// Map an SDK error onto the browser's error taxonomy
pub fn classify<E>(err: SdkError<E, HttpResponse>) -> Error
where
    E: ProvideErrorMetadata + StdError + Send + Sync + 'static,
{
    let message = DisplayErrorContext(&err).to_string();

    match &err {
        SdkError::ServiceError(service) => {
            classify_service_fault(service.err().code(), service.raw().status().as_u16(), message)
        }
        SdkError::DispatchFailure(_) => classify_transport_fault(&err, message),
        SdkError::TimeoutError(_) => Error::Connection(message),
        SdkError::ConstructionFailure(_) => Error::Resolution(message),
        _ => Error::Unknown(message),
    }
}
