//! # Platform Status Codes
//!
//! Every platform response carries one or more `Status` objects. REST renders the code
//! as the enum name (`"OK"`, `"ALREADY_EXISTS"`), gRPC as its integer value. [`StatusCode`]
//! accepts both and keeps anything it does not recognise instead of failing the decode.
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// The platform's status enum.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum StatusCode {
    #[default]
    Ok,
    Failure,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    Unimplemented,
    Internal,
    Unavailable,
    DataLoss,
    Unauthenticated,
    /// An integer code this client does not know about.
    Other(i32),
    /// A code name this client does not know about.
    Unrecognized(String),
}

const NAMED_CODES: &[(StatusCode, i32, &str)] = &[
    (StatusCode::Ok, 0, "OK"),
    (StatusCode::Failure, 1, "FAILURE"),
    (StatusCode::Unknown, 2, "UNKNOWN"),
    (StatusCode::InvalidArgument, 3, "INVALID_ARGUMENT"),
    (StatusCode::DeadlineExceeded, 4, "DEADLINE_EXCEEDED"),
    (StatusCode::NotFound, 5, "NOT_FOUND"),
    (StatusCode::AlreadyExists, 6, "ALREADY_EXISTS"),
    (StatusCode::PermissionDenied, 7, "PERMISSION_DENIED"),
    (StatusCode::ResourceExhausted, 8, "RESOURCE_EXHAUSTED"),
    (StatusCode::FailedPrecondition, 9, "FAILED_PRECONDITION"),
    (StatusCode::Aborted, 10, "ABORTED"),
    (StatusCode::OutOfRange, 11, "OUT_OF_RANGE"),
    (StatusCode::Unimplemented, 12, "UNIMPLEMENTED"),
    (StatusCode::Internal, 13, "INTERNAL"),
    (StatusCode::Unavailable, 14, "UNAVAILABLE"),
    (StatusCode::DataLoss, 15, "DATA_LOSS"),
    (StatusCode::Unauthenticated, 16, "UNAUTHENTICATED"),
];

impl StatusCode {
    pub fn is_ok(&self) -> bool {
        *self == StatusCode::Ok
    }

    /// Maps the wire integer (gRPC) onto a code.
    pub fn from_i32(value: i32) -> Self {
        NAMED_CODES
            .iter()
            .find(|(_, number, _)| *number == value)
            .map(|(code, _, _)| code.clone())
            .unwrap_or(StatusCode::Other(value))
    }

    /// Maps the enum name (REST) onto a code.
    pub fn from_name(name: &str) -> Self {
        NAMED_CODES
            .iter()
            .find(|(_, _, n)| *n == name)
            .map(|(code, _, _)| code.clone())
            .unwrap_or_else(|| StatusCode::Unrecognized(name.to_string()))
    }

    /// The wire integer, when known.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            StatusCode::Other(value) => Some(*value),
            StatusCode::Unrecognized(_) => None,
            code => NAMED_CODES
                .iter()
                .find(|(c, _, _)| c == code)
                .map(|(_, number, _)| *number),
        }
    }

    pub fn name(&self) -> String {
        match self {
            StatusCode::Other(value) => format!("CODE_{value}"),
            StatusCode::Unrecognized(name) => name.clone(),
            code => NAMED_CODES
                .iter()
                .find(|(c, _, _)| c == code)
                .map(|(_, _, name)| name.to_string())
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl Serialize for StatusCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name())
    }
}

impl<'de> Deserialize<'de> for StatusCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Number(i32),
            Name(String),
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Number(value) => StatusCode::from_i32(value),
            Wire::Name(name) => StatusCode::from_name(&name),
        })
    }
}

/// A status as found at call, corpus or item level of a response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResult {
    #[serde(default)]
    pub code: StatusCode,
    #[serde(default, alias = "status_detail")]
    pub status_detail: String,
}

impl StatusResult {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn new(code: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            status_detail: detail.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code.is_ok()
    }
}

impl fmt::Display for StatusResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.status_detail.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{}: {}", self.code, self.status_detail)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_names_and_numbers() {
        let by_name: StatusResult =
            serde_json::from_str(r#"{"code":"ALREADY_EXISTS","statusDetail":"dup"}"#).unwrap();
        let by_number: StatusResult =
            serde_json::from_str(r#"{"code":6,"status_detail":"dup"}"#).unwrap();

        assert_eq!(by_name, by_number);
        assert_eq!(by_name.code, StatusCode::AlreadyExists);
        assert_eq!(by_name.status_detail, "dup");
    }

    #[test]
    fn keeps_unknown_codes() {
        assert_eq!(StatusCode::from_i32(401), StatusCode::Other(401));
        assert_eq!(
            StatusCode::from_name("ADM__CORPUS_LIMIT_REACHED"),
            StatusCode::Unrecognized("ADM__CORPUS_LIMIT_REACHED".into())
        );
        assert_eq!(StatusCode::Other(401).as_i32(), Some(401));
    }

    #[test]
    fn missing_code_means_ok() {
        let status: StatusResult = serde_json::from_str("{}").unwrap();
        assert!(status.is_ok());
    }
}
