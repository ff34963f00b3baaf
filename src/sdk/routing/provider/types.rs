use crate::sdk::routing::error::RoutingError;
use serde::Deserialize;

// Error bodies seen from routing providers:
//   {"statusCode": 401, "error": "Unauthorized", "message": "Invalid apiKey"}
//   {"error": {"code": 2010, "message": "Could not find routable point"}}
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum ErrorPayload {
    Flat {
        #[serde(rename = "statusCode")]
        status_code: Option<u32>,
        error: Option<String>,
        message: String,
    },
    Nested {
        error: ErrorDetail,
    },
}

#[derive(Deserialize, Debug)]
pub struct ErrorDetail {
    pub code: u32,
    pub message: String,
}

/// Maps a non-success response onto the most specific error available.
pub fn error_from_body(status: u16, body: &str) -> RoutingError {
    match serde_json::from_str::<ErrorPayload>(body) {
        Ok(ErrorPayload::Nested { error }) => RoutingError::ApiError {
            code: error.code,
            message: error.message,
        },
        Ok(ErrorPayload::Flat {
            status_code,
            error,
            message,
        }) => RoutingError::ApiError {
            code: status_code.unwrap_or(u32::from(status)),
            message: match error {
                Some(kind) => format!("{kind}: {message}"),
                None => message,
            },
        },
        Err(_) => RoutingError::RawApiError {
            status,
            body: body.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_error_body() {
        let err = error_from_body(
            401,
            r#"{"statusCode":401,"error":"Unauthorized","message":"Invalid apiKey"}"#,
        );
        match err {
            RoutingError::ApiError { code, message } => {
                assert_eq!(code, 401);
                assert_eq!(message, "Unauthorized: Invalid apiKey");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn nested_error_body() {
        let err = error_from_body(
            404,
            r#"{"error":{"code":2010,"message":"Could not find routable point"}}"#,
        );
        assert!(matches!(err, RoutingError::ApiError { code: 2010, .. }));
    }

    #[test]
    fn unstructured_body_is_kept_raw() {
        let err = error_from_body(502, "<html>Bad Gateway</html>");
        assert!(matches!(err, RoutingError::RawApiError { status: 502, .. }));
    }
}
