use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::repository::StorageError;

/// Classify a non-success status; `None` means the response can be used.
pub(crate) fn status_error(status: StatusCode) -> Option<StorageError> {
    if status.is_success() {
        return None;
    }
    Some(match status {
        StatusCode::NOT_FOUND => StorageError::NotFound,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StorageError::Unauthenticated,
        other => StorageError::HttpStatus(other.as_u16()),
    })
}

pub(crate) fn transport(err: &reqwest::Error) -> StorageError {
    if err.is_decode() {
        StorageError::Serialization(err.to_string())
    } else {
        StorageError::Connection(err.to_string())
    }
}

pub(crate) fn checked(response: Response) -> Result<Response, StorageError> {
    match status_error(response.status()) {
        Some(err) => Err(err),
        None => Ok(response),
    }
}

pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, StorageError> {
    let body = checked(response)?
        .bytes()
        .await
        .map_err(|e| transport(&e))?;
    serde_json::from_slice(&body).map_err(|e| StorageError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_statuses_pass_through() {
        assert_eq!(status_error(StatusCode::OK), None);
        assert_eq!(status_error(StatusCode::CREATED), None);
    }

    #[test]
    fn auth_and_missing_statuses_are_classified() {
        assert_eq!(status_error(StatusCode::NOT_FOUND), Some(StorageError::NotFound));
        assert_eq!(
            status_error(StatusCode::UNAUTHORIZED),
            Some(StorageError::Unauthenticated)
        );
        assert_eq!(
            status_error(StatusCode::FORBIDDEN),
            Some(StorageError::Unauthenticated)
        );
        assert_eq!(
            status_error(StatusCode::TOO_MANY_REQUESTS),
            Some(StorageError::HttpStatus(429))
        );
        assert_eq!(
            status_error(StatusCode::INTERNAL_SERVER_ERROR),
            Some(StorageError::HttpStatus(500))
        );
    }
}
