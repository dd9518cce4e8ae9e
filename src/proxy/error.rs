use std::error::Error as _;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use super::upstream::UpstreamError;
use crate::json::{NotScalarError, SelectionError};
use crate::xml::XmlError;

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    NotScalar(#[from] NotScalarError),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error(transparent)]
    Render(#[from] XmlError),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Selection(_) => StatusCode::BAD_REQUEST,
            Self::NotScalar(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Upstream(UpstreamError::InvalidUrl { .. }) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The error followed by its chain of sources
    pub fn message(&self) -> String {
        let mut message = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            message.push_str(&format!("; {cause}"));
            source = cause.source();
        }
        message
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            log::error!("{status}: {message}");
        } else {
            log::warn!("{status}: {message}");
        }
        (
            status,
            [(header::CONTENT_TYPE, super::TEXT_CONTENT_TYPE)],
            format!("error: {message}"),
        )
            .into_response()
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;

#[cfg(test)]
mod tests {
    use super::*;

    use reqwest::StatusCode as UpstreamStatus;

    #[test]
    fn each_error_kind_has_a_distinct_client_status() {
        let selection = ProxyError::from(SelectionError::NoMatch {
            path: "$.a".to_string(),
        });
        let not_scalar = ProxyError::from(NotScalarError { found: "Object" });
        let bad_url = ProxyError::from(UpstreamError::InvalidUrl {
            url: "ftp://x".to_string(),
            reason: "unsupported scheme 'ftp'".to_string(),
        });
        let upstream = ProxyError::from(UpstreamError::Status {
            status: UpstreamStatus::NOT_FOUND,
            body: "gone".to_string(),
        });

        assert_eq!(selection.status(), StatusCode::BAD_REQUEST);
        assert_eq!(not_scalar.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(bad_url.status(), StatusCode::BAD_REQUEST);
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn message_includes_sources() {
        let json_err = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        let err = ProxyError::from(UpstreamError::InvalidJson(json_err));
        let message = err.message();
        assert!(message.starts_with("upstream response is not valid JSON; "));
    }

    #[test]
    fn response_is_plain_text_error() {
        let response = ProxyError::from(NotScalarError { found: "Array" }).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
    }
}
