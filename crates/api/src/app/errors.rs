use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use tableside_identity::AuthError;

pub fn auth_error_to_response(err: AuthError) -> axum::response::Response {
    let (status, code) = match &err {
        AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
        AuthError::NotAuthenticated => (StatusCode::UNAUTHORIZED, "not_authenticated"),
        AuthError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
        AuthError::EmailAlreadyRegistered => (StatusCode::CONFLICT, "email_already_registered"),
        AuthError::ProfileNotFound => (StatusCode::NOT_FOUND, "profile_not_found"),
        AuthError::ProviderUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "provider_unavailable"),
        AuthError::Unknown(_) => (StatusCode::INTERNAL_SERVER_ERROR, "unknown"),
    };
    json_error(status, code, err.message())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_auth_errors_to_statuses() {
        let cases = [
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::Validation("Name must be at least 2 characters".into()), StatusCode::BAD_REQUEST),
            (AuthError::EmailAlreadyRegistered, StatusCode::CONFLICT),
            (AuthError::ProviderUnavailable("down".into()), StatusCode::SERVICE_UNAVAILABLE),
            (AuthError::Unknown("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(auth_error_to_response(err).status(), status);
        }
    }
}
