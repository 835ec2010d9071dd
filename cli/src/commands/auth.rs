use dayreport_core::AuthError;
use serde_json::json;

use crate::transport::HttpBackend;
use crate::util::{
    StoredSession, config_path, print_json, remove_session, require_identity, save_session,
};

pub async fn login(
    backend: &HttpBackend,
    api_url: &str,
    username: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let identity = match backend.session().authenticate(backend, username, password).await {
        Ok(identity) => identity,
        Err(AuthError::InvalidCredentials) => {
            return Err("잘못된 사용자 이름 또는 비밀번호입니다.".into());
        }
        Err(e) => return Err(e.into()),
    };

    let session = backend
        .session()
        .current()
        .ok_or("Login succeeded but no session was stored.")?;
    save_session(&config_path(), &StoredSession {
        api_url: api_url.to_string(),
        session,
        saved_at: chrono::Utc::now(),
    })?;

    print_json(&json!({
        "status": "authenticated",
        "user": identity,
        "config_path": config_path().to_string_lossy()
    }))
}

pub fn logout(backend: &HttpBackend) -> Result<(), Box<dyn std::error::Error>> {
    backend.session().logout();
    let removed = remove_session(&config_path())?;
    print_json(&json!({
        "status": "logged_out",
        "had_session": removed,
        "config_path": config_path().to_string_lossy()
    }))
}

pub fn whoami(backend: &HttpBackend) -> Result<(), Box<dyn std::error::Error>> {
    let identity = require_identity(backend.session());
    print_json(&json!({
        "user": identity,
        "can_review_team": identity.role.can_review_team()
    }))
}
