use crate::error::AppError;
use crate::schemas::MemberId;
use actix_web::{http::header::HeaderValue, web, HttpRequest};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::num::ParseIntError;

type HmacSha256 = Hmac<Sha256>;

/// Shared secret: accepted verbatim as the service token and used to sign member tokens.
#[derive(Clone)]
pub struct ApiToken(pub String);

#[derive(Debug, PartialEq)]
pub enum AuthorizationLevel {
    Service,
    Member(MemberId),
}

impl AuthorizationLevel {
    pub fn may_act_for(&self, member_id: &str) -> bool {
        match self {
            AuthorizationLevel::Service => true,
            AuthorizationLevel::Member(id) => id == member_id,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
struct MemberToken {
    member_id: MemberId,
    issued_at: String,
    hash: String,
}

pub fn check_authorization_level(
    request: &HttpRequest,
    api_token: &str,
) -> Option<AuthorizationLevel> {
    let authorization = request
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .map(HeaderValue::to_str)?
        .ok()?;
    if authorization == api_token {
        return Some(AuthorizationLevel::Service);
    }
    let token: MemberToken = serde_json::from_str(authorization).ok()?;
    let hash = token
        .hash
        .chars()
        .collect::<Vec<_>>()
        .chunks(2)
        .map(|n| u8::from_str_radix(&String::from_iter(n), 16))
        .collect::<Result<Vec<u8>, ParseIntError>>()
        .ok()?;
    let mac = keyed_mac(&token.member_id, &token.issued_at, api_token)?;
    mac.verify_slice(&hash)
        .ok()
        .map(|_| AuthorizationLevel::Member(token.member_id))
}

/// Resolves the caller of `request`, using the [`ApiToken`] registered as app data.
pub fn authorize(request: &HttpRequest) -> Result<AuthorizationLevel, AppError> {
    let api_token = request
        .app_data::<web::Data<ApiToken>>()
        .ok_or(AppError::Unauthorized)?;
    check_authorization_level(request, &api_token.0).ok_or(AppError::Unauthorized)
}

/// A member token to be sent back verbatim in the `Authorization` header.
pub fn sign_member_token(member_id: &str, issued_at: &str, api_token: &str) -> Option<String> {
    let hash = keyed_mac(member_id, issued_at, api_token)?
        .finalize()
        .into_bytes()
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect::<String>();
    serde_json::to_string(&MemberToken {
        member_id: member_id.to_string(),
        issued_at: issued_at.to_string(),
        hash,
    })
    .ok()
}

fn keyed_mac(member_id: &str, issued_at: &str, api_token: &str) -> Option<HmacSha256> {
    let hash_content = [("issued_at", issued_at), ("member_id", member_id)]
        .iter()
        .map(|(key, val)| format!("{}={}", key, val))
        .collect::<Vec<_>>()
        .join("\n");
    let mut sha256_hasher = Sha256::new();
    sha256_hasher.update(api_token.as_bytes());
    let secret_hash = sha256_hasher.finalize();

    let mut hmac_hasher = HmacSha256::new_from_slice(&secret_hash).ok()?;
    hmac_hasher.update(hash_content.as_bytes());
    Some(hmac_hasher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::AUTHORIZATION;
    use actix_web::test::TestRequest;

    const SECRET: &str = "bot-secret";

    fn request_with(authorization: &str) -> HttpRequest {
        TestRequest::default()
            .insert_header((AUTHORIZATION, authorization))
            .to_http_request()
    }

    #[test]
    fn service_token_is_recognised() {
        let request = request_with(SECRET);
        assert_eq!(
            check_authorization_level(&request, SECRET),
            Some(AuthorizationLevel::Service)
        );
    }

    #[test]
    fn signed_member_token_round_trips() {
        let token = sign_member_token("ana", "2025-11-25T12:00:00Z", SECRET).unwrap();
        let request = request_with(&token);
        assert_eq!(
            check_authorization_level(&request, SECRET),
            Some(AuthorizationLevel::Member("ana".to_string()))
        );
    }

    #[test]
    fn tampered_member_token_is_rejected() {
        let token = sign_member_token("ana", "2025-11-25T12:00:00Z", SECRET).unwrap();
        let forged = token.replace("\"ana\"", "\"bob\"");
        assert_eq!(check_authorization_level(&request_with(&forged), SECRET), None);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = sign_member_token("ana", "2025-11-25T12:00:00Z", "other").unwrap();
        assert_eq!(check_authorization_level(&request_with(&token), SECRET), None);
    }

    #[test]
    fn garbage_and_missing_headers_are_rejected() {
        assert_eq!(check_authorization_level(&request_with("nope"), SECRET), None);
        let bare = TestRequest::default().to_http_request();
        assert_eq!(check_authorization_level(&bare, SECRET), None);
    }

    #[test]
    fn members_act_only_for_themselves() {
        let member = AuthorizationLevel::Member("ana".to_string());
        assert!(member.may_act_for("ana"));
        assert!(!member.may_act_for("bob"));
        assert!(AuthorizationLevel::Service.may_act_for("bob"));
    }

    #[test]
    fn authorize_requires_registered_token() {
        let request = TestRequest::default()
            .insert_header((AUTHORIZATION, SECRET))
            .app_data(web::Data::new(ApiToken(SECRET.to_string())))
            .to_http_request();
        assert_eq!(authorize(&request).unwrap(), AuthorizationLevel::Service);

        let unconfigured = request_with(SECRET);
        assert!(matches!(authorize(&unconfigured), Err(AppError::Unauthorized)));
    }
}
