//! Invite token issuer
//!
//! Invite tokens are compact HS256 JWTs. The claims identify the link being
//! offered (kind, initiator, counterpart) and carry the role the counterpart
//! must hold to redeem it. Only base64url without padding is produced or
//! accepted.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::core::actor::Role;
use crate::core::invite::LinkKind;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid invitation token: {0}")]
    Malformed(String),

    #[error("Invalid invitation token: unsupported header")]
    UnsupportedHeader,

    #[error("Invalid invitation token: signature mismatch")]
    BadSignature,

    #[error("Invitation token has expired")]
    Expired,

    #[error("Invitation secret is not usable: {0}")]
    InvalidKey(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct JwtHeader {
    alg: String,
    typ: String,
}

/// Payload embedded in an invite token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteClaims {
    /// Invited account
    pub sub: i64,
    /// Role the invited account must hold
    pub role: Role,
    pub kind: LinkKind,
    pub applicator_id: i64,
    pub iat: i64,
    pub exp: i64,
    /// Unique per issuance so a resend always yields a new token
    pub jti: String,
}

impl InviteClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Signs and verifies invite tokens with a shared secret
#[derive(Clone)]
pub struct InviteTokenIssuer {
    secret: Vec<u8>,
}

impl std::fmt::Debug for InviteTokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InviteTokenIssuer").finish_non_exhaustive()
    }
}

impl InviteTokenIssuer {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Issue a token for `counterpart_id` valid for `ttl` from `now`
    pub fn issue(
        &self,
        kind: LinkKind,
        applicator_id: i64,
        counterpart_id: i64,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<(String, DateTime<Utc>), TokenError> {
        let expires_at = now + ttl;
        let claims = InviteClaims {
            sub: counterpart_id,
            role: kind.counterpart_role(),
            kind,
            applicator_id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: ulid::Ulid::new().to_string(),
        };
        Ok((self.sign(&claims)?, expires_at))
    }

    /// Encode claims as an HS256-signed JWT
    pub fn sign(&self, claims: &InviteClaims) -> Result<String, TokenError> {
        let header = JwtHeader {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        };

        let header_json =
            serde_json::to_vec(&header).map_err(|e| TokenError::Malformed(e.to_string()))?;
        let claims_json =
            serde_json::to_vec(claims).map_err(|e| TokenError::Malformed(e.to_string()))?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header_json),
            URL_SAFE_NO_PAD.encode(claims_json)
        );
        let signature = self.mac(signing_input.as_bytes())?.finalize().into_bytes();

        Ok(format!(
            "{}.{}",
            signing_input,
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    /// Verify signature and expiry against the current time
    pub fn verify(&self, token: &str) -> Result<InviteClaims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify signature and expiry against `now`
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<InviteClaims, TokenError> {
        let token = token.trim();
        let parts: Vec<&str> = token.split('.').collect();
        let [header_b64, payload_b64, sig_b64] = parts.as_slice() else {
            return Err(TokenError::Malformed("expected three segments".to_string()));
        };

        let header: JwtHeader = serde_json::from_slice(&decode_segment(header_b64)?)
            .map_err(|e| TokenError::Malformed(e.to_string()))?;
        if header.alg != "HS256" || !header.typ.eq_ignore_ascii_case("JWT") {
            return Err(TokenError::UnsupportedHeader);
        }

        let signing_input = format!("{}.{}", header_b64, payload_b64);
        let signature = decode_segment(sig_b64)?;
        self.mac(signing_input.as_bytes())?
            .verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let claims: InviteClaims = serde_json::from_slice(&decode_segment(payload_b64)?)
            .map_err(|e| TokenError::Malformed(e.to_string()))?;

        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn mac(&self, input: &[u8]) -> Result<Hmac<Sha256>, TokenError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.secret)
            .map_err(|e| TokenError::InvalidKey(e.to_string()))?;
        mac.update(input);
        Ok(mac)
    }
}

fn decode_segment(segment: &str) -> Result<Vec<u8>, TokenError> {
    URL_SAFE_NO_PAD
        .decode(segment.as_bytes())
        .map_err(|e| TokenError::Malformed(e.to_string()))
}
