//! Request integrity signing.
//!
//! The upstream verifies a digest over the exact request body, the account's
//! integrity key and a salt baked into its web app. Any byte difference in
//! the body produces a different tag, which is why the canonical
//! serialization in [`bc_wire::OperationRequest`] must never change shape.

use sha2::{Digest, Sha256};

use bc_domain::Result;
use bc_wire::OperationRequest;

/// Salt constant lifted from the upstream web bundle. Rotated upstream only
/// alongside a catalog refresh.
const TAG_SALT: &str = "Wq19xTf4EhLumZbKo";

/// A canonical request body and the integrity tag covering it. The body must
/// be sent byte-for-byte as signed.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub body: String,
    pub tag: String,
}

/// Signs one operation request with the account's integrity key.
pub fn sign(request: &OperationRequest, integrity_key: &str) -> Result<SignedRequest> {
    let body = request.canonical_body()?;
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    hasher.update(integrity_key.as_bytes());
    hasher.update(TAG_SALT.as_bytes());
    let tag = hex::encode(hasher.finalize());
    Ok(SignedRequest { body, tag })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
