//! Session token inspection.

use std::sync::Arc;

use libris_portal::services::TokenCodec;
use libris_portal::store::CredentialStore;

use super::{CommandError, emit};

/// Decode a token's claims and check it against the demo accounts.
pub fn decode(token: &str) -> Result<(), CommandError> {
    let claims = TokenCodec::inspect(token)?;
    emit("Claims", &claims)?;

    let codec = TokenCodec::new(Arc::new(CredentialStore::with_demo_accounts()));
    match codec.decode(token) {
        Ok(identity) => tracing::info!("Valid session for {} <{}>", identity.name, identity.email),
        Err(err) => tracing::warn!("Token would be discarded: {err}"),
    }
    Ok(())
}
