use chrono::{DateTime, Utc};
use ethers::types::{Address, Signature};

use crate::error::{AppError, Result};

const SECONDS_PER_DAY: i64 = 86_400;

/// The login message a wallet signs to authenticate a request. Embeds a
/// coarse daily nonce so captured signatures expire without the server
/// keeping per-player state.
pub fn login_message(address: &Address, now: DateTime<Utc>) -> String {
    let nonce = now.timestamp() / SECONDS_PER_DAY;
    format!(
        "Welcome to Sunseed Farm!\n\n\
         Click to sign in and accept the Sunseed Terms of Service.\n\n\
         This request will not trigger a blockchain transaction or cost any gas fees.\n\n\
         Wallet address:\n{:?}\n\nNonce: {}",
        address, nonce
    )
}

/// Recovers the signer of the expected login message and checks it against
/// the claimed address. The inverse of the settlement path: this verifies
/// inbound requests, it never produces outbound signatures.
pub fn verify_account(address: &str, signature: &str, now: DateTime<Utc>) -> Result<Address> {
    let expected: Address = address
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid wallet address: {address}")))?;
    let signature: Signature = signature
        .parse()
        .map_err(|_| AppError::UnableToVerifyAccount)?;

    let message = login_message(&expected, now);
    let recovered = signature
        .recover(message.as_str())
        .map_err(|_| AppError::UnableToVerifyAccount)?;

    if recovered != expected {
        tracing::warn!("Signature recovery mismatch for {}", address);
        return Err(AppError::UnableToVerifyAccount);
    }
    Ok(recovered)
}
