use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::{AppError, Result};
use crate::models::connect::ConnectRequest;

/// Caller input after trimming and normalisation.
pub struct Credentials {
    /// Upper-cased client code.
    pub client_code: String,
    pub pin: Zeroizing<String>,
}

/// Validates a connect request.
///
/// # Arguments
///
/// * `request` - The parsed request body.
///
/// # Returns
///
/// The trimmed credentials, or a validation error if either field is blank.
pub fn validate_connect_request(request: ConnectRequest) -> Result<Credentials> {
    let client_code = request.clientcode.trim().to_uppercase();
    let pin = Zeroizing::new(request.pin.trim().to_string());

    if client_code.is_empty() || pin.is_empty() {
        return Err(AppError::Validation(
            "Clientcode and PIN are required.".to_string(),
        ));
    }

    Ok(Credentials { client_code, pin })
}

/// Checks the presented PIN against the configured dashboard PIN in constant time.
pub fn verify_dashboard_pin(presented: &str, expected: Option<&str>) -> Result<()> {
    let matches = match expected {
        Some(expected) if !expected.is_empty() => {
            bool::from(presented.as_bytes().ct_eq(expected.as_bytes()))
        }
        _ => false,
    };

    if !matches {
        return Err(AppError::Auth("Invalid dashboard PIN.".to_string()));
    }

    Ok(())
}
