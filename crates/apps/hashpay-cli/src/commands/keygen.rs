//! Generate signing key command.

use hashpay_crypto::{address_from_private_key, generate_identity, private_key_from_seed};

use crate::error::CliResult;
use crate::output::{KeygenOutput, OutputFormat, Render};

/// Execute the keygen command.
pub fn keygen(seed: Option<&str>, format: OutputFormat) -> CliResult<String> {
    let (private_key, address, deterministic) = match seed {
        Some(seed) => {
            let key = private_key_from_seed(seed.as_bytes())?;
            let address = address_from_private_key(&key)?;
            (key, address, true)
        }
        None => {
            let (key, address) = generate_identity();
            (key, address, false)
        }
    };

    let output = KeygenOutput {
        address: address.to_string(),
        private_key: hex::encode(private_key.as_bytes()),
        deterministic,
    };
    Ok(output.render(format))
}
