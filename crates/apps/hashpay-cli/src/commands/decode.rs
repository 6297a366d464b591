//! Decode wire message command.

use hashpay_crypto::Address;
use hashpay_wire::{decode as decode_message, CodecError};

use crate::error::CliResult;
use crate::output::{DecodeOutput, OutputFormat, Render};

/// Execute the decode command.
///
/// With `expected_signer`, a message signed by anyone else is an error.
pub fn decode(input: &str, expected_signer: Option<&str>, format: OutputFormat) -> CliResult<String> {
    let hex_str = input.trim();
    let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    let bytes = hex::decode(hex_str)?;
    let message = decode_message(&bytes)?;

    let signer = message.recover_signer().ok();
    if let Some(expected) = expected_signer {
        let expected: Address = expected.parse()?;
        match signer {
            Some(got) if got == expected => {}
            Some(got) => return Err(CodecError::SignerMismatch { expected, got }.into()),
            None => {
                return Err(CodecError::SignerMismatch {
                    expected,
                    got: Address::ZERO,
                }
                .into())
            }
        }
    }

    let output = DecodeOutput {
        message_type: message.message_type().to_string(),
        size: bytes.len(),
        signer: signer.map(|address| address.to_string()),
        message: serde_json::to_value(&message)?,
    };
    Ok(output.render(format))
}
