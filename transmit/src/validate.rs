//! Audio buffer acceptance check.

use crate::error::ValidationError;

/// Returns why `buffer` must not be encoded, if anything.
///
/// A buffer of the wrong length or one made entirely of zero bytes is
/// rejected. True digital silence is rejected along with a stuck input.
pub fn check_buffer(buffer: &[u8], expected_len: usize) -> Result<(), ValidationError> {
    if buffer.len() != expected_len {
        return Err(ValidationError::WrongLength {
            expected: expected_len,
            actual: buffer.len(),
        });
    }
    if buffer.iter().all(|&byte| byte == 0) {
        return Err(ValidationError::AllZero);
    }
    Ok(())
}

/// Returns `true` if `buffer` may be encoded.
#[must_use]
pub fn validate_buffer(buffer: &[u8], expected_len: usize) -> bool {
    check_buffer(buffer, expected_len).is_ok()
}
