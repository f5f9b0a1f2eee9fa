//! Size limits for SEP101 keys and values.

use crate::error::SepError;

/// Maximum SEP101 key length in bytes.
pub const MAX_KEY_LEN: usize = 256;

/// Maximum SEP101 value length in bytes (24 KiB).
pub const MAX_VALUE_LEN: usize = 24 * 1024;

/// Rejects empty keys and keys longer than [`MAX_KEY_LEN`].
pub const fn check_key(key: &[u8]) -> Result<(), SepError> {
    if key.is_empty() {
        return Err(SepError::KeyEmpty);
    }
    if key.len() > MAX_KEY_LEN {
        return Err(SepError::KeyTooLarge {
            len: key.len(),
            max: MAX_KEY_LEN,
        });
    }
    Ok(())
}

/// Rejects values longer than [`MAX_VALUE_LEN`]. An empty value is valid and
/// means deletion.
pub const fn check_value(value: &[u8]) -> Result<(), SepError> {
    if value.len() > MAX_VALUE_LEN {
        return Err(SepError::ValueTooLarge {
            len: value.len(),
            max: MAX_VALUE_LEN,
        });
    }
    Ok(())
}
