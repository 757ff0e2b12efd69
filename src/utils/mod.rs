pub mod ip;
pub mod url_validator;

/// base62 字母表（slug 与随机标识共用）
pub const BASE62_ALPHABET: &[u8; 62] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Render `value` in base62, least significant digit first.
pub fn push_base62(mut value: u64, out: &mut String, max_digits: usize) {
    for _ in 0..max_digits {
        out.push(BASE62_ALPHABET[(value % 62) as usize] as char);
        value /= 62;
    }
}
