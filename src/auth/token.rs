use rand::{rngs::OsRng, RngCore};

/// Number of random bytes behind each session token.
pub const TOKEN_BYTES: usize = 32;

/// Generates an opaque session token: 32 bytes from the OS CSPRNG,
/// hex-encoded into 64 characters.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
