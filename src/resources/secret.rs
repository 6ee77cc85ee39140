use rand::Rng;

/// Length of the generated root password
pub const ROOT_PASSWORD_LEN: usize = 32;

/// Generate a secure random password
///
/// Draws from a 62-symbol alphanumeric charset; at 32 characters this is
/// roughly 190 bits of entropy.
pub fn generate_password(len: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..len)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}
