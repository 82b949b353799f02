use crate::config::ProtocolConfig;
use rand::RngExt;

/// Alphabet for game codes, avoiding confusable characters (0, O, I, 1).
/// Codes are read out loud and typed on phones; every glyph must survive that.
pub const CODE_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Generate a game code with the configured length
pub fn generate_game_code_with_config(config: &ProtocolConfig) -> String {
    generate_game_code_of_length(config.game_code_length)
}

/// Generate a game code of the requested length.
pub fn generate_game_code_of_length(length: usize) -> String {
    if length == 0 {
        return String::new();
    }
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CODE_ALPHABET.len());
            // SAFETY: `idx` is produced by `random_range(0..len)`, so it is
            // always within [0, len).
            #[allow(clippy::indexing_slicing)]
            let ch = CODE_ALPHABET[idx] as char;
            ch
        })
        .collect()
}

/// Canonicalize a game code received on the wire.
///
/// Codes are case-insensitive on the wire and stored uppercase internally.
pub fn canonicalize(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Generate a game code using the default protocol configuration.
pub fn generate_game_code() -> String {
    let cfg = ProtocolConfig::default();
    generate_game_code_with_config(&cfg)
}
