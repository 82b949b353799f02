use crate::config::ProtocolConfig;

use super::game_codes::CODE_ALPHABET;

/// Validate a team name and return its canonical (trimmed) form.
///
/// Team names are any Unicode, trimmed of leading/trailing whitespace,
/// preserved byte-for-byte after that. The character budget counts
/// `char`s, not bytes, so multi-byte names are not penalized.
pub fn validate_team_name_with_config(
    name: &str,
    config: &ProtocolConfig,
) -> Result<String, String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Team name cannot be empty".to_string());
    }

    let chars = trimmed.chars().count();
    if chars > config.max_team_name_chars {
        return Err(format!(
            "Team name too long (max {} characters)",
            config.max_team_name_chars
        ));
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err("Team name cannot contain control characters".to_string());
    }

    Ok(trimmed.to_string())
}

/// Validate a canonicalized game code.
pub fn validate_game_code_with_config(code: &str, config: &ProtocolConfig) -> Result<(), String> {
    if code.is_empty() {
        return Err("Game code cannot be empty".to_string());
    }
    if code.len() != config.game_code_length {
        return Err(format!(
            "Game code must be exactly {} characters",
            config.game_code_length
        ));
    }
    if !code.bytes().all(|b| CODE_ALPHABET.contains(&b)) {
        return Err("Game code contains characters outside the code alphabet".to_string());
    }
    Ok(())
}

/// Validate the configured number of rounds for a new game.
pub fn validate_max_rounds_with_config(max_rounds: u32, config: &ProtocolConfig) -> Result<(), String> {
    if max_rounds < 1 {
        return Err("A game needs at least 1 round".to_string());
    }
    if max_rounds > config.max_rounds_limit {
        return Err(format!(
            "Max rounds cannot exceed {}",
            config.max_rounds_limit
        ));
    }
    Ok(())
}

/// Validate the genre filter for a new game.
///
/// An empty list is allowed and means "no genre filter".
pub fn validate_genres_with_config(genres: &[String], config: &ProtocolConfig) -> Result<(), String> {
    if genres.len() > config.max_genres {
        return Err(format!("Too many genres (max {})", config.max_genres));
    }
    if genres.iter().any(|g| g.trim().is_empty()) {
        return Err("Genres cannot be blank".to_string());
    }
    Ok(())
}

/// Validate a team name using the default protocol configuration.
#[allow(dead_code)]
pub fn validate_team_name(name: &str) -> Result<String, String> {
    let cfg = ProtocolConfig::default();
    validate_team_name_with_config(name, &cfg)
}
