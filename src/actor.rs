//! Acting-user identity management.
//!
//! Resolution order:
//! 1) CLI --user (explicit)
//! 2) HUDDLE_USER environment variable
//! 3) Persisted value in `<data-dir>/user`
//! 4) Config default (user.default) or "unknown"
//!
//! The identity is opaque: authentication happens upstream, and the core
//! only requires a non-empty identifier.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::storage::Storage;

/// Resolve the acting user using CLI, environment, persisted value, and config.
pub fn resolve_user(storage: &Storage, cli_user: Option<&str>) -> Result<String> {
    if let Some(user) = non_empty(cli_user) {
        return Ok(user.to_string());
    }

    if let Ok(env_user) = std::env::var("HUDDLE_USER") {
        if let Some(user) = non_empty(Some(env_user.as_str())) {
            return Ok(user.to_string());
        }
    }

    if let Some(user) = storage.read_user() {
        return Ok(user);
    }

    let config = Config::load_from_data_dir(storage.data_root());
    Ok(config.user.default)
}

/// Persist the acting-user identity in `<data-dir>/user`.
pub fn persist_user(storage: &Storage, user: &str) -> Result<()> {
    let user = non_empty(Some(user))
        .ok_or_else(|| Error::InvalidArgument("user identity cannot be empty".to_string()))?;
    storage.write_user(user)
}

fn non_empty(input: Option<&str>) -> Option<&str> {
    input.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_user_wins() {
        let temp = TempDir::new().unwrap();
        let storage = Storage::new(temp.path().to_path_buf());
        storage.write_user("persisted").unwrap();

        let user = resolve_user(&storage, Some("explicit")).unwrap();
        assert_eq!(user, "explicit");
    }

    #[test]
    fn persisted_user_beats_config_default() {
        let temp = TempDir::new().unwrap();
        let storage = Storage::new(temp.path().to_path_buf());
        storage.write_user("persisted").unwrap();

        let user = resolve_user(&storage, None).unwrap();
        assert_eq!(user, "persisted");
    }

    #[test]
    fn falls_back_to_config_default() {
        let temp = TempDir::new().unwrap();
        let storage = Storage::new(temp.path().to_path_buf());

        let user = resolve_user(&storage, None).unwrap();
        assert_eq!(user, "unknown");
    }

    #[test]
    fn empty_user_cannot_be_persisted() {
        let temp = TempDir::new().unwrap();
        let storage = Storage::new(temp.path().to_path_buf());

        let err = persist_user(&storage, "   ").expect_err("empty user");
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
