use std::time::Duration;

use travelmap_shared::MAX_LEADERBOARD_LIMIT;

pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_LEADERBOARD_CACHE_TTL_SECS: u64 = 15;
pub const MAX_USER_ID_LEN: usize = 128;
pub const MAX_DISPLAY_NAME_LEN: usize = 80;
pub const MAX_AVATAR_URL_LEN: usize = 2048;

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
}

pub fn database_url() -> Option<String> {
    std::env::var("DATABASE_URL")
        .ok()
        .filter(|value| !value.trim().is_empty())
}

pub fn db_max_connections() -> u32 {
    env_parsed::<u32>("DB_MAX_CONNECTIONS")
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
}

pub fn server_port() -> u16 {
    env_parsed::<u16>("SERVER_PORT")
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_SERVER_PORT)
}

/// Zero disables leaderboard caching.
pub fn leaderboard_cache_ttl() -> Duration {
    Duration::from_secs(
        env_parsed::<u64>("LEADERBOARD_CACHE_TTL_SECS").unwrap_or(DEFAULT_LEADERBOARD_CACHE_TTL_SECS),
    )
}

pub fn leaderboard_max_limit() -> u32 {
    env_parsed::<u32>("LEADERBOARD_MAX_LIMIT")
        .filter(|value| *value > 0)
        .map(|value| value.min(MAX_LEADERBOARD_LIMIT))
        .unwrap_or(MAX_LEADERBOARD_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        temp_env::with_vars_unset(
            [
                "DB_MAX_CONNECTIONS",
                "SERVER_PORT",
                "LEADERBOARD_CACHE_TTL_SECS",
                "LEADERBOARD_MAX_LIMIT",
            ],
            || {
                assert_eq!(db_max_connections(), DEFAULT_DB_MAX_CONNECTIONS);
                assert_eq!(server_port(), DEFAULT_SERVER_PORT);
                assert_eq!(
                    leaderboard_cache_ttl(),
                    Duration::from_secs(DEFAULT_LEADERBOARD_CACHE_TTL_SECS)
                );
                assert_eq!(leaderboard_max_limit(), MAX_LEADERBOARD_LIMIT);
            },
        );
    }

    #[test]
    fn env_overrides_are_parsed() {
        temp_env::with_vars(
            [
                ("DB_MAX_CONNECTIONS", Some("4")),
                ("SERVER_PORT", Some(" 8080 ")),
                ("LEADERBOARD_CACHE_TTL_SECS", Some("0")),
                ("LEADERBOARD_MAX_LIMIT", Some("25")),
            ],
            || {
                assert_eq!(db_max_connections(), 4);
                assert_eq!(server_port(), 8080);
                assert_eq!(leaderboard_cache_ttl(), Duration::ZERO);
                assert_eq!(leaderboard_max_limit(), 25);
            },
        );
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        temp_env::with_vars(
            [
                ("DB_MAX_CONNECTIONS", Some("0")),
                ("SERVER_PORT", Some("not-a-port")),
                ("LEADERBOARD_MAX_LIMIT", Some("100000")),
            ],
            || {
                assert_eq!(db_max_connections(), DEFAULT_DB_MAX_CONNECTIONS);
                assert_eq!(server_port(), DEFAULT_SERVER_PORT);
                assert_eq!(leaderboard_max_limit(), MAX_LEADERBOARD_LIMIT);
            },
        );
    }

    #[test]
    fn blank_database_url_is_ignored() {
        temp_env::with_var("DATABASE_URL", Some("  "), || {
            assert_eq!(database_url(), None);
        });
    }
}
