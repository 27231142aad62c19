use crate::permissions::PermissionTarget;
use color_eyre::eyre::{OptionExt, Result, WrapErr, ensure};
use poise::serenity_prelude::{GuildId, RoleId};

pub const TOKEN_VAR: &str = "DISCORD_TOKEN";
pub const GUILD_VAR: &str = "GUILD_ID";
pub const ROLE_VAR: &str = "ROLE_ID";

/// Everything the deploy run reads from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub token: String,
    /// The guild whose command permissions get overwritten.
    pub guild_id: Option<GuildId>,
    /// The role that is granted access to the restricted commands.
    pub role_id: Option<RoleId>,
}

impl Config {
    pub fn from_env() -> Result<Config> {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config out of any key/value source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let token = lookup(TOKEN_VAR).ok_or_eyre("DISCORD_TOKEN environment variable not found")?;
        let guild_id = lookup(GUILD_VAR)
            .map(|id| parse_id(GUILD_VAR, &id).map(GuildId::new))
            .transpose()?;
        let role_id = lookup(ROLE_VAR)
            .map(|id| parse_id(ROLE_VAR, &id).map(RoleId::new))
            .transpose()?;

        Ok(Config {
            token,
            guild_id,
            role_id,
        })
    }

    /// Only available when both the guild and the role are configured.
    pub fn permission_target(&self) -> Option<PermissionTarget> {
        Some(PermissionTarget {
            guild: self.guild_id?,
            role: self.role_id?,
        })
    }
}

fn parse_id(key: &str, value: &str) -> Result<u64> {
    let id = value
        .trim()
        .parse::<u64>()
        .wrap_err_with(|| format!("{} must be a discord id, got `{}`", key, value))?;

    // discord ids are never zero, and serenity panics on them
    ensure!(id != 0, "{} must not be 0", key);

    Ok(id)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn missing_token_is_fatal() {
        let err = config(&[("GUILD_ID", "1"), ("ROLE_ID", "2")]).unwrap_err();

        assert_eq!(err.to_string(), "DISCORD_TOKEN environment variable not found");
    }

    #[test]
    fn empty_token_is_fatal() {
        assert!(config(&[("DISCORD_TOKEN", "  ")]).is_err());
    }

    #[test]
    fn token_only() {
        let config = config(&[("DISCORD_TOKEN", "abc")]).unwrap();

        assert_eq!(config.token, "abc");
        assert_eq!(config.guild_id, None);
        assert_eq!(config.role_id, None);
        assert_eq!(config.permission_target(), None);
    }

    #[test]
    fn full_target() {
        let config = config(&[
            ("DISCORD_TOKEN", "abc"),
            ("GUILD_ID", "123456789012345678"),
            ("ROLE_ID", " 876543210987654321 "),
        ])
        .unwrap();

        assert_eq!(
            config.permission_target(),
            Some(PermissionTarget {
                guild: GuildId::new(123456789012345678),
                role: RoleId::new(876543210987654321),
            })
        );
    }

    #[test]
    fn half_target_is_skipped() {
        let guild_only = config(&[("DISCORD_TOKEN", "abc"), ("GUILD_ID", "1")]).unwrap();
        let role_only = config(&[("DISCORD_TOKEN", "abc"), ("ROLE_ID", "2")]).unwrap();
        let empty_role =
            config(&[("DISCORD_TOKEN", "abc"), ("GUILD_ID", "1"), ("ROLE_ID", "")]).unwrap();

        assert_eq!(guild_only.permission_target(), None);
        assert_eq!(role_only.permission_target(), None);
        assert_eq!(empty_role.permission_target(), None);
    }

    #[test]
    fn malformed_ids_are_fatal() {
        assert!(config(&[("DISCORD_TOKEN", "abc"), ("GUILD_ID", "general")]).is_err());
        assert!(config(&[("DISCORD_TOKEN", "abc"), ("ROLE_ID", "0")]).is_err());
    }
}
