use crate::registry::{CommandRegistry, RegisteredCommand};
use color_eyre::eyre::{Result, WrapErr};
use poise::serenity_prelude::{CommandId, GuildId, RoleId};
use serde::Serialize;
use serde_with::{DisplayFromStr, serde_as};

/// The one command everybody may use, regardless of role.
pub const UNRESTRICTED_COMMAND: &str = "apply";

/// Where command permissions get applied, and to whom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionTarget {
    pub guild: GuildId,
    pub role: RoleId,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(into = "u8")]
pub enum OverwriteKind {
    Role,
    User,
    Channel,
}

impl From<OverwriteKind> for u8 {
    fn from(kind: OverwriteKind) -> u8 {
        match kind {
            OverwriteKind::Role => 1,
            OverwriteKind::User => 2,
            OverwriteKind::Channel => 3,
        }
    }
}

#[serde_as]
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PermissionOverwrite {
    #[serde_as(as = "DisplayFromStr")]
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: OverwriteKind,
    /// `true` allows, `false` denies.
    pub permission: bool,
}

impl PermissionOverwrite {
    pub fn allow_role(role: RoleId) -> PermissionOverwrite {
        PermissionOverwrite {
            id: role.get(),
            kind: OverwriteKind::Role,
            permission: true,
        }
    }
}

/// The overwrites of a single command within a guild.
#[serde_as]
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CommandPermissions {
    #[serde_as(as = "DisplayFromStr")]
    pub id: CommandId,
    pub permissions: Vec<PermissionOverwrite>,
}

/// Grants `role` access to every command except [`UNRESTRICTED_COMMAND`].
pub fn build_overwrites(commands: &[RegisteredCommand], role: RoleId) -> Vec<CommandPermissions> {
    commands
        .iter()
        .filter(|command| command.name != UNRESTRICTED_COMMAND)
        .map(|command| CommandPermissions {
            id: command.id,
            permissions: vec![PermissionOverwrite::allow_role(role)],
        })
        .collect()
}

/// Applies the role restrictions to the configured guild, or skips with a warning if there is none.
pub async fn sync_permissions(
    registry: &impl CommandRegistry,
    target: Option<PermissionTarget>,
) -> Result<()> {
    let Some(PermissionTarget { guild, role }) = target else {
        tracing::warn!("GUILD_ID and/or ROLE_ID env vars not found. Skipping command permissions!");
        return Ok(());
    };

    tracing::info!("Setting command permissions.");

    let commands = registry
        .global_commands()
        .await
        .wrap_err("Failed to fetch registered commands")?;
    let permissions = build_overwrites(&commands, role);

    registry
        .put_guild_permissions(guild, &permissions)
        .await
        .wrap_err("Failed to set command permissions")?;

    tracing::info!(
        "Granted role {} access to {} of {} commands in guild {}",
        role,
        permissions.len(),
        commands.len(),
        guild
    );

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::registry::test::{Call, MockRegistry};
    use serde_json::json;

    fn guild() -> GuildId {
        GuildId::new(10)
    }

    fn role() -> RoleId {
        RoleId::new(20)
    }

    #[test]
    fn excludes_apply() {
        let registry = MockRegistry::with_commands(&["status", "apply", "kick", "ban"]);
        let commands = registry.commands.lock().clone();

        let overwrites = build_overwrites(&commands, role());

        assert_eq!(overwrites.len(), 3);
        let apply = commands.iter().find(|command| command.name == "apply").unwrap();
        assert!(overwrites.iter().all(|overwrite| overwrite.id != apply.id));
        assert!(
            overwrites
                .iter()
                .all(|overwrite| overwrite.permissions == vec![PermissionOverwrite::allow_role(role())])
        );
    }

    #[test]
    fn no_apply_excludes_nothing() {
        let registry = MockRegistry::with_commands(&["status", "kick"]);
        let commands = registry.commands.lock().clone();

        assert_eq!(build_overwrites(&commands, role()).len(), 2);
    }

    #[test]
    fn wire_format() {
        let overwrites = build_overwrites(
            &[RegisteredCommand {
                id: CommandId::new(123456789012345678),
                name: "status".to_owned(),
            }],
            RoleId::new(876543210987654321),
        );

        assert_eq!(
            serde_json::to_value(&overwrites).unwrap(),
            json!([{
                "id": "123456789012345678",
                "permissions": [{ "id": "876543210987654321", "type": 1, "permission": true }]
            }])
        );
    }

    #[tokio::test]
    async fn skipped_without_target() {
        let registry = MockRegistry::with_commands(&["status", "apply"]);

        sync_permissions(&registry, None).await.unwrap();

        assert!(registry.calls().is_empty());
    }

    #[tokio::test]
    async fn single_bulk_call_for_the_guild() {
        let registry = MockRegistry::with_commands(&["apply", "status", "kick"]);
        let commands = registry.commands.lock().clone();

        sync_permissions(&registry, Some(PermissionTarget { guild: guild(), role: role() }))
            .await
            .unwrap();

        assert_eq!(
            registry.calls(),
            vec![
                Call::List,
                Call::GuildPermissions(guild(), build_overwrites(&commands, role())),
            ]
        );
    }
}
