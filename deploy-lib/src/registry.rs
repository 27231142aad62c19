use crate::{loader::CommandDescriptor, permissions::CommandPermissions, session::Session};
use color_eyre::eyre::{Result, WrapErr};
use poise::serenity_prelude::{ApplicationId, Command, CommandId, GuildId, Http};
use std::sync::Arc;

pub const API_BASE: &str = "https://discord.com/api/v10";

/// A command as the registry knows it, after discord assigned it an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredCommand {
    pub id: CommandId,
    pub name: String,
}

impl From<Command> for RegisteredCommand {
    fn from(command: Command) -> Self {
        RegisteredCommand {
            id: command.id,
            name: command.name,
        }
    }
}

/// The remote application command registry.
pub trait CommandRegistry {
    async fn global_commands(&self) -> Result<Vec<RegisteredCommand>>;

    async fn delete_global_command(&self, id: CommandId) -> Result<()>;

    /// Replaces the entire global command set with `commands`.
    async fn put_global_commands(
        &self,
        commands: &[CommandDescriptor],
    ) -> Result<Vec<RegisteredCommand>>;

    /// Replaces every command permission overwrite in `guild` with `permissions`.
    async fn put_guild_permissions(
        &self,
        guild: GuildId,
        permissions: &[CommandPermissions],
    ) -> Result<()>;
}

pub struct DiscordRegistry {
    http: Arc<Http>,
    rest: reqwest::Client,
    token: String,
    application_id: ApplicationId,
}

impl DiscordRegistry {
    pub fn new(session: &Session, token: impl Into<String>) -> DiscordRegistry {
        DiscordRegistry {
            http: Arc::clone(&session.http),
            rest: reqwest::Client::new(),
            token: token.into(),
            application_id: session.application_id,
        }
    }

    fn guild_permissions_url(&self, guild: GuildId) -> String {
        format!(
            "{}/applications/{}/guilds/{}/commands/permissions",
            API_BASE, self.application_id, guild
        )
    }
}

impl CommandRegistry for DiscordRegistry {
    async fn global_commands(&self) -> Result<Vec<RegisteredCommand>> {
        let commands = self
            .http
            .get_global_commands()
            .await
            .wrap_err("Failed to fetch global commands")?;

        Ok(commands.into_iter().map(RegisteredCommand::from).collect())
    }

    async fn delete_global_command(&self, id: CommandId) -> Result<()> {
        self.http
            .delete_global_command(id)
            .await
            .wrap_err_with(|| format!("Failed to delete global command {}", id))
    }

    async fn put_global_commands(
        &self,
        commands: &[CommandDescriptor],
    ) -> Result<Vec<RegisteredCommand>> {
        let commands = self
            .http
            .create_global_commands(&commands)
            .await
            .wrap_err("Failed to register global commands")?;

        Ok(commands.into_iter().map(RegisteredCommand::from).collect())
    }

    // serenity's Http only knows the per-command permissions route.
    // discord answers 403 here for bot tokens, which ends up logged by the caller like any other failure
    async fn put_guild_permissions(
        &self,
        guild: GuildId,
        permissions: &[CommandPermissions],
    ) -> Result<()> {
        self.rest
            .put(self.guild_permissions_url(guild))
            .header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.token))
            .json(permissions)
            .send()
            .await
            .wrap_err("Failed to reach discord for guild permissions")?
            .error_for_status()
            .wrap_err_with(|| format!("Discord rejected the command permissions for guild {}", guild))?;

        Ok(())
    }
}
