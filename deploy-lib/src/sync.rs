use crate::{
    loader::CommandDescriptor,
    permissions::{PermissionTarget, sync_permissions},
    registry::{CommandRegistry, RegisteredCommand},
    session::terminate_after,
};
use color_eyre::eyre::{Result, WrapErr};
use deploy_traits::{ForwardRefToTracing, Terminate};
use itertools::Itertools;
use std::time::Duration;

/// Deletes every registered global command, then registers `descriptors` in one bulk call.
///
/// Stops at the first failed deletion. Deletions happen one at a time.
pub async fn replace_global_commands(
    registry: &impl CommandRegistry,
    descriptors: &[CommandDescriptor],
) -> Result<Vec<RegisteredCommand>> {
    tracing::info!("Removing old commands...");

    let old_commands = registry
        .global_commands()
        .await
        .wrap_err("Failed to fetch old commands")?;

    for command in &old_commands {
        tracing::info!("{} {}", command.id, command.name);

        registry
            .delete_global_command(command.id)
            .await
            .wrap_err_with(|| format!("Failed to remove old command `{}`", command.name))?;
    }

    tracing::info!("Ready! Registering commands...");

    let registered = registry
        .put_global_commands(descriptors)
        .await
        .wrap_err("Failed to register commands")?;

    tracing::info!(
        "Successfully registered application commands: {}",
        registered.iter().map(|command| &command.name).join(", ")
    );

    Ok(registered)
}

/// The full deploy: replace the global commands, then apply guild permissions if configured.
pub async fn deploy(
    registry: &impl CommandRegistry,
    descriptors: &[CommandDescriptor],
    target: Option<PermissionTarget>,
) -> Result<()> {
    replace_global_commands(registry, descriptors).await?;
    sync_permissions(registry, target).await?;

    tracing::info!("All done!");

    Ok(())
}

/// Deploys, logs a failure instead of returning it, then closes `session` after `delay` either way.
pub async fn deploy_then_terminate(
    registry: &impl CommandRegistry,
    descriptors: &[CommandDescriptor],
    target: Option<PermissionTarget>,
    session: impl Terminate,
    delay: Duration,
) {
    deploy(registry, descriptors, target).await.trace_err_ok();

    terminate_after(session, delay).await;
}
