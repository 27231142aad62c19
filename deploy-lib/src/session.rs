use color_eyre::eyre::{Error, Result, WrapErr, eyre};
use deploy_traits::Terminate;
use poise::serenity_prelude as serenity;
use std::{sync::Arc, time::Duration};
use tokio::{sync::oneshot, task::JoinHandle};

/// A logged in discord client, running on a background task.
pub struct Session {
    pub http: Arc<serenity::Http>,
    pub application_id: serenity::ApplicationId,
    shard_manager: Arc<serenity::ShardManager>,
    runner: JoinHandle<Result<()>>,
}

impl Session {
    /// Logs in and waits until discord reports the session as ready.
    pub async fn connect(token: &str) -> Result<Session> {
        let (ready_tx, ready_rx) = oneshot::channel::<serenity::Ready>();

        // no commands are served, the framework is only here to report the first ready
        let framework = poise::Framework::<(), Error>::builder()
            .options(poise::FrameworkOptions::default())
            .setup(move |_ctx, ready, _framework| {
                let ready = ready.clone();

                Box::pin(async move {
                    ready_tx.send(ready).ok();
                    Ok(())
                })
            })
            .build();

        let mut client = serenity::ClientBuilder::new(
            token,
            serenity::GatewayIntents::DIRECT_MESSAGES
                | serenity::GatewayIntents::DIRECT_MESSAGE_REACTIONS
                | serenity::GatewayIntents::GUILD_MESSAGES
                | serenity::GatewayIntents::GUILD_MESSAGE_REACTIONS,
        )
        .framework(framework)
        .await
        .wrap_err("Failed to create discord client")?;

        let http = Arc::clone(&client.http);
        let shard_manager = Arc::clone(&client.shard_manager);
        let mut runner = tokio::spawn(async move {
            client.start().await.wrap_err("Discord client stopped")
        });

        tracing::info!("Logging in");

        let ready = tokio::select! {
            ready = ready_rx => ready.wrap_err("Client dropped before becoming ready")?,
            stopped = &mut runner => {
                return Err(match stopped {
                    Ok(Ok(())) => eyre!("Client stopped before becoming ready"),
                    Ok(Err(e)) => e.wrap_err("Failed to start discord client"),
                    Err(e) => eyre!(e).wrap_err("Discord client task panicked"),
                });
            }
        };

        http.set_application_id(ready.application.id);

        tracing::info!(
            "Logged in as {} (application {})",
            ready.user.name,
            ready.application.id
        );

        Ok(Session {
            http,
            application_id: ready.application.id,
            shard_manager,
            runner,
        })
    }
}

impl Terminate for Session {
    async fn terminate(self) {
        tracing::info!("Closing connection");

        self.shard_manager.shutdown_all().await;

        match self.runner.await {
            Ok(Ok(())) => tracing::info!("Connection closed"),
            Ok(Err(e)) => tracing::error!("Client stopped with an error: {:?}", e),
            Err(e) => tracing::error!("Client task failed: {:?}", e),
        }
    }
}

/// Gives in flight requests `delay` to settle, then releases the session.
pub async fn terminate_after(session: impl Terminate, delay: Duration) {
    tokio::time::sleep(delay).await;
    session.terminate().await;
}
