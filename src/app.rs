use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;
use crate::services::{Authorizer, PocketClient};
use crate::store::Store;
use crate::sync::{BulkSettings, Reconciler, SyncReport};

/// Wires the configured services together for the CLI actions.
pub struct App {
    pub config: Config,
    config_path: PathBuf,
}

impl App {
    pub fn new(config: Config, config_path: PathBuf) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// Runs the OAuth flow and saves the access token to the config file.
    pub async fn authorize(&mut self) -> Result<()> {
        let consumer_key = self.config.require_consumer_key()?.to_string();
        let authorizer = Authorizer::new(
            &self.config.api_base_url,
            consumer_key,
            self.config.redirect_uri.clone(),
        )?;

        let credentials = authorizer.authorize_interactive().await?;
        match &credentials.username {
            Some(user) => println!("Authorized as {user}"),
            None => println!("Authorized"),
        }

        self.config.access_token = Some(credentials.access_token);
        self.config.save_to(&self.config_path)?;
        tracing::info!("Saved access token to {:?}", self.config_path);
        Ok(())
    }

    /// Brings the local mirror up to date. Fails before touching the data
    /// directory when no access token is configured.
    pub async fn sync(&self) -> Result<SyncReport> {
        let client = PocketClient::new(self.config.client_settings())?;
        let store = Store::new(self.config.store_settings());
        let reconciler = Reconciler::new(client, store, BulkSettings::default());

        Ok(reconciler.run().await?)
    }
}
