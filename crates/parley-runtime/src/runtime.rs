//! Process orchestration for a single bot.
//!
//! [`BotRuntime`] ties the pieces together: it loads and validates
//! [`ParleyConfig`], installs logging, builds the [`BotHandler`] facade for
//! the plugin, runs its `initialize` hook and then drives the
//! [`EventDispatcher`] until the feed closes, a fatal error occurs, or the
//! process receives Ctrl+C / SIGTERM.
//!
//! ```rust,ignore
//! use parley_runtime::BotRuntime;
//!
//! let runtime = BotRuntime::builder(HELLOWORLD)
//!     .config_file("parley.toml")
//!     .build()?;
//! runtime.run().await?;
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parley_core::{BoxedClient, EventFeed};
use parley_framework::{BotHandler, ConfigProvider, EventDispatcher, PluginDescriptor};
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::conf_file::ConfFileProvider;
use crate::config::{ConfigLoader, ParleyConfig, validate_config};
use crate::error::RuntimeResult;
use crate::logging::LoggingBuilder;

/// Runs one bot plugin against a chat server.
pub struct BotRuntime {
    descriptor: PluginDescriptor,
    config: ParleyConfig,
    quiet: bool,
    shutdown: CancellationToken,
}

impl BotRuntime {
    /// Starts configuring a runtime for `descriptor`.
    pub fn builder(descriptor: PluginDescriptor) -> RuntimeBuilder {
        RuntimeBuilder::new(descriptor)
    }

    /// Creates a runtime from an already loaded configuration.
    ///
    /// Validates `config` and installs logging from its `[logging]` section.
    pub fn from_config(descriptor: PluginDescriptor, config: ParleyConfig) -> RuntimeResult<Self> {
        Self::from_parts(descriptor, config, false)
    }

    fn from_parts(
        descriptor: PluginDescriptor,
        config: ParleyConfig,
        quiet: bool,
    ) -> RuntimeResult<Self> {
        validate_config(&config)?;

        let mut logging = LoggingBuilder::from_config(&config.logging);
        if quiet {
            logging = logging.quiet();
        }
        // Already installed by the host or an earlier runtime.
        let _ = logging.try_init();

        debug!(bot = descriptor.name, source = %config.origin(), "Runtime configured");
        Ok(Self {
            descriptor,
            config,
            quiet,
            shutdown: CancellationToken::new(),
        })
    }

    /// The effective configuration.
    pub fn config(&self) -> &ParleyConfig {
        &self.config
    }

    /// The plugin being run.
    pub fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    /// Token that stops the dispatch loop between events when cancelled.
    ///
    /// Signals cancel it automatically while [`run`](Self::run) is active.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Connects to the configured server over REST and runs the bot.
    ///
    /// # Errors
    ///
    /// See [`run_with`](Self::run_with); additionally fails if the HTTP
    /// client cannot be created.
    #[cfg(feature = "rest-client")]
    pub async fn run(&self) -> RuntimeResult<()> {
        use parley_transport::{RestClient, RestClientConfig};

        let server = &self.config.server;
        let client_config =
            RestClientConfig::new(&server.site, &server.email, &server.api_key).client_name(
                self.descriptor.client_name(),
            );
        let client = Arc::new(RestClient::new(RestClientConfig {
            timeout: server.timeout(),
            poll_timeout: server.poll_timeout(),
            retry_delay: server.retry_delay(),
            ..client_config
        })?);

        let mut feed = client.event_queue();
        self.run_with(client, &mut feed).await
    }

    /// Runs the bot with the given client and event feed.
    ///
    /// # Errors
    ///
    /// - [`RuntimeError::Handler`](crate::RuntimeError::Handler) if the bot's
    ///   profile or storage cannot be loaded.
    /// - [`RuntimeError::Dispatch`](crate::RuntimeError::Dispatch) if
    ///   `initialize` fails, the feed fails, or the plugin hits a fatal error.
    pub async fn run_with<F>(&self, client: BoxedClient, feed: &mut F) -> RuntimeResult<()>
    where
        F: EventFeed + ?Sized,
    {
        let bot = &self.config.bot;
        let provider: Arc<dyn ConfigProvider> = match &bot.config_file {
            Some(path) => Arc::new(ConfFileProvider::file(path)),
            None => Arc::new(ConfFileProvider::directory(&bot.root_dir)),
        };

        let handler = BotHandler::builder(client, &bot.root_dir)
            .capabilities(self.descriptor.capabilities)
            .rate_limiter(self.config.rate_limit.to_limiter())
            .config_provider(provider)
            .build()
            .await?;
        info!(
            bot = self.descriptor.name,
            user_id = handler.user_id(),
            email = %handler.email(),
            root_dir = %handler.root_dir().display(),
            "Connected"
        );

        let mut dispatcher =
            EventDispatcher::new(self.descriptor.name, self.descriptor.instantiate(), handler);
        dispatcher.initialize().await?;

        if !self.quiet {
            for line in banner(&self.descriptor, dispatcher.usage()).lines() {
                info!("{line}");
            }
        }

        let listener = spawn_signal_listener(self.shutdown.clone());
        let result = dispatcher.run(feed, &self.shutdown).await;
        listener.abort();

        result?;
        info!(bot = self.descriptor.name, "Bot stopped");
        Ok(())
    }
}

impl std::fmt::Debug for BotRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotRuntime")
            .field("bot", &self.descriptor.name)
            .field("config", &self.config)
            .field("quiet", &self.quiet)
            .finish_non_exhaustive()
    }
}

/// Startup text: `Running <Name> Bot:`, the description, then the usage.
pub fn banner(descriptor: &PluginDescriptor, usage: &str) -> String {
    let mut text = format!("Running {} Bot:", descriptor.resolved_display_name());
    if !descriptor.description.is_empty() {
        text.push_str("\n\n");
        text.push_str(descriptor.description);
    }
    let usage = usage.trim();
    if !usage.is_empty() {
        text.push_str("\n\n");
        text.push_str(usage);
    }
    text
}

fn spawn_signal_listener(shutdown: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.cancel();
    })
}

/// Resolves on Ctrl+C or SIGTERM. A listener that cannot be installed never
/// resolves.
async fn wait_for_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to register SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`BotRuntime`].
pub struct RuntimeBuilder {
    descriptor: PluginDescriptor,
    loader: ConfigLoader,
    quiet: bool,
    root_dir: Option<PathBuf>,
    bot_config_file: Option<PathBuf>,
}

impl RuntimeBuilder {
    fn new(descriptor: PluginDescriptor) -> Self {
        Self {
            descriptor,
            loader: ConfigLoader::new(),
            quiet: false,
            root_dir: None,
            bot_config_file: None,
        }
    }

    /// Loads `parley.toml` from `path` instead of searching for it.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.loader = self.loader.file(path);
        self
    }

    /// Adds a directory to search for `parley.toml`.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.loader = self.loader.search_path(path);
        self
    }

    /// Ignores `PARLEY_*` environment variables.
    pub fn without_env(mut self) -> Self {
        self.loader = self.loader.without_env();
        self
    }

    /// Merges programmatic defaults below the config file.
    pub fn merge(mut self, config: ParleyConfig) -> Self {
        self.loader = self.loader.merge(config);
        self
    }

    /// Suppresses the startup banner and lowers logging to warnings.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Overrides `bot.root_dir`.
    pub fn root_dir(mut self, root_dir: impl Into<PathBuf>) -> Self {
        self.root_dir = Some(root_dir.into());
        self
    }

    /// Overrides `bot.config_file`.
    pub fn bot_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.bot_config_file = Some(path.into());
        self
    }

    /// Loads and validates the configuration and installs logging.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::Config`](crate::RuntimeError::Config) if the
    /// configuration cannot be loaded or is invalid.
    pub fn build(self) -> RuntimeResult<BotRuntime> {
        let mut config = self.loader.load()?;
        if let Some(root_dir) = self.root_dir {
            config.bot.root_dir = root_dir;
        }
        if let Some(path) = self.bot_config_file {
            config.bot.config_file = Some(path);
        }
        BotRuntime::from_parts(self.descriptor, config, self.quiet)
    }
}
