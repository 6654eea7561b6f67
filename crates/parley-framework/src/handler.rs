//! The bot handler facade.
//!
//! [`BotHandler`] is the only door a plugin has to the outside world:
//! identity, rate-limited messaging, its configuration section, files under
//! its own directory and (when declared) persistent storage.
//!
//! # Construction
//!
//! ```rust,ignore
//! let handler = BotHandler::builder(client, "/srv/bots/incrementor")
//!     .capabilities(&[Capability::Storage])
//!     .config_provider(Arc::new(ConfFileProvider::directory("/srv/bots")))
//!     .build()
//!     .await?;
//! ```
//!
//! `build` resolves the bot's profile; if that fails the bot cannot run and
//! [`HandlerError::Initialization`] is returned.
//!
//! # Rate limiting
//!
//! Every send goes through a [`RateLimiter`]. The first denial latches the
//! handler into a tripped state: the send fails with
//! [`HandlerError::RateLimitExceeded`], every later send is refused, and the
//! dispatcher stops the bot even if the plugin ignored the error.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use parley_core::{
    BotProfile, BoxedClient, Conversation, Envelope, Message, MessageEdit, MessageReceipt,
    RateLimiter,
};
use tracing::{debug, error};

use crate::config::{ConfigProvider, ConfigSection, NoConfig};
use crate::error::{HandlerError, HandlerResult};
use crate::plugin::Capability;
use crate::state::StateStore;

// ─── Builder ──────────────────────────────────────────────────────────────────

/// Builder for [`BotHandler`].
pub struct BotHandlerBuilder {
    client: BoxedClient,
    root_dir: PathBuf,
    capabilities: Vec<Capability>,
    rate_limiter: RateLimiter,
    config: Arc<dyn ConfigProvider>,
}

impl BotHandlerBuilder {
    /// Declares the capabilities the plugin may use.
    pub fn capabilities(mut self, capabilities: &[Capability]) -> Self {
        self.capabilities = capabilities.to_vec();
        self
    }

    /// Replaces the default rate limiter (20 messages per 5 seconds).
    pub fn rate_limiter(mut self, rate_limiter: RateLimiter) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    /// Shorthand for `rate_limiter(RateLimiter::new(message_limit, interval))`.
    pub fn rate_limit(self, message_limit: usize, interval: Duration) -> Self {
        self.rate_limiter(RateLimiter::new(message_limit, interval))
    }

    /// Sets where `get_config_info` reads sections from.
    pub fn config_provider(mut self, provider: Arc<dyn ConfigProvider>) -> Self {
        self.config = provider;
        self
    }

    /// Resolves the bot's identity and, if declared, loads its storage.
    ///
    /// # Errors
    ///
    /// - [`HandlerError::Initialization`] if the profile cannot be fetched.
    /// - [`HandlerError::State`] if storage is declared and cannot be loaded.
    /// - [`HandlerError::Io`] if the root directory cannot be made absolute.
    pub async fn build(self) -> HandlerResult<BotHandler> {
        let root_dir = normalize(&std::path::absolute(&self.root_dir)?);

        let profile = self
            .client
            .get_profile()
            .await
            .map_err(HandlerError::Initialization)?;
        debug!(
            user_id = profile.user_id,
            full_name = %profile.full_name,
            "Resolved bot profile"
        );

        let storage = if self.capabilities.contains(&Capability::Storage) {
            Some(StateStore::new(Arc::clone(&self.client)).await?)
        } else {
            None
        };

        Ok(BotHandler {
            client: self.client,
            profile,
            root_dir,
            rate_limiter: self.rate_limiter,
            rate_limit_tripped: false,
            capability_violation: Mutex::new(None),
            config: self.config,
            storage,
        })
    }
}

// ─── BotHandler ───────────────────────────────────────────────────────────────

/// Capability-restricted facade handed to plugins.
pub struct BotHandler {
    client: BoxedClient,
    profile: BotProfile,
    /// Absolute, lexically normalized.
    root_dir: PathBuf,
    rate_limiter: RateLimiter,
    rate_limit_tripped: bool,
    /// First undeclared capability the plugin reached for.
    capability_violation: Mutex<Option<Capability>>,
    config: Arc<dyn ConfigProvider>,
    storage: Option<StateStore>,
}

impl BotHandler {
    /// Starts building a handler for a plugin rooted at `root_dir`.
    pub fn builder(client: BoxedClient, root_dir: impl Into<PathBuf>) -> BotHandlerBuilder {
        BotHandlerBuilder {
            client,
            root_dir: root_dir.into(),
            capabilities: Vec::new(),
            rate_limiter: RateLimiter::default(),
            config: Arc::new(NoConfig),
        }
    }

    // --- identity ---

    /// Numeric user id of the bot.
    pub fn user_id(&self) -> u64 {
        self.profile.user_id
    }

    /// Display name of the bot.
    pub fn full_name(&self) -> &str {
        &self.profile.full_name
    }

    /// Email address of the bot.
    pub fn email(&self) -> &str {
        &self.profile.email
    }

    /// The full profile resolved at construction.
    pub fn profile(&self) -> &BotProfile {
        &self.profile
    }

    /// The plugin's root directory.
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    // --- messaging ---

    /// Sends a message, subject to the rate limit.
    pub async fn send_message(&mut self, envelope: &Envelope) -> HandlerResult<MessageReceipt> {
        self.check_rate_limit()?;
        let receipt = self.client.send_message(envelope).await?;
        debug!(message_id = receipt.id, kind = %envelope.kind(), "Sent message");
        Ok(receipt)
    }

    /// Replies in the conversation `original` came from.
    ///
    /// Private replies go to every participant except the bot itself; stream
    /// replies go to the same stream and topic.
    pub async fn send_reply(
        &mut self,
        original: &Message,
        response: &str,
    ) -> HandlerResult<MessageReceipt> {
        let envelope = match &original.conversation {
            Conversation::Private { recipients } => Envelope::private(
                recipients
                    .iter()
                    .filter(|r| r.email != self.profile.email)
                    .map(|r| r.email.clone()),
                response,
            ),
            Conversation::Stream { stream, topic } => {
                Envelope::stream(stream.clone(), topic.clone(), response)
            }
        };
        self.send_message(&envelope).await
    }

    /// Replaces the content of a message the bot sent earlier, subject to the
    /// rate limit.
    pub async fn update_message(&mut self, edit: &MessageEdit) -> HandlerResult<()> {
        self.check_rate_limit()?;
        self.client.update_message(edit).await?;
        debug!(message_id = edit.message_id, "Updated message");
        Ok(())
    }

    /// Returns `true` once the rate limit has been exceeded.
    pub fn is_rate_limited(&self) -> bool {
        self.rate_limit_tripped
    }

    fn check_rate_limit(&mut self) -> HandlerResult<()> {
        if self.rate_limit_tripped {
            return Err(HandlerError::RateLimitExceeded);
        }
        if !self.rate_limiter.check_and_record() {
            self.rate_limit_tripped = true;
            error!(
                message_limit = self.rate_limiter.message_limit(),
                interval = ?self.rate_limiter.interval_limit(),
                "Message rate limit exceeded; is the bot trapped in an infinite loop \
                 by reacting to its own messages?"
            );
            return Err(HandlerError::RateLimitExceeded);
        }
        Ok(())
    }

    // --- configuration ---

    /// Reads the `[bot_name]` section of the bot's configuration.
    ///
    /// With `optional`, a missing configuration file yields an empty section
    /// instead of an error. A file without the section is always an error.
    pub fn get_config_info(&self, bot_name: &str, optional: bool) -> HandlerResult<ConfigSection> {
        match self.config.load_section(bot_name) {
            Ok(section) => Ok(section),
            Err(e) if optional && e.is_missing() => {
                debug!(bot = bot_name, "No bot configuration, using empty section");
                Ok(ConfigSection::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    // --- files ---

    /// Resolves `path` against the root directory.
    ///
    /// The check is lexical: `..` components are folded before comparing
    /// against the root, and symlinks are not resolved.
    ///
    /// # Errors
    ///
    /// [`HandlerError::Permission`] if the result lies outside the root.
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> HandlerResult<PathBuf> {
        let resolved = normalize(&self.root_dir.join(path));
        if resolved.starts_with(&self.root_dir) {
            Ok(resolved)
        } else {
            Err(HandlerError::Permission { path: resolved })
        }
    }

    /// Opens a file under the root directory for reading.
    ///
    /// Confinement is checked lexically by [`resolve_path`](Self::resolve_path),
    /// so a symlink inside the root is followed even if it points outside.
    pub async fn open(&self, path: impl AsRef<Path>) -> HandlerResult<tokio::fs::File> {
        let resolved = self.resolve_path(path)?;
        Ok(tokio::fs::File::open(resolved).await?)
    }

    // --- storage ---

    /// The bot's storage.
    ///
    /// # Errors
    ///
    /// [`HandlerError::Capability`] if the plugin did not declare
    /// [`Capability::Storage`].
    ///
    /// The violation is latched: the dispatcher stops the bot even if the
    /// plugin swallows the error.
    pub fn storage(&self) -> HandlerResult<&StateStore> {
        match self.storage.as_ref() {
            Some(store) => Ok(store),
            None => Err(self.violate(Capability::Storage)),
        }
    }

    /// Mutable access to the bot's storage.
    pub fn storage_mut(&mut self) -> HandlerResult<&mut StateStore> {
        if self.storage.is_none() {
            return Err(self.violate(Capability::Storage));
        }
        self.storage.as_mut().ok_or(HandlerError::Capability {
            capability: Capability::Storage,
        })
    }

    /// The first undeclared capability the plugin tried to use, if any.
    pub fn capability_violation(&self) -> Option<Capability> {
        *self.capability_violation.lock()
    }

    fn violate(&self, capability: Capability) -> HandlerError {
        let mut latched = self.capability_violation.lock();
        if latched.is_none() {
            error!(?capability, "Plugin used a capability it did not declare");
            *latched = Some(capability);
        }
        HandlerError::Capability { capability }
    }

    pub(crate) fn has_storage(&self) -> bool {
        self.storage.is_some()
    }

    pub(crate) async fn flush_storage(&mut self) -> crate::error::StateResult<()> {
        match self.storage.as_mut() {
            Some(store) => store.flush().await,
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for BotHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotHandler")
            .field("profile", &self.profile)
            .field("root_dir", &self.root_dir)
            .field("rate_limit_tripped", &self.rate_limit_tripped)
            .field("capability_violation", &self.capability_violation())
            .field("storage", &self.storage)
            .finish_non_exhaustive()
    }
}

/// Lexical normalization: drops `.`, resolves `..` against the preceding
/// component. Does not touch the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use parley_core::{ApiError, Destination};
    use tokio::io::AsyncReadExt;
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::config::StaticConfig;
    use crate::error::{BotConfigError, StateError};
    use crate::testing::{
        MockChatClient, group_private_message, private_message, stream_message,
    };

    async fn handler_for(client: &Arc<MockChatClient>) -> BotHandler {
        BotHandler::builder(client.clone(), ".").build().await.unwrap()
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/a/../../b")), PathBuf::from("/b"));
        assert_eq!(normalize(Path::new("/a/b/")), PathBuf::from("/a/b"));
    }

    #[tokio::test]
    async fn test_identity() {
        let client = Arc::new(MockChatClient::new());
        let handler = handler_for(&client).await;
        assert_eq!(handler.user_id(), 1);
        assert_eq!(handler.full_name(), "Test Bot");
        assert_eq!(handler.email(), "test-bot@example.com");
        assert!(handler.root_dir().is_absolute());
    }

    #[tokio::test]
    async fn test_profile_failure_is_initialization_error() {
        let client = Arc::new(MockChatClient::new());
        client.fail_profile(true);
        let err = assert_err!(BotHandler::builder(client, ".").build().await);
        assert!(matches!(err, HandlerError::Initialization(ApiError::Remote { .. })));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_private_reply_excludes_self() {
        let client = Arc::new(MockChatClient::new());
        let mut handler = handler_for(&client).await;

        let message = group_private_message(2, &[3], "hello");
        assert_ok!(handler.send_reply(&message, "hi all").await);

        let reply = client.unique_reply();
        assert_eq!(
            reply.destination,
            Destination::Private {
                to: vec!["user2@example.com".into(), "user3@example.com".into()]
            }
        );
        assert_eq!(reply.content, "hi all");
    }

    #[tokio::test]
    async fn test_stream_reply_keeps_topic() {
        let client = Arc::new(MockChatClient::new());
        let mut handler = handler_for(&client).await;

        let message = stream_message(2, "general", "lunch", "@**Test Bot** where?");
        handler.send_reply(&message, "cafeteria").await.unwrap();

        assert_eq!(
            client.unique_reply(),
            Envelope::stream("general", "lunch", "cafeteria")
        );
    }

    #[tokio::test]
    async fn test_send_message_returns_receipt() {
        let client = Arc::new(MockChatClient::new());
        let mut handler = handler_for(&client).await;

        let first = handler
            .send_message(&Envelope::private(["a@example.com"], "one"))
            .await
            .unwrap();
        let second = handler
            .send_message(&Envelope::private(["a@example.com"], "two"))
            .await
            .unwrap();
        assert_ne!(first.id, second.id);

        handler
            .update_message(&MessageEdit::new(first.id, "uno"))
            .await
            .unwrap();
        assert_eq!(client.edits(), vec![MessageEdit::new(first.id, "uno")]);
    }

    #[tokio::test]
    async fn test_api_failure_is_not_fatal() {
        let client = Arc::new(MockChatClient::new());
        let mut handler = handler_for(&client).await;
        client.fail_sends(true);

        let err = assert_err!(handler.send_reply(&private_message(2, "hi"), "hello").await);
        assert!(matches!(err, HandlerError::Api(_)));
        assert!(!err.is_fatal());
        assert!(!handler.is_rate_limited());
    }

    #[tokio::test]
    async fn test_rate_limit_trips_and_latches() {
        let client = Arc::new(MockChatClient::new());
        let mut handler = BotHandler::builder(client.clone(), ".")
            .rate_limit(2, Duration::from_secs(3600))
            .build()
            .await
            .unwrap();
        let message = private_message(2, "ping");

        assert_ok!(handler.send_reply(&message, "1").await);
        assert_ok!(handler.send_reply(&message, "2").await);
        let err = assert_err!(handler.send_reply(&message, "3").await);
        assert!(matches!(err, HandlerError::RateLimitExceeded));
        assert!(handler.is_rate_limited());

        // latched: edits are refused too
        let err = assert_err!(handler.update_message(&MessageEdit::new(1, "x")).await);
        assert!(matches!(err, HandlerError::RateLimitExceeded));

        assert_eq!(client.sent_messages().len(), 2);
        assert!(client.edits().is_empty());
    }

    #[tokio::test]
    async fn test_config_optional_and_required() {
        let client = Arc::new(MockChatClient::new());
        let handler = handler_for(&client).await;

        // no provider at all
        assert!(handler.get_config_info("giphy", true).unwrap().is_empty());
        let err = assert_err!(handler.get_config_info("giphy", false));
        assert!(matches!(
            err,
            HandlerError::Config(BotConfigError::NotConfigured)
        ));

        let handler = BotHandler::builder(client.clone(), ".")
            .config_provider(Arc::new(
                StaticConfig::new().with_section("giphy", [("key", "abc")]),
            ))
            .build()
            .await
            .unwrap();
        assert_eq!(handler.get_config_info("giphy", false).unwrap()["key"], "abc");
        assert!(handler.get_config_info("xkcd", true).unwrap().is_empty());
        assert!(handler.get_config_info("xkcd", false).is_err());
    }

    #[tokio::test]
    async fn test_open_is_scoped_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("data.txt"), "payload").unwrap();

        let client = Arc::new(MockChatClient::new());
        let handler = BotHandler::builder(client, dir.path())
            .build()
            .await
            .unwrap();

        let mut file = handler.open("data.txt").await.unwrap();
        let mut contents = String::new();
        file.read_to_string(&mut contents).await.unwrap();
        assert_eq!(contents, "payload");

        let err = assert_err!(handler.open("../../etc/passwd").await);
        assert!(matches!(err, HandlerError::Permission { .. }));

        let err = assert_err!(handler.open("/etc/passwd").await);
        assert!(matches!(err, HandlerError::Permission { .. }));

        // climbing out and back in stays inside
        let name = dir.path().file_name().unwrap().to_owned();
        let round_trip = Path::new("..").join(name).join("data.txt");
        assert!(handler.open(round_trip).await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_inside_root_is_followed() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("bot");
        std::fs::create_dir(&root).unwrap();
        let outside = dir.path().join("outside.txt");
        std::fs::write(&outside, "elsewhere").unwrap();
        std::os::unix::fs::symlink(&outside, root.join("link.txt")).unwrap();

        let client = Arc::new(MockChatClient::new());
        let handler = BotHandler::builder(client, &root).build().await.unwrap();

        let mut file = assert_ok!(handler.open("link.txt").await);
        let mut contents = String::new();
        file.read_to_string(&mut contents).await.unwrap();
        assert_eq!(contents, "elsewhere");
    }

    #[tokio::test]
    async fn test_sibling_with_common_prefix_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("bot");
        std::fs::create_dir(&root).unwrap();

        let client = Arc::new(MockChatClient::new());
        let handler = BotHandler::builder(client, &root).build().await.unwrap();

        let err = assert_err!(handler.resolve_path("../bot-evil/secret"));
        assert!(matches!(err, HandlerError::Permission { .. }));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(MockChatClient::new());
        let handler = BotHandler::builder(client, dir.path())
            .build()
            .await
            .unwrap();

        let err = assert_err!(handler.open("nope.txt").await);
        assert!(matches!(err, HandlerError::Io(_)));
    }

    #[tokio::test]
    async fn test_storage_requires_capability() {
        let client = Arc::new(MockChatClient::new());
        let mut handler = handler_for(&client).await;

        let err = assert_err!(handler.storage_mut());
        assert!(matches!(
            err,
            HandlerError::Capability {
                capability: Capability::Storage
            }
        ));
        assert!(err.is_fatal());
        assert!(!handler.has_storage());
    }

    #[tokio::test]
    async fn test_capability_violation_is_latched() {
        let client = Arc::new(MockChatClient::new());
        let mut handler = handler_for(&client).await;
        assert_eq!(handler.capability_violation(), None);

        // read-only access trips the latch as well
        assert_err!(handler.storage());
        assert_eq!(handler.capability_violation(), Some(Capability::Storage));

        // swallowing the error does not clear it
        if let Ok(store) = handler.storage_mut() {
            store.put("never", &1).unwrap();
        }
        assert_eq!(handler.capability_violation(), Some(Capability::Storage));
    }

    #[tokio::test]
    async fn test_storage_with_capability() {
        let client = Arc::new(MockChatClient::new().with_storage([("count", "4")]));
        let mut handler = BotHandler::builder(client.clone(), ".")
            .capabilities(&[Capability::Storage])
            .build()
            .await
            .unwrap();

        assert_eq!(handler.storage().unwrap().get::<u32>("count").unwrap(), 4);
        handler.storage_mut().unwrap().put("count", &5).unwrap();
        handler.flush_storage().await.unwrap();
        assert_eq!(client.storage_snapshot()["count"], "5");
    }

    #[tokio::test]
    async fn test_storage_fetch_failure() {
        let client = Arc::new(MockChatClient::new());
        client.fail_storage_fetch(true);
        let err = assert_err!(
            BotHandler::builder(client, ".")
                .capabilities(&[Capability::Storage])
                .build()
                .await
        );
        assert!(matches!(
            err,
            HandlerError::State(StateError::Initialization(_))
        ));
    }
}
