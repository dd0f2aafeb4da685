use std::sync::Arc;

use crate::adapters::audit::json_audit_logger::JsonAuditLogger;
use crate::adapters::engine;
use crate::adapters::storage::local_fs::LocalFileSystem;
use crate::adapters::stores::json_private_key_store::JsonPrivateKeyStore;
use crate::adapters::stores::json_recipient_store::JsonRecipientStore;
use crate::cli::Cli;
use crate::config::app_config::AppConfig;
use crate::core::errors::Result;
use crate::core::services::crypt_service::CryptService;
use crate::core::services::key_codec::KeyMaterialCodec;
use crate::core::services::output_namer::FileOutputNamer;
use crate::core::services::private_key_service::PrivateKeyService;
use crate::core::services::recipient_service::RecipientService;
use crate::core::traits::audit::AuditLogger;
use crate::core::traits::session::StaticSession;

pub type Recipients = Arc<JsonRecipientStore>;
pub type PrivateKeys = Arc<JsonPrivateKeyStore>;
pub type Files = Arc<LocalFileSystem>;
pub type Crypt = CryptService<Recipients, PrivateKeys, Files>;

/// Everything a command needs, built once from config and flags.
///
/// Adapters are shared behind `Arc`, so the services handed out here all
/// see the same stores and the same audit log.
pub struct Context {
    pub config: AppConfig,
    user: Option<String>,
    recipients: Recipients,
    private_keys: PrivateKeys,
    files: Files,
    audit: Option<Arc<dyn AuditLogger>>,
}

impl Context {
    /// Load the config and apply command-line overrides.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = AppConfig::load(cli.config.as_deref())?;
        if let Some(dir) = &cli.data_dir {
            config.storage.data_dir = dir.clone();
        }
        if let Some(choice) = cli.engine {
            config.engine.backend = choice;
        }
        Ok(Self::new(config, cli.user.clone()))
    }

    pub fn new(config: AppConfig, user: Option<String>) -> Self {
        let state_dir = config.state_dir();
        let audit = JsonAuditLogger::from_config(&state_dir, &config.audit)
            .map(|logger| Arc::new(logger) as Arc<dyn AuditLogger>);

        Self {
            recipients: Arc::new(JsonRecipientStore::new(&state_dir)),
            private_keys: Arc::new(JsonPrivateKeyStore::new(&state_dir)),
            files: Arc::new(LocalFileSystem::new(config.storage.data_dir.clone())),
            audit,
            user,
            config,
        }
    }

    /// The `--user` session, anonymous when none was given.
    pub fn session(&self) -> StaticSession {
        match &self.user {
            Some(user) => StaticSession::new(user.as_str()),
            None => StaticSession::anonymous(),
        }
    }

    pub fn files(&self) -> &LocalFileSystem {
        &self.files
    }

    pub fn audit(&self) -> Option<Arc<dyn AuditLogger>> {
        self.audit.clone()
    }

    /// Probe the configured engines.
    pub fn codec(&self) -> KeyMaterialCodec {
        let engine = &self.config.engine;
        KeyMaterialCodec::detect(engine::candidates(engine.backend, &engine.gpg_path))
    }

    pub fn namer(&self) -> FileOutputNamer {
        FileOutputNamer::new(self.config.output.max_name_attempts)
    }

    pub fn crypt_service(&self) -> Crypt {
        CryptService {
            recipients: self.recipients.clone(),
            private_keys: self.private_keys.clone(),
            files: self.files.clone(),
            codec: self.codec(),
            namer: self.namer(),
            audit: self.audit(),
        }
    }

    pub fn recipient_service(&self) -> RecipientService<Recipients> {
        RecipientService {
            store: self.recipients.clone(),
            audit: self.audit(),
        }
    }

    pub fn private_key_service(&self) -> PrivateKeyService<PrivateKeys> {
        PrivateKeyService {
            store: self.private_keys.clone(),
            audit: self.audit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::session::UserSession;

    fn config_in(dir: &std::path::Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.storage.data_dir = dir.to_path_buf();
        config
    }

    #[test]
    fn services_share_one_state_dir() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::new(config_in(dir.path()), Some("alice".into()));

        ctx.recipient_service()
            .create(&ctx.session(), "Bob", "KEY")
            .unwrap();

        assert_eq!(ctx.recipient_service().list(&ctx.session()).unwrap().len(), 1);
        assert!(dir.path().join(".sealdrop").join("recipients.json").exists());
        assert!(dir.path().join(".sealdrop").join("audit.log").exists());
    }

    #[test]
    fn no_user_means_anonymous_session() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::new(config_in(dir.path()), None);
        assert_eq!(ctx.session().current_user_id(), "");
    }

    #[test]
    fn disabled_audit_yields_no_logger() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.audit.enabled = false;

        assert!(Context::new(config, None).audit().is_none());
    }
}
