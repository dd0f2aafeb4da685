pub mod gpg_engine;
#[cfg(feature = "native")]
pub mod sequoia_engine;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::traits::engine::OpenPgpEngine;

/// Which engine the codec may use.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum EngineChoice {
    /// In-process engine first, system gpg as fallback.
    #[default]
    Auto,
    /// In-process engine only.
    Native,
    /// System `gpg` only.
    Gpg,
}

impl std::fmt::Display for EngineChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineChoice::Auto => write!(f, "auto"),
            EngineChoice::Native => write!(f, "native"),
            EngineChoice::Gpg => write!(f, "gpg"),
        }
    }
}

/// Engines to probe for `choice`, most preferred first.
///
/// A build without the `native` feature yields no in-process candidate,
/// so `Native` then resolves to nothing and the codec reports the engine
/// as unavailable.
pub fn candidates(choice: EngineChoice, gpg_path: &Path) -> Vec<Box<dyn OpenPgpEngine>> {
    let mut engines: Vec<Box<dyn OpenPgpEngine>> = Vec::new();

    if matches!(choice, EngineChoice::Auto | EngineChoice::Native) {
        engines.extend(native_engine());
    }

    if matches!(choice, EngineChoice::Auto | EngineChoice::Gpg) {
        engines.push(Box::new(gpg_engine::GpgEngine::with_path(
            gpg_path.to_path_buf(),
        )));
    }

    engines
}

#[cfg(feature = "native")]
fn native_engine() -> Option<Box<dyn OpenPgpEngine>> {
    Some(Box::new(sequoia_engine::SequoiaEngine::new()))
}

#[cfg(not(feature = "native"))]
fn native_engine() -> Option<Box<dyn OpenPgpEngine>> {
    None
}
