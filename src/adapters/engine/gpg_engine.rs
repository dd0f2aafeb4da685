use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tempfile::{NamedTempFile, TempDir};

use crate::core::models::key_material::Fingerprint;
use crate::core::traits::engine::{EngineError, EngineSession, OpenPgpEngine};

/// IMPORT_OK reason bit set when the imported block held secret material.
const IMPORT_SECRET: u32 = 16;

/// libgpg-error codes, compared after masking off the error source.
const GPG_ERR_BAD_PASSPHRASE: u32 = 11;
const GPG_ERR_NO_PASSPHRASE: u32 = 177;
const GPG_ERR_CODE_MASK: u32 = 0xFFFF;

/// OpenPGP engine that shells out to the system `gpg` binary.
///
/// Every session gets a throwaway home directory, so the user's own
/// keyring is never read or written.
pub struct GpgEngine {
    /// Path to the gpg binary (defaults to "gpg").
    gpg_path: PathBuf,
}

impl GpgEngine {
    /// Create an engine using the `gpg` found in PATH.
    pub fn new() -> Self {
        Self {
            gpg_path: PathBuf::from("gpg"),
        }
    }

    /// Create an engine with a custom gpg binary path.
    pub fn with_path(gpg_path: PathBuf) -> Self {
        Self { gpg_path }
    }
}

impl Default for GpgEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenPgpEngine for GpgEngine {
    fn name(&self) -> &str {
        "gpg"
    }

    fn is_available(&self) -> bool {
        Command::new(&self.gpg_path)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .is_ok_and(|o| o.status.success())
    }

    fn open_session(&self) -> Result<Box<dyn EngineSession + '_>, EngineError> {
        let home = tempfile::Builder::new().prefix("sealdrop-gpg-").tempdir()?;
        tracing::debug!(home = %home.path().display(), "gpg session opened");

        Ok(Box::new(GpgSession {
            gpg_path: &self.gpg_path,
            home,
            armor: false,
            targets: Vec::new(),
            secret_keys: Vec::new(),
            passphrase: None,
        }))
    }
}

/// A gpg keyring in a temporary home directory, removed on drop.
struct GpgSession<'a> {
    gpg_path: &'a Path,
    home: TempDir,
    armor: bool,
    targets: Vec<Fingerprint>,
    secret_keys: Vec<Fingerprint>,
    passphrase: Option<String>,
}

/// What one gpg invocation produced.
struct GpgOutput {
    success: bool,
    stdout: Vec<u8>,
    status: Vec<StatusLine>,
    /// Human-readable stderr lines, status lines removed.
    diagnostics: String,
}

impl GpgOutput {
    fn has(&self, keyword: &str) -> bool {
        self.status.iter().any(|l| l.keyword == keyword)
    }

    /// Codes from `ERROR <location> <code>` lines.
    fn error_codes(&self) -> impl Iterator<Item = u32> + '_ {
        self.status
            .iter()
            .filter(|l| l.keyword == "ERROR")
            .filter_map(|l| l.args.get(1)?.parse::<u32>().ok())
            .map(|code| code & GPG_ERR_CODE_MASK)
    }

    /// Loopback pinentry reports passphrase trouble as
    /// `ERROR pkdecrypt_failed <code>`; older builds use the keywords.
    fn passphrase_failure(&self, supplied: bool) -> Option<EngineError> {
        let missing = self.has("MISSING_PASSPHRASE")
            || self.error_codes().any(|c| c == GPG_ERR_NO_PASSPHRASE);
        let bad = self.has("BAD_PASSPHRASE")
            || self.error_codes().any(|c| c == GPG_ERR_BAD_PASSPHRASE);

        if missing || (bad && !supplied) {
            Some(EngineError::PassphraseMissing)
        } else if bad {
            Some(EngineError::BadPassphrase)
        } else {
            None
        }
    }

    fn summary(&self) -> String {
        let text = self.diagnostics.trim();
        if text.is_empty() {
            "gpg reported an error".to_string()
        } else {
            text.lines().last().unwrap_or(text).to_string()
        }
    }
}

/// One `[GNUPG:]` line from `--status-fd`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StatusLine {
    keyword: String,
    args: Vec<String>,
}

/// Split stderr into machine status lines and the remaining diagnostics.
fn parse_status(stderr: &[u8]) -> (Vec<StatusLine>, String) {
    let text = String::from_utf8_lossy(stderr);
    let mut status = Vec::new();
    let mut diagnostics = String::new();

    for line in text.lines() {
        match line.strip_prefix("[GNUPG:] ") {
            Some(rest) => {
                let mut parts = rest.split_whitespace().map(str::to_string);
                if let Some(keyword) = parts.next() {
                    status.push(StatusLine {
                        keyword,
                        args: parts.collect(),
                    });
                }
            }
            None => {
                diagnostics.push_str(line);
                diagnostics.push('\n');
            }
        }
    }

    (status, diagnostics)
}

/// `(reason, fingerprint)` for every IMPORT_OK line.
fn imported_keys(status: &[StatusLine]) -> Vec<(u32, Fingerprint)> {
    status
        .iter()
        .filter(|l| l.keyword == "IMPORT_OK")
        .filter_map(|l| {
            let reason = l.args.first()?.parse().ok()?;
            let fingerprint = Fingerprint::parse(l.args.last()?)?;
            Some((reason, fingerprint))
        })
        .collect()
}

impl GpgSession<'_> {
    fn run(&self, args: &[&str], input: &[u8]) -> Result<GpgOutput, EngineError> {
        let mut child = Command::new(self.gpg_path)
            .arg("--homedir")
            .arg(self.home.path())
            .args(["--batch", "--yes", "--no-tty", "--status-fd", "2"])
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| EngineError::Unavailable(format!("failed to run gpg: {e}")))?;

        // Feed stdin from a second thread so a full stdout pipe cannot
        // stall both sides.
        let stdin = child.stdin.take();
        let output = std::thread::scope(|scope| {
            if let Some(mut stdin) = stdin {
                scope.spawn(move || {
                    // gpg may exit early on bad input; its status says why.
                    let _ = stdin.write_all(input);
                });
            }
            child.wait_with_output()
        })?;

        let (status, diagnostics) = parse_status(&output.stderr);
        tracing::trace!(?args, exit = ?output.status.code(), "gpg finished");

        Ok(GpgOutput {
            success: output.status.success(),
            stdout: output.stdout,
            status,
            diagnostics,
        })
    }

    fn import(&self, armored: &str) -> Result<Vec<(u32, Fingerprint)>, EngineError> {
        let output = self.run(&["--import"], armored.as_bytes())?;
        let keys = imported_keys(&output.status);

        if keys.is_empty() && (!output.success || output.has("NODATA")) {
            return Err(EngineError::KeyRejected(output.summary()));
        }
        Ok(keys)
    }
}

impl EngineSession for GpgSession<'_> {
    fn set_armor(&mut self, armor: bool) {
        self.armor = armor;
    }

    fn import_public_key(&mut self, armored: &str) -> Result<Option<Fingerprint>, EngineError> {
        Ok(self.import(armored)?.into_iter().map(|(_, f)| f).last())
    }

    fn add_encrypt_key(&mut self, fingerprint: &Fingerprint) -> Result<(), EngineError> {
        self.targets.push(fingerprint.clone());
        Ok(())
    }

    fn encrypt(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, EngineError> {
        let mut args = vec!["--encrypt", "--trust-model", "always"];
        for target in &self.targets {
            args.extend(["--recipient", target.as_str()]);
        }
        if self.armor {
            args.push("--armor");
        }

        let output = self.run(&args, plaintext)?;
        if output.has("INV_RECP") {
            return Err(EngineError::NoEncryptionKey);
        }
        if !output.success {
            return Err(EngineError::Failed(output.summary()));
        }
        Ok(output.stdout)
    }

    fn import_secret_key(&mut self, armored: &str) -> Result<Option<Fingerprint>, EngineError> {
        let keys = self.import(armored)?;
        if keys.is_empty() {
            return Ok(None);
        }

        let secret = keys
            .into_iter()
            .filter(|(reason, _)| reason & IMPORT_SECRET != 0)
            .map(|(_, f)| f)
            .last()
            .ok_or_else(|| {
                EngineError::KeyRejected("key contains no secret key material".into())
            })?;
        self.secret_keys.push(secret.clone());
        Ok(Some(secret))
    }

    fn add_decrypt_key(
        &mut self,
        fingerprint: &Fingerprint,
        passphrase: Option<&str>,
    ) -> Result<(), EngineError> {
        if !self.secret_keys.contains(fingerprint) {
            return Err(EngineError::KeyRejected(format!(
                "key {fingerprint} was not imported"
            )));
        }
        // gpg only checks the passphrase when it needs the key.
        self.passphrase = passphrase.map(str::to_string);
        Ok(())
    }

    fn decrypt(&mut self, ciphertext: &[u8]) -> Result<Vec<u8>, EngineError> {
        let mut passphrase_file = NamedTempFile::new()?;
        if let Some(passphrase) = &self.passphrase {
            passphrase_file.write_all(passphrase.as_bytes())?;
        }
        passphrase_file.flush()?;
        let passphrase_path = passphrase_file.path().to_string_lossy().into_owned();

        let output = self.run(
            &[
                "--pinentry-mode",
                "loopback",
                "--passphrase-file",
                &passphrase_path,
                "--decrypt",
            ],
            ciphertext,
        )?;

        if let Some(err) = output.passphrase_failure(self.passphrase.is_some()) {
            return Err(err);
        }
        if output.has("NO_SECKEY") && !output.has("DECRYPTION_OKAY") {
            return Err(EngineError::NoSecretKey);
        }
        if !output.success || output.has("DECRYPTION_FAILED") {
            return Err(EngineError::Failed(output.summary()));
        }
        Ok(output.stdout)
    }
}
