use crate::cli::context::Context;
use crate::cli::output;
use crate::core::errors::Result;
use crate::core::models::file_target::FileTarget;

/// Execute the `sealdrop decrypt` command.
///
/// Decrypts one of the user's files with their stored private key and
/// writes the plaintext next to it.
pub fn execute(
    ctx: &Context,
    path: Option<&str>,
    file_id: Option<u64>,
    passphrase: Option<&str>,
) -> Result<()> {
    let session = ctx.session();
    let target = FileTarget::new(file_id, path);
    let service = ctx.crypt_service();

    output::detail(&format!("Source: {target}"));

    let sp = output::spinner(&format!("Decrypting {target}..."));
    let result = service.decrypt_with_private_key(&session, &target, passphrase);
    let location = match result {
        Ok(location) => location,
        Err(e) => {
            sp.finish_and_clear();
            return Err(e);
        }
    };
    output::finish_spinner(sp, "Decrypted with your private key");
    output::success(&format!("Saved to {}", location.path));

    Ok(())
}
