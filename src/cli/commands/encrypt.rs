use crate::cli::context::Context;
use crate::cli::output;
use crate::core::errors::Result;
use crate::core::models::file_target::FileTarget;

/// Execute the `sealdrop encrypt` command.
///
/// Encrypts one of the user's files for a stored recipient and writes
/// `<name>.pgp` next to it.
pub fn execute(
    ctx: &Context,
    recipient: i64,
    path: Option<&str>,
    file_id: Option<u64>,
) -> Result<()> {
    let session = ctx.session();
    let target = FileTarget::new(file_id, path);
    let service = ctx.crypt_service();

    output::detail(&format!("Source: {target}"));
    if let Some(engine) = service.codec.engine_name() {
        output::detail(&format!("Engine: {engine}"));
    }

    let sp = output::spinner(&format!("Encrypting {target} for recipient #{recipient}..."));
    let result = service.encrypt_for_recipient(&session, recipient, &target);
    let location = match result {
        Ok(location) => location,
        Err(e) => {
            sp.finish_and_clear();
            return Err(e);
        }
    };
    output::finish_spinner(sp, &format!("Encrypted for recipient #{recipient}"));
    output::success(&format!("Saved to {}", location.path));

    Ok(())
}
