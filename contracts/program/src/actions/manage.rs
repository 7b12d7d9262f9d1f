//! Session removal.

use smart_sessions_interface::ModuleResolver;
use smart_sessions_state::{address_hex, AccountSessions, Address, SessionStateError, SignerId};
use tracing::{info, warn};

use crate::actions::hooks::{run_hooks, Hook};
use crate::error::Result;

/// Removes a session and calls every module's uninstall hook.
///
/// A failed hook leaves `sessions` as it was, and the modules uninstalled
/// before it are installed again.
pub fn remove_session(
    modules: &dyn ModuleResolver,
    sessions: &mut AccountSessions,
    account: &Address,
    signer_id: &SignerId,
) -> Result<()> {
    let mut staged = sessions.clone();
    let removed = staged.remove(signer_id).ok_or_else(|| {
        warn!(%signer_id, "no session to remove");
        SessionStateError::SessionNotFound(*signer_id)
    })?;

    run_hooks(modules, &removed.modules(account), Hook::Uninstall)?;
    *sessions = staged;

    info!(account = %address_hex(account), %signer_id, "session removed");
    Ok(())
}
