//! Module install and uninstall hooks.

use smart_sessions_interface::{
    ActionPolicy, Erc1271Policy, ModuleError, ModuleResolver, SessionModule, SessionSigner,
    UserOpPolicy,
};
use smart_sessions_state::{address_hex, ModuleInstall, ModuleKind, PolicyKind};
use tracing::{debug, warn};

use crate::error::{Result, SmartSessionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    Install,
    Uninstall,
}

impl Hook {
    /// The hook that undoes this one.
    pub fn inverse(self) -> Self {
        match self {
            Hook::Install => Hook::Uninstall,
            Hook::Uninstall => Hook::Install,
        }
    }
}

enum Resolved<'m> {
    Signer(&'m dyn SessionSigner),
    UserOp(&'m dyn UserOpPolicy),
    Erc1271(&'m dyn Erc1271Policy),
    Action(&'m dyn ActionPolicy),
}

fn call<M: SessionModule + ?Sized>(module: &M, hook: Hook, data: &[u8]) -> std::result::Result<(), ModuleError> {
    match hook {
        Hook::Install => module.on_install(data),
        Hook::Uninstall => module.on_uninstall(data),
    }
}

impl Resolved<'_> {
    fn run(&self, hook: Hook, data: &[u8]) -> std::result::Result<(), ModuleError> {
        match self {
            Resolved::Signer(m) => call(*m, hook, data),
            Resolved::UserOp(m) => call(*m, hook, data),
            Resolved::Erc1271(m) => call(*m, hook, data),
            Resolved::Action(m) => call(*m, hook, data),
        }
    }
}

fn resolve<'m>(modules: &'m dyn ModuleResolver, install: &ModuleInstall) -> Result<Resolved<'m>> {
    let resolved = match install.kind {
        ModuleKind::Signer => modules.signer(&install.module).map(Resolved::Signer),
        ModuleKind::Policy(PolicyKind::UserOp) => {
            modules.user_op_policy(&install.module).map(Resolved::UserOp)
        },
        ModuleKind::Policy(PolicyKind::Erc1271) => {
            modules.erc1271_policy(&install.module).map(Resolved::Erc1271)
        },
        ModuleKind::Policy(PolicyKind::Action) => {
            modules.action_policy(&install.module).map(Resolved::Action)
        },
    };
    resolved.ok_or_else(|| {
        warn!(module = %address_hex(&install.module), kind = %install.kind, "module does not implement capability");
        SmartSessionError::ModuleNotFound {
            kind: install.kind,
            module: install.module,
        }
    })
}

/// Runs `hook` on every module, in order.
///
/// Every module is resolved before any hook is called, so a missing module
/// fails the batch without side effects. If a hook fails, the modules that
/// already ran get the inverse hook, in reverse order, before the error is
/// returned.
pub fn run_hooks(modules: &dyn ModuleResolver, installs: &[ModuleInstall], hook: Hook) -> Result<()> {
    let resolved = installs
        .iter()
        .map(|install| resolve(modules, install))
        .collect::<Result<Vec<_>>>()?;

    for (ran, (install, module)) in installs.iter().zip(&resolved).enumerate() {
        if let Err(reason) = module.run(hook, &install.install_data) {
            warn!(module = %address_hex(&install.module), ?hook, %reason, "module hook failed");
            unwind(&installs[..ran], &resolved[..ran], hook.inverse());
            return Err(match hook {
                Hook::Install => SmartSessionError::ModuleInstallFailed {
                    module: install.module,
                    reason,
                },
                Hook::Uninstall => SmartSessionError::ModuleUninstallFailed {
                    module: install.module,
                    reason,
                },
            });
        }
        debug!(module = %address_hex(&install.module), session_id = %install.session_id, ?hook, "module hook ran");
    }
    Ok(())
}

/// Undoes a completed [`run_hooks`] call by running the inverse of `hook`
/// on every module, last one first.
///
/// Used when a later step of the same request fails. Failures are logged
/// and skipped since the request is already failing.
pub fn revert_hooks(modules: &dyn ModuleResolver, installs: &[ModuleInstall], hook: Hook) {
    let (installs, resolved): (Vec<_>, Vec<_>) = installs
        .iter()
        .filter_map(|install| resolve(modules, install).ok().map(|m| (install.clone(), m)))
        .unzip();
    unwind(&installs, &resolved, hook.inverse());
}

fn unwind(installs: &[ModuleInstall], resolved: &[Resolved<'_>], hook: Hook) {
    for (install, module) in installs.iter().zip(resolved).rev() {
        match module.run(hook, &install.install_data) {
            Ok(()) => {
                debug!(module = %address_hex(&install.module), ?hook, "module hook rolled back")
            },
            Err(reason) => {
                warn!(module = %address_hex(&install.module), ?hook, %reason, "module rollback failed")
            },
        }
    }
}
