//! Builder for staging and committing session registrations.
//!
//! A [`SessionRegistration`] carries the signer entry and all three policy
//! sets of one session. [`SessionBuilder`] checks every precondition before
//! touching the registries, so a registration is applied completely or not
//! at all.

use std::collections::HashSet;

use crate::{
    encode_install_data, AccountSessions, ActionData, ActionId, Address, PolicyData, PolicyKind,
    PolicyList, SessionId, SessionStateError, SignerEntry, SignerId,
};

/// Which capability a module is installed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    Signer,
    Policy(PolicyKind),
}

impl std::fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModuleKind::Signer => f.write_str("session signer"),
            ModuleKind::Policy(kind) => write!(f, "{kind} policy"),
        }
    }
}

/// One module install (or uninstall) call derived from a registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInstall {
    pub kind: ModuleKind,
    pub module: Address,
    pub session_id: SessionId,
    /// Payload in the install-data layout
    pub install_data: Vec<u8>,
}

/// Complete, validated configuration of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRegistration {
    pub signer_id: SignerId,
    pub signer: SignerEntry,
    pub user_op_policies: PolicyList,
    pub erc1271_policies: PolicyList,
    pub actions: Vec<(ActionId, PolicyList)>,
}

impl SessionRegistration {
    pub fn new(
        signer_id: SignerId,
        signer: SignerEntry,
        user_op_policies: Vec<PolicyData>,
        erc1271_policies: Vec<PolicyData>,
        actions: Vec<ActionData>,
    ) -> Result<Self, SessionStateError> {
        let user_op_policies = PolicyList::from_policies(PolicyKind::UserOp, user_op_policies)?;
        let erc1271_policies = PolicyList::from_policies(PolicyKind::Erc1271, erc1271_policies)?;

        let mut seen = HashSet::with_capacity(actions.len());
        let mut staged = Vec::with_capacity(actions.len());
        for action in actions {
            if !seen.insert(action.action_id) {
                return Err(SessionStateError::DuplicateAction(action.action_id));
            }
            let policies = PolicyList::from_policies(PolicyKind::Action, action.action_policies)?;
            staged.push((action.action_id, policies));
        }

        Ok(Self {
            signer_id,
            signer,
            user_op_policies,
            erc1271_policies,
            actions: staged,
        })
    }

    /// Module hooks for this registration under `account`, in install order:
    /// signer, user-op policies, erc1271 policies, then each action's policies.
    pub fn modules(&self, account: &Address) -> Vec<ModuleInstall> {
        let session_id = SessionId::for_signer(account, &self.signer_id);
        let mut modules = Vec::with_capacity(
            1 + self.user_op_policies.len()
                + self.erc1271_policies.len()
                + self.actions.iter().map(|(_, p)| p.len()).sum::<usize>(),
        );

        modules.push(ModuleInstall {
            kind: ModuleKind::Signer,
            module: self.signer.signer,
            session_id,
            install_data: encode_install_data(&session_id, account, &self.signer.init_data),
        });

        let scoped = [
            (PolicyKind::UserOp, &self.user_op_policies),
            (PolicyKind::Erc1271, &self.erc1271_policies),
        ];
        for (kind, list) in scoped {
            for policy in list.iter() {
                modules.push(ModuleInstall {
                    kind: ModuleKind::Policy(kind),
                    module: policy.policy,
                    session_id,
                    install_data: encode_install_data(&session_id, account, &policy.init_data),
                });
            }
        }

        for (action_id, list) in &self.actions {
            let action_session = SessionId::for_action(account, &self.signer_id, action_id);
            for policy in list.iter() {
                modules.push(ModuleInstall {
                    kind: ModuleKind::Policy(PolicyKind::Action),
                    module: policy.policy,
                    session_id: action_session,
                    install_data: encode_install_data(&action_session, account, &policy.init_data),
                });
            }
        }

        modules
    }
}

/// Applies registrations to one account's sessions.
pub struct SessionBuilder<'a> {
    sessions: &'a mut AccountSessions,
}

impl<'a> SessionBuilder<'a> {
    pub fn new(sessions: &'a mut AccountSessions) -> Self {
        Self { sessions }
    }

    /// Registers one session. Re-enabling an existing signer id is rejected.
    pub fn add_session(&mut self, registration: SessionRegistration) -> Result<(), SessionStateError> {
        if self.sessions.is_enabled(&registration.signer_id) {
            return Err(SessionStateError::SessionAlreadyEnabled(registration.signer_id));
        }
        self.sessions.insert(registration);
        Ok(())
    }

    /// Registers several sessions; none are applied if any is rejected.
    pub fn add_sessions(
        &mut self,
        registrations: Vec<SessionRegistration>,
    ) -> Result<(), SessionStateError> {
        let mut seen = HashSet::with_capacity(registrations.len());
        for registration in &registrations {
            if self.sessions.is_enabled(&registration.signer_id) || !seen.insert(registration.signer_id) {
                return Err(SessionStateError::SessionAlreadyEnabled(registration.signer_id));
            }
        }
        for registration in registrations {
            self.sessions.insert(registration);
        }
        Ok(())
    }
}
