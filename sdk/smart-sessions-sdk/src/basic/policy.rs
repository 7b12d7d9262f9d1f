use smart_sessions_state::{ActionId, Address, PolicyData};

/// Action id for calls to `selector` on `target`.
pub fn action_id(target: &Address, selector: [u8; 4]) -> ActionId {
    ActionId::for_call(target, &selector)
}

/// Fluent builder for one policy list of a session.
#[derive(Debug, Default, Clone)]
pub struct PolicyConfigBuilder {
    policies: Vec<PolicyData>,
}

impl PolicyConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a policy to the list.
    /// `policy`: address of the policy module.
    /// `init_data`: handed to the module's install hook.
    pub fn add_policy(mut self, policy: Address, init_data: impl Into<Vec<u8>>) -> Self {
        self.policies.push(PolicyData::new(policy, init_data));
        self
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    pub fn build(self) -> Vec<PolicyData> {
        self.policies
    }
}
