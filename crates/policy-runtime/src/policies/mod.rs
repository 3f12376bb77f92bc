//! # Write Policies
//!
//! A [`Pipeline`] runs its policies in order and returns the first reply that
//! is not `accept`. Later policies never see an event an earlier one refused.

mod allow_list;
mod vanish;

pub use allow_list::{AllowList, AllowListPolicy, NOT_AUTHORIZED};
pub use vanish::VanishPolicy;

use async_trait::async_trait;
use shared_types::{PolicyReply, PolicyRequest};

/// One decision step.
#[async_trait]
pub trait Policy: Send {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Decides `request`. The reply id must echo `request.event.id`.
    async fn evaluate(&mut self, request: &PolicyRequest) -> PolicyReply;
}

/// Ordered list of policies.
#[derive(Default)]
pub struct Pipeline {
    policies: Vec<Box<dyn Policy>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, policy: impl Policy + 'static) -> Self {
        self.policies.push(Box::new(policy));
        self
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.policies.iter().map(|p| p.name()).collect()
    }

    /// First non-accept reply, else accept.
    pub async fn evaluate(&mut self, request: &PolicyRequest) -> PolicyReply {
        for policy in &mut self.policies {
            let reply = policy.evaluate(request).await;
            if !reply.is_accept() {
                tracing::debug!(
                    policy = policy.name(),
                    id = %request.event.id,
                    action = reply.action.as_str(),
                    "Policy refused event"
                );
                return reply;
            }
        }
        PolicyReply::accept(&request.event.id)
    }
}
