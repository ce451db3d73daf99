//! Request-scoped caller identity
//!
//! The caller decides who is making a request and whether they hold admin
//! rights; the ladder only enforces that decision.

use crate::error::{LadderError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// May register players and record matches
    Admin,
    /// Read-only access
    Viewer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub actor: String,
    pub role: Role,
}

impl RequestContext {
    pub fn admin(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            role: Role::Admin,
        }
    }

    pub fn viewer(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            role: Role::Viewer,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(LadderError::Unauthorized {
                actor: self.actor.clone(),
            }
            .into())
        }
    }
}
