use uuid::Uuid;

use crate::{error::AppError, middleware::auth::Caller};

/// Operation kinds the gate distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Update,
    Delete,
}

impl Action {
    pub fn is_read(&self) -> bool {
        matches!(self, Action::Read)
    }
}

/// A single named permission rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Reads for everyone, writes for the creator.
    OwnerOrReadOnly,
    /// Anything for a privileged identity.
    SuperUser,
}

impl Capability {
    pub fn permits(&self, caller: &Caller, action: Action, owner: Uuid) -> bool {
        match self {
            Capability::OwnerOrReadOnly => {
                action.is_read() || caller.user().is_some_and(|user| user.user_id == owner)
            }
            Capability::SuperUser => caller.is_superuser(),
        }
    }
}

/// Capabilities combined with logical OR.
#[derive(Debug, Clone, Copy)]
pub struct Gate(pub &'static [Capability]);

/// Gate for reads and writes on an existing advertisement.
pub const ADVERTISEMENT_GATE: Gate = Gate(&[Capability::OwnerOrReadOnly, Capability::SuperUser]);

impl Gate {
    pub fn permits(&self, caller: &Caller, action: Action, owner: Uuid) -> bool {
        self.0
            .iter()
            .any(|capability| capability.permits(caller, action, owner))
    }

    pub fn authorize(&self, caller: &Caller, action: Action, owner: Uuid) -> Result<(), AppError> {
        if self.permits(caller, action, owner) {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}
