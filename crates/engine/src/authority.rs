//! Authority gating for privileged operations.

use alloy::primitives::Address;
use flashbot_venues::ExecutionError;
use tracing::info;

/// The single identity permitted to initiate loans and manage the engine.
#[derive(Debug, Clone, Copy)]
pub struct AuthorityGate {
    authority: Address,
}

impl AuthorityGate {
    pub fn new(authority: Address) -> Self {
        Self { authority }
    }

    pub fn authority(&self) -> Address {
        self.authority
    }

    /// Check `caller` before any side effect of a privileged operation.
    pub fn ensure(&self, caller: Address) -> Result<(), ExecutionError> {
        if caller != self.authority {
            return Err(ExecutionError::CallerNotAuthorized(caller));
        }
        Ok(())
    }

    /// Hand the authority to `new_authority`. Only the current authority may
    /// do this, and never to the zero address.
    pub fn transfer(&mut self, caller: Address, new_authority: Address) -> Result<(), ExecutionError> {
        self.ensure(caller)?;
        if new_authority == Address::ZERO {
            return Err(ExecutionError::InvalidTarget);
        }
        info!(old = %self.authority, new = %new_authority, "authority transferred");
        self.authority = new_authority;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_rejects_non_authority() {
        let gate = AuthorityGate::new(Address::repeat_byte(1));
        gate.ensure(Address::repeat_byte(1)).unwrap();
        assert!(matches!(
            gate.ensure(Address::repeat_byte(2)).unwrap_err(),
            ExecutionError::CallerNotAuthorized(_)
        ));
    }

    #[test]
    fn test_transfer_rules() {
        let mut gate = AuthorityGate::new(Address::repeat_byte(1));
        // Outsiders cannot transfer.
        assert!(gate
            .transfer(Address::repeat_byte(2), Address::repeat_byte(3))
            .is_err());
        // Zero target rejected.
        assert_eq!(
            gate.transfer(Address::repeat_byte(1), Address::ZERO)
                .unwrap_err(),
            ExecutionError::InvalidTarget
        );
        // Proper hand-off; old authority loses access.
        gate.transfer(Address::repeat_byte(1), Address::repeat_byte(3))
            .unwrap();
        assert!(gate.ensure(Address::repeat_byte(1)).is_err());
        assert!(gate.ensure(Address::repeat_byte(3)).is_ok());
    }
}
