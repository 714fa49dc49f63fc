//! Movement lock state.
//!
//! A scooter can be immobilised for several reasons at once (an admin
//! deactivation on top of a battery lock, say), so lock reasons are
//! independent tags rather than a single variant.  "Deactivated" is the
//! derived condition: some reason currently owns a movement lock.
//!
//! The `owner` is the reason whose lock was installed first; it decides the
//! activity label the lock override reports (an admin lock echoes the
//! current status, a battery lock reports `needCharging`, an out-of-bounds
//! lock reports `deactivated`).  Later reasons only add their tag.

/// Why a scooter's movement is locked.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LockReason {
    Admin,
    Battery,
    OutOfBounds,
}

/// Per-scooter lock tags plus the installed owner.
#[derive(Copy, Clone, Debug, Default)]
pub struct LockState {
    pub admin: bool,
    pub battery: bool,
    pub out_of_bounds: bool,
    /// The reason that installed the movement lock, if any.
    pub owner: Option<LockReason>,
}

impl LockState {
    /// True when any reason holds the scooter locked.
    #[inline]
    pub fn is_deactivated(&self) -> bool {
        self.owner.is_some()
    }

    /// Tag a reason, installing it as owner if nothing is locked yet.
    /// Returns true when this call installed the lock.
    pub fn engage(&mut self, reason: LockReason) -> bool {
        let installed = if self.owner.is_none() {
            self.owner = Some(reason);
            true
        } else {
            false
        };
        match reason {
            LockReason::Admin       => self.admin = true,
            LockReason::Battery     => self.battery = true,
            LockReason::OutOfBounds => self.out_of_bounds = true,
        }
        installed
    }

    /// Drop the admin tag; the movement lock is released only when no other
    /// reason still holds it.
    pub fn release_admin(&mut self) {
        if !self.admin {
            return;
        }
        self.admin = false;
        if self.battery || self.out_of_bounds {
            return;
        }
        self.owner = None;
    }

    /// Drop every tag and the owner (admin `available` reset).
    pub fn clear(&mut self) {
        *self = LockState::default();
    }
}
