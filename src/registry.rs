//! Output channel registry
//!
//! The hardware exposes a small fixed set of output channels. Each may
//! drive at most one ring at a time, so construction goes through an
//! explicit claim instead of silently reusing a channel slot.

use core::cell::RefCell;
use core::fmt;

use critical_section::Mutex;
use log::error;

/// Number of hardware output channels.
pub const CHANNEL_COUNT: usize = 8;

/// Identifier of one hardware output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelId(u8);

impl ChannelId {
    /// Validates a raw channel number. Returns `None` outside the
    /// hardware's channel range.
    pub const fn new(id: u8) -> Option<Self> {
        if (id as usize) < CHANNEL_COUNT {
            Some(Self(id))
        } else {
            None
        }
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// The channel already has a live claim.
    ChannelInUse,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChannelInUse => write!(f, "channel is already in use"),
        }
    }
}

/// Tracks which output channels currently have a live claim.
pub struct ChannelRegistry {
    claimed: Mutex<RefCell<[bool; CHANNEL_COUNT]>>,
}

impl ChannelRegistry {
    pub const fn new() -> Self {
        Self {
            claimed: Mutex::new(RefCell::new([false; CHANNEL_COUNT])),
        }
    }

    /// Claim exclusive use of a channel. Fails while a previous claim on
    /// the same channel is still alive.
    pub fn claim(&self, id: ChannelId) -> Result<ChannelClaim<'_>, RegistryError> {
        let taken = critical_section::with(|cs| {
            let mut slots = self.claimed.borrow(cs).borrow_mut();
            let taken = slots[id.index()];
            slots[id.index()] = true;
            taken
        });
        if taken {
            error!("channel {id} is already in use");
            return Err(RegistryError::ChannelInUse);
        }
        Ok(ChannelClaim { registry: self, id })
    }

    fn release(&self, id: ChannelId) {
        critical_section::with(|cs| {
            self.claimed.borrow(cs).borrow_mut()[id.index()] = false;
        });
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive claim on one output channel, released when dropped.
pub struct ChannelClaim<'a> {
    registry: &'a ChannelRegistry,
    id: ChannelId,
}

impl ChannelClaim<'_> {
    pub const fn id(&self) -> ChannelId {
        self.id
    }
}

impl Drop for ChannelClaim<'_> {
    fn drop(&mut self) {
        self.registry.release(self.id);
    }
}
