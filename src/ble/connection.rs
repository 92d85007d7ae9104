//! Active link tracking
//!
//! The peripheral and central roles each hold at most one link. The most
//! recently established one is the link that `disconnect` acts on.

use core::cell::RefCell;

use defmt::{debug, info, warn};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use nrf_softdevice::ble::Connection;

use crate::ble::events::{self, BleEvent, Role};
use crate::error::EnrfError;

/// HCI: remote user terminated connection
pub const HCI_REMOTE_USER_TERMINATED: u8 = 0x13;
/// HCI: connection terminated by local host
pub const HCI_LOCAL_HOST_TERMINATED: u8 = 0x16;

/// Reason reported for a link that went down
pub fn disconnect_reason(local: bool) -> u8 {
    if local {
        HCI_LOCAL_HOST_TERMINATED
    } else {
        HCI_REMOTE_USER_TERMINATED
    }
}

fn role_index(role: Role) -> usize {
    match role {
        Role::Peripheral => 0,
        Role::Central => 1,
    }
}

/// One link slot per role
pub struct LinkTable<C> {
    slots: [Option<C>; 2],
    /// A local disconnect was requested for the slot
    local: [bool; 2],
    /// Role of the most recent link
    last: Option<Role>,
}

impl<C: Clone> LinkTable<C> {
    pub const fn new() -> Self {
        Self {
            slots: [None, None],
            local: [false, false],
            last: None,
        }
    }

    /// Take the slot of `role`; fails with `NoFreeConnection` while it holds
    /// a link
    pub fn connect(&mut self, role: Role, link: C) -> Result<(), EnrfError> {
        let index = role_index(role);
        if self.slots[index].is_some() {
            return Err(EnrfError::NoFreeConnection);
        }
        self.slots[index] = Some(link);
        self.local[index] = false;
        self.last = Some(role);
        Ok(())
    }

    /// Free the slot of `role`, returning the HCI reason to report, `None`
    /// when it held no link
    pub fn release(&mut self, role: Role) -> Option<u8> {
        let index = role_index(role);
        self.slots[index].take()?;
        let reason = disconnect_reason(core::mem::take(&mut self.local[index]));
        // At most the other role is left
        self.last = [Role::Peripheral, Role::Central]
            .into_iter()
            .find(|r| self.slots[role_index(*r)].is_some());
        Some(reason)
    }

    /// Record that we are closing the link of `role`
    pub fn mark_local(&mut self, role: Role, local: bool) {
        self.local[role_index(role)] = local;
    }

    pub fn get(&self, role: Role) -> Option<C> {
        self.slots[role_index(role)].clone()
    }

    /// Most recently established link still up
    pub fn current(&self) -> Option<(Role, C)> {
        let role = self.last?;
        self.get(role).map(|link| (role, link))
    }

    pub fn count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

impl<C: Clone> Default for LinkTable<C> {
    fn default() -> Self {
        Self::new()
    }
}

static LINKS: Mutex<CriticalSectionRawMutex, RefCell<LinkTable<Connection>>> =
    Mutex::new(RefCell::new(LinkTable::new()));

/// Record a new link and publish `Connected`
///
/// A second link for a role that already has one is closed again.
pub fn set_connected(role: Role, conn: &Connection) -> Result<(), EnrfError> {
    info!("{} link up, handle {:?}", role, conn.handle());
    if let Err(e) = LINKS.lock(|links| links.borrow_mut().connect(role, conn.clone())) {
        warn!("No {} slot left, dropping link", role);
        let _ = conn.disconnect();
        return Err(e);
    }
    events::publish(BleEvent::Connected { role });
    Ok(())
}

/// Forget a link after its run loop ended and publish `Disconnected`
pub fn set_disconnected(role: Role) {
    let Some(reason) = LINKS.lock(|links| links.borrow_mut().release(role)) else {
        return;
    };
    info!("{} link down, reason {=u8:#x}", role, reason);
    events::publish(BleEvent::Disconnected { role, reason });
}

/// Link of one role
pub fn get(role: Role) -> Option<Connection> {
    LINKS.lock(|links| links.borrow().get(role))
}

/// Most recently established link still up
pub fn current() -> Option<(Role, Connection)> {
    LINKS.lock(|links| links.borrow().current())
}

pub fn is_connected() -> bool {
    current().is_some()
}

/// Disconnect the current link
pub fn disconnect() -> Result<(), EnrfError> {
    let (role, conn) = current().ok_or(EnrfError::NotConnected)?;
    disconnect_conn(role, &conn)
}

/// Disconnect every link, used before a reset
pub fn disconnect_all() {
    for role in [Role::Peripheral, Role::Central] {
        if let Some(conn) = get(role) {
            let _ = disconnect_conn(role, &conn);
        }
    }
}

fn disconnect_conn(role: Role, conn: &Connection) -> Result<(), EnrfError> {
    debug!("Disconnecting {} link", role);
    LINKS.lock(|links| links.borrow_mut().mark_local(role, true));
    conn.disconnect().map_err(|e| {
        LINKS.lock(|links| links.borrow_mut().mark_local(role, false));
        EnrfError::from(e)
    })
}
