use crate::access::Access;
use crate::bank::{Bank, Element};
use crate::error::Error;
use crate::kind::{BankKind, Selector};
use crate::layout::Layout;
use crate::notify::Hook;
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};

/// Decides whether protocol writes to discrete inputs and input registers are accepted.
///
/// Modbus has no function code writing either of these banks, so the policy only affects callers
/// that use [`DeviceMap::write_to`] directly, e.g. observers or application code.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WritePolicy {
    /// Every bank accepts writes.
    #[default]
    Permissive,
    /// Writes to [`BankKind::Input`] and [`BankKind::InputRegister`] fail with
    /// [`Error::ReadOnly`].
    Strict,
}

/// Protocol address to internal bank index. Slot 0 is the sentinel.
fn index(address: u16) -> usize {
    address as usize + 1
}

/// The four banks of a slave device together with the access hooks.
///
/// Every bank is guarded by its own lock, so one read or write of a bank is never interleaved
/// with a write of the same bank. Observers are called after the lock has been released and
/// receive the data as it was while the lock was held.
#[derive(Debug)]
pub struct DeviceMap {
    pub(crate) coils: RwLock<Bank<bool>>,
    pub(crate) discrete_inputs: RwLock<Bank<bool>>,
    pub(crate) holding_registers: RwLock<Bank<u16>>,
    pub(crate) input_registers: RwLock<Bank<u16>>,
    policy: WritePolicy,
    on_read: Hook,
    on_write: Hook,
}

impl DeviceMap {
    pub fn new(layout: &Layout) -> Self {
        Self {
            coils: RwLock::new(Bank::new(BankKind::Coil, layout.coils)),
            discrete_inputs: RwLock::new(Bank::new(BankKind::Input, layout.discrete_inputs)),
            holding_registers: RwLock::new(Bank::new(
                BankKind::HoldingRegister,
                layout.holding_registers,
            )),
            input_registers: RwLock::new(Bank::new(
                BankKind::InputRegister,
                layout.input_registers,
            )),
            policy: WritePolicy::default(),
            on_read: Hook::default(),
            on_write: Hook::default(),
        }
    }

    pub fn with_policy(mut self, policy: WritePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> WritePolicy {
        self.policy
    }

    /// Observers called after every successful [`DeviceMap::read_from`].
    pub fn on_read(&self) -> &Hook {
        &self.on_read
    }

    /// Observers called after every successful [`DeviceMap::write_to`].
    pub fn on_write(&self) -> &Hook {
        &self.on_write
    }

    /// Read `count` elements starting at the protocol address `address`.
    pub fn read_from<S: Selector>(
        &self,
        selector: S,
        address: u16,
        count: usize,
    ) -> Result<Vec<S::Element>, Error> {
        let values = selector
            .bank(self)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .slice(index(address), count)?;
        let access = Access::new(
            address,
            selector.kind(),
            <S::Element as Element>::into_data(values.clone()),
        );
        self.on_read.fire(self, &access)?;
        Ok(values)
    }

    /// Write `items` starting at the protocol address `address` on behalf of a master.
    pub fn write_to<S: Selector>(
        &self,
        selector: S,
        address: u16,
        items: &[S::Element],
    ) -> Result<(), Error> {
        let kind = selector.kind();
        self.check_policy(kind)?;
        self.store(selector, address, items)?;
        let access = Access::new(
            address,
            kind,
            <S::Element as Element>::into_data(items.to_vec()),
        );
        self.on_write.fire(self, &access)
    }

    /// Replace the element at `address` with `f(current)` on behalf of a master.
    ///
    /// Read, combination and store happen under a single lock of the bank. Only the write is
    /// notified, carrying the stored value, which is also returned.
    pub fn modify<S, F>(&self, selector: S, address: u16, f: F) -> Result<S::Element, Error>
    where
        S: Selector,
        F: FnOnce(S::Element) -> S::Element,
    {
        let kind = selector.kind();
        self.check_policy(kind)?;
        let value = {
            let mut bank = selector
                .bank(self)
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let current = bank.slice(index(address), 1)?;
            let value = f(current[0]);
            bank.overwrite(index(address), &[value])?;
            value
        };
        let access = Access::new(
            address,
            kind,
            <S::Element as Element>::into_data(vec![value]),
        );
        self.on_write.fire(self, &access)?;
        Ok(value)
    }

    /// Write `items` at `write_address`, then read `count` elements from `read_address`.
    ///
    /// Both runs are validated before the bank is modified and both accesses happen under a
    /// single lock of the bank. The write observers are notified before the read observers.
    pub fn write_read<S: Selector>(
        &self,
        selector: S,
        write_address: u16,
        items: &[S::Element],
        read_address: u16,
        count: usize,
    ) -> Result<Vec<S::Element>, Error> {
        let kind = selector.kind();
        self.check_policy(kind)?;
        let values = {
            let mut bank = selector
                .bank(self)
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            bank.check(index(read_address), count)?;
            bank.overwrite(index(write_address), items)?;
            bank.slice(index(read_address), count)?
        };
        let access = Access::new(
            write_address,
            kind,
            <S::Element as Element>::into_data(items.to_vec()),
        );
        self.on_write.fire(self, &access)?;
        let access = Access::new(
            read_address,
            kind,
            <S::Element as Element>::into_data(values.clone()),
        );
        self.on_read.fire(self, &access)?;
        Ok(values)
    }

    fn check_policy(&self, kind: BankKind) -> Result<(), Error> {
        if self.policy == WritePolicy::Strict && !kind.is_protocol_writable() {
            Err(Error::ReadOnly(kind))
        } else {
            Ok(())
        }
    }

    /// Write `items` on behalf of the owning application.
    ///
    /// Ignores the write policy and does not notify any observer.
    pub fn populate<S: Selector>(
        &self,
        selector: S,
        address: u16,
        items: &[S::Element],
    ) -> Result<(), Error> {
        self.store(selector, address, items)
    }

    fn store<S: Selector>(
        &self,
        selector: S,
        address: u16,
        items: &[S::Element],
    ) -> Result<(), Error> {
        selector
            .bank(self)
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .overwrite(index(address), items)
    }

    /// Copy of all protocol addressable slots of a bank.
    pub fn snapshot<S: Selector>(&self, selector: S) -> Vec<S::Element> {
        selector
            .bank(self)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .to_vec()
    }

    /// Number of protocol addressable slots of a bank.
    pub fn usable<S: Selector>(&self, selector: S) -> usize {
        selector
            .bank(self)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .usable()
    }

    pub fn resize<S: Selector>(&self, selector: S, usable: usize) {
        selector
            .bank(self)
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .resize(usable);
    }
}
