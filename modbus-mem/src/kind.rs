use crate::bank::{Bank, Element};
use crate::map::DeviceMap;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::RwLock;

/// Tag of one of the four banks of a device.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BankKind {
    Coil,
    Input,
    HoldingRegister,
    InputRegister,
}

impl BankKind {
    /// Whether a Modbus master is supposed to modify the bank.
    ///
    /// Discrete inputs and input registers are populated by the owning application only.
    pub fn is_protocol_writable(&self) -> bool {
        matches!(self, BankKind::Coil | BankKind::HoldingRegister)
    }
}

impl Display for BankKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BankKind::Coil => write!(f, "Coil"),
            BankKind::Input => write!(f, "Input"),
            BankKind::HoldingRegister => write!(f, "HoldingRegister"),
            BankKind::InputRegister => write!(f, "InputRegister"),
        }
    }
}

/// Selector of a boolean bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discrete {
    Coil,
    Input,
}

/// Selector of a 16-bit register bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    Holding,
    Input,
}

mod private {
    pub trait Sealed {}

    impl Sealed for super::Discrete {}
    impl Sealed for super::Register {}
}

/// Resolves a selector to the bank of a [`DeviceMap`] it addresses.
///
/// The element type is bound to the selector, so reading registers from a coil bank does not
/// compile.
pub trait Selector: private::Sealed + Copy {
    type Element: Element;

    fn kind(self) -> BankKind;

    #[doc(hidden)]
    fn bank(self, map: &DeviceMap) -> &RwLock<Bank<Self::Element>>;
}

impl Selector for Discrete {
    type Element = bool;

    fn kind(self) -> BankKind {
        match self {
            Discrete::Coil => BankKind::Coil,
            Discrete::Input => BankKind::Input,
        }
    }

    fn bank(self, map: &DeviceMap) -> &RwLock<Bank<bool>> {
        match self {
            Discrete::Coil => &map.coils,
            Discrete::Input => &map.discrete_inputs,
        }
    }
}

impl Selector for Register {
    type Element = u16;

    fn kind(self) -> BankKind {
        match self {
            Register::Holding => BankKind::HoldingRegister,
            Register::Input => BankKind::InputRegister,
        }
    }

    fn bank(self, map: &DeviceMap) -> &RwLock<Bank<u16>> {
        match self {
            Register::Holding => &map.holding_registers,
            Register::Input => &map.input_registers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BankKind, Discrete, Register, Selector};

    #[test]
    fn ut_kind_writable() {
        assert!(BankKind::Coil.is_protocol_writable());
        assert!(BankKind::HoldingRegister.is_protocol_writable());
        assert!(!BankKind::Input.is_protocol_writable());
        assert!(!BankKind::InputRegister.is_protocol_writable());
    }

    #[test]
    fn ut_selector_kind() {
        assert_eq!(Discrete::Coil.kind(), BankKind::Coil);
        assert_eq!(Discrete::Input.kind(), BankKind::Input);
        assert_eq!(Register::Holding.kind(), BankKind::HoldingRegister);
        assert_eq!(Register::Input.kind(), BankKind::InputRegister);
    }

    #[test]
    fn ut_kind_serde() {
        let json = serde_json::to_string(&BankKind::HoldingRegister).unwrap();
        assert_eq!(json, "\"HoldingRegister\"");
        let kind: BankKind = serde_json::from_str("\"Input\"").unwrap();
        assert_eq!(kind, BankKind::Input);
    }
}
