use crate::kind::BankKind;
use itertools::Itertools;
use std::fmt::Display;

/// Elements read from or written to a bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Data {
    Bits(Vec<bool>),
    Words(Vec<u16>),
}

impl Data {
    pub fn len(&self) -> usize {
        match self {
            Data::Bits(v) => v.len(),
            Data::Words(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Display for Data {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Data::Bits(v) => write!(f, "[ {} ]", v.iter().map(|b| u8::from(*b)).join(", ")),
            Data::Words(v) => write!(
                f,
                "[ {} ]",
                v.iter().map(|w| format!("{:#06X}", w)).join(", ")
            ),
        }
    }
}

/// Record of one completed read or write passed to the access observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Access {
    address: u16,
    kind: BankKind,
    data: Data,
}

impl Access {
    pub fn new(address: u16, kind: BankKind, data: Data) -> Self {
        Self {
            address,
            kind,
            data,
        }
    }

    /// Protocol (0-based) start address of the access.
    pub fn address(&self) -> u16 {
        self.address
    }

    pub fn kind(&self) -> BankKind {
        self.kind
    }

    pub fn data(&self) -> &Data {
        &self.data
    }
}

impl Display for Access {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: [{:#06X}, {:#06X}) = {}",
            self.kind,
            self.address,
            self.address as usize + self.data.len(),
            self.data
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{Access, Data};
    use crate::kind::BankKind;

    #[test]
    fn ut_access_display() {
        let access = Access::new(0x10, BankKind::HoldingRegister, Data::Words(vec![42, 0xBEEF]));
        assert_eq!(
            access.to_string(),
            "HoldingRegister: [0x0010, 0x0012) = [ 0x002A, 0xBEEF ]"
        );

        let access = Access::new(3, BankKind::Coil, Data::Bits(vec![true, false, true]));
        assert_eq!(access.to_string(), "Coil: [0x0003, 0x0006) = [ 1, 0, 1 ]");
    }

    #[test]
    fn ut_data_len() {
        assert_eq!(Data::Bits(vec![true; 3]).len(), 3);
        assert!(Data::Words(vec![]).is_empty());
    }
}
