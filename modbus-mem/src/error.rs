use crate::kind::BankKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested run is not fully backed by allocated slots of the bank.
    ///
    /// `start` and `end` are internal (sentinel based) indices, `size` includes the sentinel.
    #[error("Range [{start}, {end}) out of bounds for {kind} bank of size {size}")]
    AddressOutOfRange {
        kind: BankKind,
        start: usize,
        end: usize,
        size: usize,
    },

    #[error("{0} bank is read-only for protocol writes")]
    ReadOnly(BankKind),

    #[error("Access observer failed [{0}]")]
    Observer(anyhow::Error),
}

impl Error {
    pub fn is_address_out_of_range(&self) -> bool {
        matches!(self, Error::AddressOutOfRange { .. })
    }
}
