use crate::access::Data;
use crate::error::Error;
use crate::kind::BankKind;
use crate::layout::MAX_USABLE;
use crate::slice::{slice_run, update_run};
use std::fmt::Debug;

/// Element type storable in a [`Bank`].
pub trait Element: Copy + Default + Debug + PartialEq + Send + Sync + 'static {
    fn into_data(values: Vec<Self>) -> Data;
}

impl Element for bool {
    fn into_data(values: Vec<Self>) -> Data {
        Data::Bits(values)
    }
}

impl Element for u16 {
    fn into_data(values: Vec<Self>) -> Data {
        Data::Words(values)
    }
}

/// Index addressable sequence of elements of a single type.
///
/// Slot 0 is a reserved sentinel that is never used. The protocol address `A` is stored at the
/// index `A + 1`, hence a bank always holds at least one slot. The size of a bank only changes
/// on an explicit [`Bank::resize`]. Slots beyond [`MAX_USABLE`] cannot be addressed by the
/// protocol and are never allocated.
#[derive(Debug, Clone)]
pub struct Bank<T: Element> {
    kind: BankKind,
    buffer: Vec<T>,
}

impl<T: Element> Bank<T> {
    /// Create a bank with `usable` default initialized slots after the sentinel.
    pub fn new(kind: BankKind, usable: usize) -> Self {
        Self {
            kind,
            buffer: vec![T::default(); usable.min(MAX_USABLE) + 1],
        }
    }

    /// Create a bank whose usable slots hold `values` starting at protocol address 0.
    pub fn from_values(kind: BankKind, values: &[T]) -> Self {
        let mut buffer = Vec::with_capacity(values.len() + 1);
        buffer.push(T::default());
        buffer.extend_from_slice(values);
        Self { kind, buffer }
    }

    pub fn kind(&self) -> BankKind {
        self.kind
    }

    /// Number of slots including the sentinel.
    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    /// Number of protocol addressable slots.
    pub fn usable(&self) -> usize {
        self.buffer.len() - 1
    }

    /// Contents of all protocol addressable slots.
    pub fn values(&self) -> &[T] {
        &self.buffer[1..]
    }

    /// Change the number of usable slots, keeping the existing contents where possible.
    pub fn resize(&mut self, usable: usize) {
        self.buffer.resize(usable.min(MAX_USABLE) + 1, T::default());
    }

    pub(crate) fn check(&self, start: usize, count: usize) -> Result<(), Error> {
        let size = self.size();
        match start.checked_add(count) {
            Some(end) if start < size && end <= size => Ok(()),
            end => Err(Error::AddressOutOfRange {
                kind: self.kind,
                start,
                end: end.unwrap_or(usize::MAX),
                size,
            }),
        }
    }

    /// Copy `count` elements beginning at the internal index `start`.
    ///
    /// Even an empty run has to start at an allocated slot.
    pub fn slice(&self, start: usize, count: usize) -> Result<Vec<T>, Error> {
        self.check(start, count)?;
        Ok(slice_run(&self.buffer, start, count))
    }

    /// Replace the run beginning at the internal index `start` with `items`.
    ///
    /// The bank is left untouched if the run is out of range.
    pub fn overwrite(&mut self, start: usize, items: &[T]) -> Result<(), Error> {
        self.check(start, items.len())?;
        update_run(items, &mut self.buffer, start);
        Ok(())
    }
}
