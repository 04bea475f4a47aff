/// Trait providing the `panic()` method that calls the given function and panics with the returned
/// message
///
/// This trait exists to provide the same as `expect()` but with the advantage that you have the
/// error available to include the error into the panic message.
pub trait Expect<F: FnOnce(Self::Error) -> String> {
    type Value;
    type Error;

    fn panic(self, f: F) -> Self::Value;
}

impl<T, E, F: FnOnce(E) -> String> Expect<F> for Result<T, E> {
    type Value = T;
    type Error = E;
    fn panic(self, f: F) -> Self::Value {
        match self {
            Ok(v) => v,
            Err(e) => panic!("{}", f(e)),
        }
    }
}
