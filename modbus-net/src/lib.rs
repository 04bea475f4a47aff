mod handler;

pub mod rtu;
pub mod tcp;

pub use handler::{Handler, exception};
