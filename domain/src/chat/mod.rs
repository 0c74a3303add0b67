//! Chat exchange domain types

pub mod stream;

pub use stream::StreamEvent;
