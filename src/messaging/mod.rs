//! # Messaging Module
//!
//! Wire-level message model and the two transport seams the dispatch core
//! consumes: subscribe with a handler callback, and send to a destination.
//! An in-memory implementation backs tests and single-process wiring.

pub mod errors;
pub mod in_memory;
pub mod message;
pub mod transport;

pub use errors::{MessagingError, MessagingResult};
pub use in_memory::InMemoryTransport;
pub use message::{headers, Message, MessageBuilder};
pub use transport::{MessageConsumer, MessageHandler, MessageProducer};
