pub mod memory;
pub mod message_store;
pub mod pool;
pub mod responder_store;
