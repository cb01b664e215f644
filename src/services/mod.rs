pub mod export_service;
pub mod message_service;
pub mod responder_service;
