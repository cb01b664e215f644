pub mod message_record;
pub mod responder;
