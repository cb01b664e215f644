pub mod admin_dto;
pub mod message_dto;
