pub mod csrf;
pub mod flash;
pub mod permissions;
pub mod token;
pub mod validation;
