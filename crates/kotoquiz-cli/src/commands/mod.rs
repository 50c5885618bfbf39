pub mod gold;
pub mod init;
pub mod play;
pub mod profile;
pub mod validate;
