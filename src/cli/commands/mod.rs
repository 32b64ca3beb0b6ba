pub mod device;
pub mod health;
pub mod init;
