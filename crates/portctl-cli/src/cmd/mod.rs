pub mod check;
pub mod env;
pub mod init;
pub mod migrate;
pub mod show;
pub mod validate;
