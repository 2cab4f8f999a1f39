pub mod upload;
pub mod watch;
