pub mod decrypt;
pub mod encrypt;
pub mod log;
pub mod private_key;
pub mod recipients;
pub mod serve;
pub mod status;
