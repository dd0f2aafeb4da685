pub mod audit_trail;
pub mod crypt_service;
pub mod file_resolver;
pub mod key_codec;
pub mod output_namer;
pub mod private_key_service;
pub mod recipient_service;
