pub mod audit_entry;
pub mod file_target;
pub mod key_material;
pub mod private_key;
pub mod recipient;
