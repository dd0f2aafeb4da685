pub mod json_private_key_store;
pub mod json_recipient_store;
pub mod json_table;
