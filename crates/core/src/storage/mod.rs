pub mod kv;
pub mod selection_store;
