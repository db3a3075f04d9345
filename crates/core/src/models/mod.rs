pub mod asset;
pub mod history;
pub mod selection;
pub mod settings;

pub(crate) mod loose;
