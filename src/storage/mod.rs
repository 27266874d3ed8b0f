mod board_store;
mod file_storage;
mod transfer;

pub use board_store::{BoardStore, IMPORT_REPAIR_NOTE};
pub use file_storage::JsonFileStorage;
pub use transfer::{export_to_text, import_from_text, validate_board_value, ImportReport};
