mod display_name;
mod file_id;
mod file_state;
mod owner_id;
mod storage_key;

pub use display_name::DisplayName;
pub use file_id::FileId;
pub use file_state::FileState;
pub use owner_id::OwnerId;
pub use storage_key::StorageKey;
