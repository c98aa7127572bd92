mod download_file;
mod lookup_files;
mod rename_file;
mod upload_file;

pub use download_file::DownloadFileUseCase;
pub use lookup_files::FileLookupService;
pub use rename_file::RenameFileUseCase;
pub use upload_file::{UploadFileUseCase, UploadSettings};
