mod in_memory_file_repository;
mod postgres_file_repository;

pub use in_memory_file_repository::InMemoryFileRepository;
pub use postgres_file_repository::PostgresFileRepository;
