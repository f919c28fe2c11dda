mod directory;
mod repository;

pub use directory::GameDirectory;
pub use repository::GameRepository;
