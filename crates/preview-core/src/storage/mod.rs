pub mod directory;

pub use directory::DirectorySnapshotProvider;
