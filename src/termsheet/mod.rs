// src/termsheet/mod.rs
pub mod download;
pub mod html;
pub mod sections;
pub mod view;

// Re-export key presentation types for convenience
pub use download::DownloadArtifact;
pub use view::TermSheetView;
