pub mod charts;
pub mod config;
pub mod error;
pub mod folder_structure;
pub mod measurements;
pub mod plots;
pub mod series;
pub mod speedup;
