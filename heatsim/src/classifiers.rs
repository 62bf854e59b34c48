//! Classifiers

// Modules
pub mod heatmap;
