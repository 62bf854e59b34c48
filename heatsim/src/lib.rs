//! Hierarchical heat map simulator (`heatsim`)

// Modules
pub mod classifiers;
pub mod config;
pub mod data;
pub mod geometry;
pub mod sim;
pub mod trace;

// Exports
pub use self::{
	classifiers::heatmap::HeatMap,
	config::Config,
	geometry::{GeometryError, TierGeometry, TierSpec},
	sim::{Classifier, Simulator},
	trace::{AccessEvent, TraceReader},
};
