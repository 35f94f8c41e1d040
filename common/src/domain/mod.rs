pub mod plugin;
pub mod timestamp;

pub use plugin::{PluginInput, PluginManifest, PluginOutput, PluginProvenance, PluginSummary};
