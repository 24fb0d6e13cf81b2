// Encoder collaborators
//
// - commands: encoder command lines and output naming
// - presets: preset discovery from the encoder's own listing

pub mod commands;
pub mod presets;

pub use commands::{shell_quote, EncodeCommand, EncodeCommandBuilder, EncodePlan};
pub use presets::{discover_presets, parse_presets, PresetCatalog, PresetCategory};

use crate::config::EncoderConfig;

/// Builder configured from the encoder settings
pub fn command_builder(config: &EncoderConfig) -> EncodeCommandBuilder {
    EncodeCommandBuilder::new(&config.binary_path, &config.output_tag, &config.container)
}
