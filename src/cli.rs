use clap::Parser;

/// Pick videos and a HandBrake preset, then encode them one by one with live progress
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Run a demo batch of synthetic jobs instead of the interactive session
    #[arg(long)]
    pub test: bool,
}
