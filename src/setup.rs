use std::path::PathBuf;
use tracing::{debug, info};

use crate::error::{HardbrakeError, Result};

/// An external program the tool shells out to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredProgram {
    pub name: String,
    pub purpose: String,
    pub install_hint: String,
}

impl RequiredProgram {
    pub fn new<S1: Into<String>, S2: Into<String>, S3: Into<String>>(
        name: S1,
        purpose: S2,
        install_hint: S3,
    ) -> Self {
        Self {
            name: name.into(),
            purpose: purpose.into(),
            install_hint: install_hint.into(),
        }
    }
}

/// Resolve one program on the search path
pub fn locate(program: &RequiredProgram) -> Result<PathBuf> {
    which::which(&program.name).map_err(|e| {
        debug!("{} not found: {}", program.name, e);
        HardbrakeError::Environment {
            program: program.name.clone(),
            hint: format!("{} {}", program.purpose, program.install_hint),
        }
    })
}

/// Check every program, reporting all missing ones in a single error
pub fn ensure_installed(programs: &[RequiredProgram]) -> Result<Vec<PathBuf>> {
    let mut found = Vec::with_capacity(programs.len());
    let mut missing = Vec::new();

    for program in programs {
        match locate(program) {
            Ok(path) => {
                debug!("Found {} at {}", program.name, path.display());
                found.push(path);
            }
            Err(_) => missing.push(program),
        }
    }

    if missing.is_empty() {
        info!("All required programs are installed");
        return Ok(found);
    }

    Err(HardbrakeError::Environment {
        program: missing
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        hint: missing
            .iter()
            .map(|p| format!("\n  - {}: {} {}", p.name, p.purpose, p.install_hint))
            .collect::<String>(),
    })
}
