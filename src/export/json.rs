use super::ExportError;
use crate::engine::Replay;
use crate::state::AccountState;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const STEPS_FILE: &str = "steps.json";
pub const FINAL_STATE_FILE: &str = "final_state.json";

/// The full `(event, state)` sequence as an array of `{event, state}` objects.
pub fn write_steps(path: &Path, replay: &Replay) -> Result<PathBuf, ExportError> {
    write_pretty(path, &replay.steps)
}

pub fn write_final_state(path: &Path, state: &AccountState) -> Result<PathBuf, ExportError> {
    write_pretty(path, state)
}

fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<PathBuf, ExportError> {
    let file = File::create(path).map_err(|e| ExportError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush().map_err(|e| ExportError::io(path, e))?;
    Ok(path.to_path_buf())
}
