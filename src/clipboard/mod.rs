use std::io::{self, Write};
use std::process::{Command, Stdio};

use thiserror::Error;

const WL_COPY_COMMAND: &str = "wl-copy";

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("failed to run wl-copy command: {command}")]
    CommandIo {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("wl-copy exited with non-zero status: {status}")]
    CommandFailed { status: String },
}

pub type ClipboardResult<T> = std::result::Result<T, ClipboardError>;

pub trait ClipboardBackend {
    fn write_text(&self, text: &str) -> ClipboardResult<()>;
}

/// Wayland clipboard via the `wl-copy` helper, fed over stdin.
#[derive(Debug, Default)]
pub struct WlCopyBackend;

impl ClipboardBackend for WlCopyBackend {
    fn write_text(&self, text: &str) -> ClipboardResult<()> {
        let mut child = Command::new(WL_COPY_COMMAND)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|err| ClipboardError::CommandIo {
                command: WL_COPY_COMMAND.to_string(),
                source: err,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .map_err(|err| ClipboardError::CommandIo {
                    command: WL_COPY_COMMAND.to_string(),
                    source: err,
                })?;
        }

        let status = child.wait().map_err(|err| ClipboardError::CommandIo {
            command: WL_COPY_COMMAND.to_string(),
            source: err,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(ClipboardError::CommandFailed {
                status: status.to_string(),
            })
        }
    }
}
