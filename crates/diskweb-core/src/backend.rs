//! Backend command mapping.
//!
//! The storage backend accepts text commands wrapped in JSON
//! (`{"command": "..."}`) and answers with `{"output": "..."}`. This module
//! maps a resolved [`Screen`] to the command that fetches its content. The
//! transport is left to the caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::StorageAddress;
use crate::navigator::Screen;

/// Prefix the backend puts in front of failed command output.
const ERROR_PREFIX: &str = "Error:";

/// An argument value the command syntax cannot carry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("argument {flag} is empty")]
    EmptyArgument { flag: &'static str },

    #[error("argument {flag} contains a quote or line break")]
    UnquotableArgument { flag: &'static str },
}

/// Request body sent to the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: String,
}

/// Response body returned by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub output: String,
}

impl CommandResponse {
    /// Lines of output that report a failed command.
    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.output
            .lines()
            .filter_map(|line| line.strip_prefix(ERROR_PREFIX))
            .map(str::trim)
    }

    pub fn is_error(&self) -> bool {
        self.errors().next().is_some()
    }
}

/// One backend command with `-flag="value"` arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendCommand {
    name: &'static str,
    args: Vec<(&'static str, String)>,
}

impl BackendCommand {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            args: Vec::new(),
        }
    }

    fn arg(mut self, flag: &'static str, value: impl Into<String>) -> Result<Self, CommandError> {
        let value = value.into();
        if value.is_empty() {
            return Err(CommandError::EmptyArgument { flag });
        }
        if value.contains(['"', '\n', '\r']) {
            return Err(CommandError::UnquotableArgument { flag });
        }
        self.args.push((flag, value));
        Ok(self)
    }

    /// Command that loads the content shown by `screen`.
    ///
    /// Login and landing screens need nothing from the backend.
    pub fn for_screen(screen: &Screen) -> Result<Option<Self>, CommandError> {
        let Screen::Storage(address) = screen else {
            return Ok(None);
        };

        let command = match address {
            StorageAddress::Root | StorageAddress::Disk { .. } => Self::new("disks"),
            StorageAddress::Partitions { disk_path } => {
                Self::new("partitions").arg("path", disk_path.decode())?
            }
            StorageAddress::Directory {
                mount_id,
                internal_path,
            } => Self::new("content")
                .arg("id", mount_id.as_str())?
                .arg("ruta", internal_path.decode())?,
            StorageAddress::FileView {
                mount_id,
                file_path,
            } => Self::new("cat")
                .arg("id", mount_id.as_str())?
                .arg("path", file_path.decode())?,
        };
        Ok(Some(command))
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Command line as the backend parses it.
    pub fn to_line(&self) -> String {
        let mut line = self.name.to_string();
        for (flag, value) in &self.args {
            line.push_str(&format!(" -{}=\"{}\"", flag, value));
        }
        line
    }

    pub fn to_request(&self) -> CommandRequest {
        CommandRequest {
            command: self.to_line(),
        }
    }
}
