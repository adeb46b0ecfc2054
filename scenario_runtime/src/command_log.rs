//! Append-only command log: binary protobuf frames.
//!
//! Storage format: length-prefixed protobuf frames.
//!   [4-byte LE length][protobuf bytes][4-byte LE length][protobuf bytes]...
//!
//! Rules:
//!   - Strict append only: no mutation, no deletion, no reordering
//!   - fsync after every write
//!   - Sequence strictly increasing (validated on append)

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use prost::Message;
use thiserror::Error;
use tracing::{debug, warn};

use crate::command::CommandEnvelope;
use crate::proto_bridge::{command_to_proto, proto_to_command, BridgeError};
use crate::proto_types::ProtoCommandEnvelope;

const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum CommandLogError {
    #[error("command log I/O: {0}")]
    Io(#[from] io::Error),

    #[error("sequence violation in command log: expected {expected}, got {got}")]
    SequenceViolation { expected: u64, got: u64 },

    #[error("invalid frame length {0}")]
    FrameLength(usize),

    #[error("truncated frame after sequence {after}")]
    Truncated { after: u64 },

    #[error("protobuf decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// Append-only command log backed by a binary file.
pub struct CommandLog {
    path: PathBuf,
    last_sequence: u64,
}

impl CommandLog {
    /// Open or create a log at `path`. Existing frames are read once to
    /// recover the last sequence number.
    pub fn open(path: &Path) -> Result<Self, CommandLogError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let last_sequence = if path.exists() {
            Self::read_all_from_file(path)?
                .last()
                .map(|c| c.sequence)
                .unwrap_or(0)
        } else {
            0
        };

        Ok(Self {
            path: path.to_path_buf(),
            last_sequence,
        })
    }

    /// Append one command. Its sequence must be exactly `last + 1`.
    pub fn append(&mut self, envelope: &CommandEnvelope) -> Result<(), CommandLogError> {
        let expected = self.last_sequence + 1;
        if envelope.sequence != expected {
            return Err(CommandLogError::SequenceViolation {
                expected,
                got: envelope.sequence,
            });
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let buf = command_to_proto(envelope).encode_to_vec();
        let len = buf.len() as u32;

        {
            let mut writer = BufWriter::new(&mut file);
            writer.write_all(&len.to_le_bytes())?;
            writer.write_all(&buf)?;
            writer.flush()?;
        }
        file.sync_all()?;

        debug!(
            sequence = envelope.sequence,
            command = envelope.command.kind(),
            "command appended"
        );
        self.last_sequence = envelope.sequence;
        Ok(())
    }

    /// All commands in sequence order.
    pub fn load_all(&self) -> Result<Vec<CommandEnvelope>, CommandLogError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        Self::read_all_from_file(&self.path)
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Move the current log aside as `<name>.stale-<last_sequence>` and
    /// continue with an empty one in its place.
    pub fn archive(&mut self) -> Result<(), CommandLogError> {
        if self.path.exists() {
            let mut archived = self.path.clone().into_os_string();
            archived.push(format!(".stale-{}", self.last_sequence));
            warn!(
                from = %self.path.display(),
                last_sequence = self.last_sequence,
                "archiving command log"
            );
            fs::rename(&self.path, PathBuf::from(archived))?;
        }
        self.last_sequence = 0;
        Ok(())
    }

    /// Read every frame, validating length, decoding and ordering.
    fn read_all_from_file(path: &Path) -> Result<Vec<CommandEnvelope>, CommandLogError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut commands: Vec<CommandEnvelope> = Vec::new();
        let mut len_buf = [0u8; 4];

        loop {
            match reader.read_exact(&mut len_buf) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }

            let len = u32::from_le_bytes(len_buf) as usize;
            if len == 0 || len > MAX_FRAME_LEN {
                return Err(CommandLogError::FrameLength(len));
            }

            let after = commands.last().map(|c| c.sequence).unwrap_or(0);
            let mut frame = vec![0u8; len];
            reader
                .read_exact(&mut frame)
                .map_err(|_| CommandLogError::Truncated { after })?;

            let proto = ProtoCommandEnvelope::decode(frame.as_slice())?;
            let envelope = proto_to_command(&proto)?;
            if envelope.sequence != after + 1 {
                return Err(CommandLogError::SequenceViolation {
                    expected: after + 1,
                    got: envelope.sequence,
                });
            }
            commands.push(envelope);
        }

        Ok(commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;

    fn temp_log(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join("scenario_command_log_tests")
            .join(name);
        let _ = fs::remove_dir_all(&dir);
        dir.join("commands.log")
    }

    fn toggle(sequence: u64) -> CommandEnvelope {
        CommandEnvelope {
            sequence,
            command: Command::ToggleDebug,
        }
    }

    #[test]
    fn test_append_then_reopen_recovers_sequence() {
        let path = temp_log("reopen");
        {
            let mut log = CommandLog::open(&path).unwrap();
            log.append(&toggle(1)).unwrap();
            log.append(&toggle(2)).unwrap();
        }
        let log = CommandLog::open(&path).unwrap();
        assert_eq!(log.last_sequence(), 2);
        assert_eq!(log.load_all().unwrap().len(), 2);
    }

    #[test]
    fn test_gap_in_sequence_is_rejected() {
        let path = temp_log("gap");
        let mut log = CommandLog::open(&path).unwrap();
        let err = log.append(&toggle(3)).unwrap_err();
        assert!(matches!(
            err,
            CommandLogError::SequenceViolation { expected: 1, got: 3 }
        ));
        assert_eq!(log.last_sequence(), 0);
    }

    #[test]
    fn test_truncated_tail_is_reported() {
        let path = temp_log("truncated");
        {
            let mut log = CommandLog::open(&path).unwrap();
            log.append(&toggle(1)).unwrap();
        }
        let mut f = OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(&64u32.to_le_bytes()).unwrap();
        f.write_all(&[1, 2, 3]).unwrap();
        drop(f);
        assert!(matches!(
            CommandLog::open(&path),
            Err(CommandLogError::Truncated { after: 1 })
        ));
    }

    #[test]
    fn test_archive_starts_empty_log() {
        let path = temp_log("archive");
        let mut log = CommandLog::open(&path).unwrap();
        log.append(&toggle(1)).unwrap();
        log.archive().unwrap();
        assert_eq!(log.last_sequence(), 0);
        assert!(log.load_all().unwrap().is_empty());
        assert!(path.with_file_name("commands.log.stale-1").exists());
    }
}
