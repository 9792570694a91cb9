//! In-memory transport replaying scripted device output.
use std::collections::VecDeque;

use crate::{Result, SimpleRead, SimpleWrite, Transport, err::Error};

/// Replays device bytes in order and records everything the host writes.
///
/// Input resets are only counted: the script models bytes the device sends in the future, so nothing is dropped.
#[derive(Debug, Default)]
pub struct ScriptedPort {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    resets: usize,
}

impl ScriptedPort {
    pub fn new(script: impl IntoIterator<Item = u8>) -> Self {
        Self {
            rx: script.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Append more device output.
    pub fn push(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes);
    }

    /// Everything written by the host so far.
    pub fn written(&self) -> &[u8] {
        &self.tx
    }

    /// Scripted bytes not consumed yet.
    pub fn remaining(&self) -> usize {
        self.rx.len()
    }

    pub fn resets(&self) -> usize {
        self.resets
    }
}

impl SimpleRead for ScriptedPort {
    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        if buf.is_empty() {
            return Ok(());
        }
        if self.rx.is_empty() {
            return Err(Error::Timeout {
                expected: buf.len(),
            });
        }

        let got = buf.len().min(self.rx.len());
        for (dst, src) in buf.iter_mut().zip(self.rx.drain(..got)) {
            *dst = src;
        }

        if got < buf.len() {
            Err(Error::ShortRead {
                expected: buf.len(),
                got,
            })
        } else {
            Ok(())
        }
    }
}

impl SimpleWrite for ScriptedPort {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.tx.extend_from_slice(buf);
        Ok(buf.len())
    }
}

impl Transport for ScriptedPort {
    fn reset_input_buffer(&mut self) -> Result<()> {
        self.resets += 1;
        Ok(())
    }
}
