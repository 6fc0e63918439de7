//! Font file loading

use rustybuzz::ttf_parser;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{FontError, FontResult};

/// Raw bytes of a font file
#[derive(Debug, Clone)]
pub struct FontData {
    path: PathBuf,
    bytes: Vec<u8>,
    index: u32,
}

impl FontData {
    /// Read the font at `path`, checking that it parses.
    pub fn open(path: &Path) -> FontResult<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(path, bytes, 0)
    }

    pub fn from_bytes(path: &Path, bytes: Vec<u8>, index: u32) -> FontResult<Self> {
        ttf_parser::Face::parse(&bytes, index).map_err(|e| FontError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!("Loaded font {} ({} bytes)", path.display(), bytes.len());
        Ok(Self {
            path: path.to_path_buf(),
            bytes,
            index,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name matched by test `only`/`exclude` filters.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Hex SHA-256 of the font file
    pub fn sha256(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }

    pub fn face(&self) -> FontResult<rustybuzz::Face<'_>> {
        rustybuzz::Face::from_slice(&self.bytes, self.index).ok_or_else(|| FontError::Parse {
            path: self.path.clone(),
            reason: "cannot build shaping face".to_string(),
        })
    }
}
