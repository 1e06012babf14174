use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bytecode::program::Program;
use crate::config::Limits;

const MAGIC: [u8; 4] = *b"RCZ1";

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("failed to encode image: {0}")]
    Encode(#[source] postcard::Error),

    #[error("failed to decode image: {0}")]
    Decode(#[source] postcard::Error),

    #[error("not a program image (bad magic)")]
    BadMagic,
}

/// A compiled program saved to disk together with the limits it was
/// compiled under.
///
/// Loading an image does not make its code trusted; run it through
/// `stack_check::check_code` first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    magic: [u8; 4],
    pub code: Vec<u8>,
    pub locals: usize,
    pub limits: Limits,
}

impl Image {
    pub fn from_program(program: &Program, limits: &Limits) -> Self {
        Image {
            magic: MAGIC,
            code: program.code().to_vec(),
            locals: program.locals(),
            limits: *limits,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ImageError> {
        postcard::to_allocvec(self).map_err(ImageError::Encode)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ImageError> {
        let image: Image = postcard::from_bytes(bytes).map_err(ImageError::Decode)?;
        if image.magic != MAGIC {
            return Err(ImageError::BadMagic);
        }
        log::debug!(
            "loaded image: {} bytes of code, {} locals",
            image.code.len(),
            image.locals
        );
        Ok(image)
    }

    pub fn into_program(self) -> Program {
        Program::from_raw(self.code, self.locals)
    }
}
