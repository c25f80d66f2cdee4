//! Streaming RIFF chunk writer with in-place size patching.

use std::io::{Seek, SeekFrom, Write};

use recaster_core::MuxError;

use crate::fourcc::LIST;
use crate::FourCc;

/// An open chunk: where its size field lives in the output.
#[must_use = "an open chunk must be closed with end_chunk"]
#[derive(Debug)]
pub(crate) struct OpenChunk {
    size_pos: u64,
}

/// Writes RIFF chunks to a seekable sink.
///
/// Tracks the output position itself so that only chunk closes seek.
pub(crate) struct ChunkWriter<W: Write + Seek> {
    inner: W,
    pos: u64,
}

impl<W: Write + Seek> ChunkWriter<W> {
    pub(crate) fn new(mut inner: W) -> Result<Self, MuxError> {
        let pos = inner.stream_position()?;
        Ok(Self { inner, pos })
    }

    pub(crate) fn position(&self) -> u64 {
        self.pos
    }

    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), MuxError> {
        self.inner.write_all(bytes)?;
        self.pos += bytes.len() as u64;
        Ok(())
    }

    pub(crate) fn write_fourcc(&mut self, id: &FourCc) -> Result<(), MuxError> {
        self.write_bytes(id)
    }

    /// Emit `id` and a zero size placeholder.
    pub(crate) fn begin_chunk(&mut self, id: &FourCc) -> Result<OpenChunk, MuxError> {
        self.write_fourcc(id)?;
        let size_pos = self.pos;
        self.write_bytes(&0u32.to_le_bytes())?;
        Ok(OpenChunk { size_pos })
    }

    /// Open a `LIST` chunk whose payload starts with `kind`.
    pub(crate) fn begin_list(&mut self, kind: &FourCc) -> Result<OpenChunk, MuxError> {
        let list = self.begin_chunk(&LIST)?;
        self.write_fourcc(kind)?;
        Ok(list)
    }

    /// Patch the chunk's size field and pad odd payloads with one zero byte.
    ///
    /// Returns the declared payload size.
    pub(crate) fn end_chunk(&mut self, chunk: OpenChunk) -> Result<u32, MuxError> {
        let end = self.pos;
        let payload = end - (chunk.size_pos + 4);
        let size = u32::try_from(payload).map_err(|_| MuxError::TooLarge { bytes: end })?;

        self.inner.seek(SeekFrom::Start(chunk.size_pos))?;
        self.inner.write_all(&size.to_le_bytes())?;
        self.inner.seek(SeekFrom::Start(end))?;

        if size & 1 != 0 {
            self.write_bytes(&[0])?;
        }
        Ok(size)
    }

    /// A complete leaf chunk.
    pub(crate) fn write_chunk(&mut self, id: &FourCc, payload: &[u8]) -> Result<u32, MuxError> {
        let chunk = self.begin_chunk(id)?;
        self.write_bytes(payload)?;
        self.end_chunk(chunk)
    }

    pub(crate) fn flush(&mut self) -> Result<(), MuxError> {
        self.inner.flush()?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> W {
        self.inner
    }
}
