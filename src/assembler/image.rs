//! The output image: a fixed-capacity run of 16-bit words written
//! front to back through a cursor.
use super::error::ErrorKind;

/// Maximum number of words a single assembly run may produce.
pub const IMAGE_CAPACITY: usize = 65536;

pub struct Image {
    words: Vec<u16>,
    cursor: usize,
}

impl Image {
    pub fn new() -> Self {
        Image { words: vec![0; IMAGE_CAPACITY], cursor: 0 }
    }

    /// Offset of the next word to be written.
    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Writes `word` at the cursor and advances it.
    pub fn append(&mut self, word: u16) -> Result<(), ErrorKind> {
        if self.cursor >= IMAGE_CAPACITY {
            return Err(ErrorKind::ImageCapacityExceeded(IMAGE_CAPACITY));
        }
        self.words[self.cursor] = word;
        self.cursor += 1;
        Ok(())
    }

    /// Returns a previously written word.
    pub fn word(&self, location: usize) -> Option<u16> {
        self.words().get(location).copied()
    }

    /// Overwrites a previously written word. Only forward-reference
    /// patching should need this.
    pub fn rewrite(&mut self, location: usize, word: u16) -> Result<(), ErrorKind> {
        if location >= self.cursor {
            return Err(ErrorKind::InvalidPatchLocation(location));
        }
        self.words[location] = word;
        Ok(())
    }

    /// The written prefix of the image.
    pub fn words(&self) -> &[u16] {
        &self.words[..self.cursor]
    }

    /// The written prefix as big-endian bytes, ready to be stored.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.cursor * 2);
        for word in self.words() {
            out.extend_from_slice(&word.to_be_bytes());
        }
        out
    }
}
