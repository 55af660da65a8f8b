//! Fixed-size overlapping character windows.

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};

/// One chunk of a source document, the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub text: String,
    pub file_path: String,
    /// 0-based position within the source document.
    pub chunk_index: usize,
    /// Number of chunks the source document produced.
    pub total_chunks: usize,
}

/// Chunker configuration. Sizes are counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
    /// Window length (default: 500).
    pub size: usize,
    /// Characters shared by consecutive windows (default: 50).
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            size: 500,
            overlap: 50,
        }
    }
}

impl ChunkerConfig {
    /// # Errors
    ///
    /// Returns `IndexError::Config` unless `0 <= overlap < size`.
    pub fn new(size: usize, overlap: usize) -> Result<Self> {
        let config = Self { size, overlap };
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `IndexError::Config` when the window would never advance.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(IndexError::Config("chunk size must be positive".into()));
        }
        if self.overlap >= self.size {
            return Err(IndexError::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.overlap, self.size
            )));
        }
        Ok(())
    }
}

/// Split `text` into windows of `size` characters advancing by `size - overlap`.
///
/// Text no longer than `size` comes back as a single chunk. The final window is
/// clipped at the end of the text and may be shorter.
///
/// # Errors
///
/// Returns `IndexError::Config` if `overlap >= size` or `size == 0`.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Result<Vec<String>> {
    ChunkerConfig::new(size, overlap)?;

    let total = text.chars().count();
    if total <= size {
        return Ok(vec![text.to_owned()]);
    }

    // Byte offset of every char boundary, including the end of the text.
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();

    let step = size - overlap;
    let mut chunks = Vec::with_capacity(total.div_ceil(step));
    let mut start = 0;
    loop {
        let end = (start + size).min(total);
        chunks.push(text[offsets[start]..offsets[end]].to_owned());
        if end >= total {
            break;
        }
        start += step;
    }
    Ok(chunks)
}

/// Chunk one document and attach its positional metadata.
///
/// # Errors
///
/// Returns `IndexError::Config` for an invalid configuration.
pub fn chunk_document(
    text: &str,
    file_path: &str,
    config: &ChunkerConfig,
) -> Result<Vec<ChunkRecord>> {
    let chunks = chunk_text(text, config.size, config.overlap)?;
    let total_chunks = chunks.len();
    Ok(chunks
        .into_iter()
        .enumerate()
        .map(|(chunk_index, text)| ChunkRecord {
            text,
            file_path: file_path.to_owned(),
            chunk_index,
            total_chunks,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn short_text_is_single_chunk() {
        let chunks = chunk_text("hello", 10, 2).unwrap();
        assert_eq!(chunks, vec!["hello".to_owned()]);
    }

    #[test]
    fn exact_size_is_single_chunk() {
        let text = "a".repeat(500);
        assert_eq!(chunk_text(&text, 500, 50).unwrap(), vec![text]);
    }

    #[test]
    fn empty_text_is_single_empty_chunk() {
        assert_eq!(chunk_text("", 5, 1).unwrap(), vec![String::new()]);
    }

    #[test]
    fn six_hundred_chars_make_two_chunks() {
        let text: String = (0..600).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunks = chunk_text(&text, 500, 50).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 500);
        assert_eq!(chunks[1], text[450..]);
    }

    #[test]
    fn windows_advance_by_size_minus_overlap() {
        let chunks = chunk_text("abcdefghij", 4, 1).unwrap();
        assert_eq!(chunks, vec!["abcd", "defg", "ghij"]);
    }

    #[test]
    fn final_window_may_be_short() {
        let chunks = chunk_text("abcdefghijk", 4, 1).unwrap();
        assert_eq!(chunks, vec!["abcd", "defg", "ghij", "jk"]);
    }

    #[test]
    fn zero_overlap_partitions_text() {
        let chunks = chunk_text("abcdef", 2, 0).unwrap();
        assert_eq!(chunks, vec!["ab", "cd", "ef"]);
    }

    #[test]
    fn multibyte_characters_are_never_split() {
        let text = "héllo wörld ünïcode";
        let chunks = chunk_text(text, 5, 2).unwrap();
        assert!(chunks.iter().all(|c| c.chars().count() <= 5));
        assert_eq!(chunks[0], "héllo");
    }

    #[test]
    fn overlap_not_smaller_than_size_is_rejected() {
        assert!(matches!(
            chunk_text("abcdef", 3, 3),
            Err(IndexError::Config(_))
        ));
        assert!(matches!(
            chunk_text("abcdef", 3, 7),
            Err(IndexError::Config(_))
        ));
        assert!(matches!(chunk_text("abc", 0, 0), Err(IndexError::Config(_))));
    }

    #[test]
    fn chunk_document_assigns_positions() {
        let text = "x".repeat(600);
        let records = chunk_document(&text, "notes/a.md", &ChunkerConfig::default()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].chunk_index, 0);
        assert_eq!(records[1].chunk_index, 1);
        assert!(records.iter().all(|r| r.total_chunks == 2));
        assert!(records.iter().all(|r| r.file_path == "notes/a.md"));
    }

    #[test]
    fn default_config() {
        let config = ChunkerConfig::default();
        assert_eq!(config.size, 500);
        assert_eq!(config.overlap, 50);
        assert!(config.validate().is_ok());
    }

    proptest! {
        #[test]
        fn short_text_round_trips(text in "\\PC{0,40}", extra in 0usize..20, overlap in 0usize..5) {
            let size = text.chars().count() + extra + overlap + 1;
            let chunks = chunk_text(&text, size, overlap).unwrap();
            prop_assert_eq!(chunks, vec![text]);
        }

        #[test]
        fn long_text_is_covered_with_exact_overlap(
            text in "\\PC{20,300}",
            size in 2usize..20,
            overlap_seed in 0usize..20,
        ) {
            let overlap = overlap_seed % size;
            let chars: Vec<char> = text.chars().collect();
            prop_assume!(chars.len() > size);

            let chunks = chunk_text(&text, size, overlap).unwrap();
            let step = size - overlap;

            for (i, chunk) in chunks.iter().enumerate() {
                let expected: String = chars[i * step..(i * step + size).min(chars.len())]
                    .iter()
                    .collect();
                prop_assert_eq!(chunk, &expected);
            }
            for pair in chunks.windows(2) {
                let prev: Vec<char> = pair[0].chars().collect();
                let next: Vec<char> = pair[1].chars().collect();
                prop_assert_eq!(prev.len(), size);
                prop_assert_eq!(&prev[size - overlap..], &next[..overlap.min(next.len())]);
            }
            let last = chunks.len() - 1;
            prop_assert_eq!(last * step + chunks[last].chars().count(), chars.len());
        }
    }
}
