use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::errors::{AppError, AppResult};
use crate::models::domain::passage::UNKNOWN_LANGUAGE;
use crate::models::domain::Passage;

pub const DEFAULT_SEPARATORS: [&str; 5] = ["\n\n", "\n", ".", " ", ""];
const MIN_LANGUAGE_CHARS: usize = 20;

/// Splits text on the first separator that occurs in it, recursing into
/// pieces that are still too long with the remaining separators, then packs
/// the pieces into chunks of at most `chunk_size` characters that overlap
/// by up to `chunk_overlap` characters.
#[derive(Clone, Debug)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        let separators: Vec<&str> = self.separators.iter().map(String::as_str).collect();
        self.split_with(text, &separators)
    }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let position = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(position).copied().unwrap_or("");
        let remaining = separators.get(position + 1..).unwrap_or(&[]);

        let pieces: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split_inclusive(separator).collect()
        };

        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();
        for piece in pieces {
            if char_len(piece) <= self.chunk_size {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                chunks.extend(self.merge(&fitting));
                fitting.clear();
            }
            if remaining.is_empty() {
                chunks.push(piece.trim().to_string());
            } else {
                chunks.extend(self.split_with(piece, remaining));
            }
        }
        if !fitting.is_empty() {
            chunks.extend(self.merge(&fitting));
        }

        chunks.retain(|c| !c.is_empty());
        chunks
    }

    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size && !window.is_empty() {
                push_chunk(&mut chunks, &window);
                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    match window.pop_front() {
                        Some(front) => total -= char_len(front),
                        None => break,
                    }
                }
            }
            window.push_back(piece);
            total += len;
        }
        push_chunk(&mut chunks, &window);

        chunks
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn push_chunk(chunks: &mut Vec<String>, window: &VecDeque<&str>) {
    let chunk = window.iter().copied().collect::<String>().trim().to_string();
    if !chunk.is_empty() {
        chunks.push(chunk);
    }
}

/// ISO 639-3 code of the dominant language, or `"unknown"` when the text is
/// too short to classify or detection fails.
pub fn detect_language(text: &str) -> String {
    let significant = text.chars().filter(|c| !c.is_whitespace()).count();
    if significant < MIN_LANGUAGE_CHARS {
        return UNKNOWN_LANGUAGE.to_string();
    }
    whatlang::detect(text)
        .map(|info| info.lang().code().to_string())
        .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string())
}

/// Reads course documents from disk and cuts them into language-tagged passages.
pub struct DocumentLoader {
    splitter: RecursiveSplitter,
}

impl DocumentLoader {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            splitter: RecursiveSplitter::new(chunk_size, chunk_overlap),
        }
    }

    pub async fn load(&self, path: &Path) -> AppResult<Vec<Passage>> {
        let text = read_document(path).await?;
        let passages = self.split_text(&text, &path.to_string_lossy());
        log::info!("Loaded {} passages from {}", passages.len(), path.display());
        Ok(passages)
    }

    pub fn split_text(&self, text: &str, source: &str) -> Vec<Passage> {
        self.splitter
            .split(text)
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| {
                let language = detect_language(&chunk);
                Passage::new(&chunk, source, i).with_language(&language)
            })
            .collect()
    }
}

async fn read_document(path: &Path) -> AppResult<String> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("pdf") => {
            let owned: PathBuf = path.to_path_buf();
            tokio::task::spawn_blocking(move || pdf_extract::extract_text(&owned))
                .await
                .map_err(|e| AppError::InternalError(format!("pdf extraction task failed: {}", e)))?
                .map_err(|e| {
                    log::error!("Error reading pdf file {}: {}", path.display(), e);
                    AppError::DocumentError(format!("error reading pdf file: {}", e))
                })
        }
        Some("txt") => tokio::fs::read_to_string(path).await.map_err(|e| {
            log::error!("Error reading text file {}: {}", path.display(), e);
            AppError::DocumentError(format!("error reading text file: {}", e))
        }),
        _ => Err(AppError::DocumentError(format!(
            "unsupported file type: {}",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_chunk() {
        let splitter = RecursiveSplitter::new(100, 20);
        assert_eq!(splitter.split("  A short paragraph.  "), vec!["A short paragraph."]);
    }

    #[test]
    fn paragraphs_are_preferred_split_points() {
        let text = format!("{}\n\n{}", "a".repeat(40), "b".repeat(40));
        let chunks = RecursiveSplitter::new(50, 0).split(&text);

        assert_eq!(chunks, vec!["a".repeat(40), "b".repeat(40)]);
    }

    #[test]
    fn chunks_respect_size_limit() {
        let text = "word ".repeat(500);
        let chunks = RecursiveSplitter::new(100, 20).split(&text);

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 100));
    }

    #[test]
    fn adjacent_chunks_overlap() {
        let text = (0..60).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        let chunks = RecursiveSplitter::new(40, 15).split(&text);

        assert!(chunks.len() > 2);
        for pair in chunks.windows(2) {
            let last_word = pair[0].split_whitespace().last().expect("word");
            assert!(pair[1].contains(last_word), "{:?} / {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn unbroken_text_falls_back_to_characters() {
        let text = "x".repeat(25);
        let chunks = RecursiveSplitter::new(10, 0).split(&text);

        assert_eq!(chunks, vec!["x".repeat(10), "x".repeat(10), "x".repeat(5)]);
    }

    #[test]
    fn multibyte_text_is_split_on_char_boundaries() {
        let text = "ăîșțâ".repeat(10);
        let chunks = RecursiveSplitter::new(7, 2).split(&text);
        assert!(chunks.iter().all(|c| c.chars().count() <= 7));
    }

    #[test]
    fn language_is_unknown_for_short_text() {
        assert_eq!(detect_language("too short"), UNKNOWN_LANGUAGE);
    }

    #[test]
    fn language_detects_english() {
        let text = "The stack is a data structure that follows the last in first out principle, \
                    which means the most recently added element is removed first.";
        assert_eq!(detect_language(text), "eng");
    }

    #[test]
    fn passages_carry_source_and_order() {
        let loader = DocumentLoader::new(60, 10);
        let text = "First paragraph about stacks and their uses.\n\n\
                    Second paragraph about queues in scheduling.";
        let passages = loader.split_text(text, "notes.txt");

        assert_eq!(passages.len(), 2);
        assert_eq!(passages[0].source, "notes.txt");
        assert_eq!(passages[1].chunk_index, 1);
    }

    #[tokio::test]
    async fn unsupported_extension_is_a_document_error() {
        let loader = DocumentLoader::new(1000, 200);
        let err = loader
            .load(Path::new("slides.pptx"))
            .await
            .expect_err("pptx is unsupported");

        assert!(matches!(err, AppError::DocumentError(_)));
    }

    #[tokio::test]
    async fn missing_text_file_is_a_document_error() {
        let loader = DocumentLoader::new(1000, 200);
        let err = loader
            .load(Path::new("/nonexistent/notes.txt"))
            .await
            .expect_err("missing file");

        assert!(matches!(err, AppError::DocumentError(_)));
    }
}
