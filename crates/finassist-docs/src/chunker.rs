use std::collections::VecDeque;

/// Recursive character splitter.
///
/// Splits on the coarsest separator present in the text (paragraphs, then
/// lines, then words, then characters), recursing into pieces that are still
/// too long, and merges adjacent pieces back up to `chunk_size` characters
/// with `chunk_overlap` characters carried between consecutive chunks.
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

impl TextChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
            separators: ["\n\n", "\n", " ", ""].iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, &self.separators)
    }

    fn split_with(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = separators.last().cloned().unwrap_or_default();
        let mut remaining: &[String] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = String::new();
                break;
            }
            if text.contains(sep.as_str()) {
                separator = sep.clone();
                remaining = &separators[i + 1..];
                break;
            }
        }

        let pieces: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator.as_str())
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect()
        };

        let mut chunks = Vec::new();
        let mut short: Vec<String> = Vec::new();
        for piece in pieces {
            if char_len(&piece) < self.chunk_size {
                short.push(piece);
                continue;
            }
            if !short.is_empty() {
                chunks.extend(self.merge(&short, &separator));
                short.clear();
            }
            if remaining.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_with(&piece, remaining));
            }
        }
        if !short.is_empty() {
            chunks.extend(self.merge(&short, &separator));
        }
        chunks
    }

    fn merge(&self, pieces: &[String], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);
            let joiner = if current.is_empty() { 0 } else { sep_len };
            if total + len + joiner > self.chunk_size && !current.is_empty() {
                push_joined(&mut chunks, &current, separator);
                // Drop from the front until only the overlap remains and the next piece fits.
                loop {
                    let joiner = if current.is_empty() { 0 } else { sep_len };
                    let must_shrink = total > self.chunk_overlap
                        || (total + len + joiner > self.chunk_size && total > 0);
                    if !must_shrink {
                        break;
                    }
                    let Some(first) = current.pop_front() else {
                        break;
                    };
                    let freed = char_len(first) + if current.is_empty() { 0 } else { sep_len };
                    total = total.saturating_sub(freed);
                }
            }
            total += len + if current.is_empty() { 0 } else { sep_len };
            current.push_back(piece);
        }

        if !current.is_empty() {
            push_joined(&mut chunks, &current, separator);
        }
        chunks
    }
}

fn push_joined(chunks: &mut Vec<String>, current: &VecDeque<&str>, separator: &str) {
    let joined = current.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_single_chunk() {
        let chunker = TextChunker::new(1000, 200);
        assert_eq!(chunker.split("Revenue grew 12%."), vec!["Revenue grew 12%."]);
    }

    #[test]
    fn words_merge_up_to_chunk_size() {
        let chunker = TextChunker::new(10, 0);
        assert_eq!(chunker.split("aaaa bbbb cccc"), vec!["aaaa bbbb", "cccc"]);
    }

    #[test]
    fn overlap_repeats_trailing_piece() {
        let chunker = TextChunker::new(10, 5);
        assert_eq!(chunker.split("aaaa bbbb cccc"), vec!["aaaa bbbb", "bbbb cccc"]);
    }

    #[test]
    fn paragraphs_split_before_words() {
        let chunker = TextChunker::new(30, 0);
        let text = "First paragraph here.\n\nSecond paragraph here.";
        assert_eq!(
            chunker.split(text),
            vec!["First paragraph here.", "Second paragraph here."]
        );
    }

    #[test]
    fn unbroken_text_falls_back_to_characters() {
        let chunker = TextChunker::new(10, 0);
        assert_eq!(
            chunker.split("abcdefghijklmnop"),
            vec!["abcdefghij", "klmnop"]
        );
    }

    #[test]
    fn chunks_never_exceed_size() {
        let chunker = TextChunker::new(50, 10);
        let text = "The quarterly report shows revenue growth across segments. "
            .repeat(20);
        let chunks = chunker.split(&text);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 50));
    }

    #[test]
    fn overlap_is_clamped_below_chunk_size() {
        let chunker = TextChunker::new(10, 50);
        assert_eq!(chunker.chunk_overlap(), 9);
    }
}
