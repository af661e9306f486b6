use sha2::{Digest, Sha256};

/// Default chunk window, mirrored from the original ingestion pipeline.
pub const DEFAULT_TARGET_CHARS: usize = 400;
pub const DEFAULT_OVERLAP_CHARS: usize = 125;

/// Chunks shorter than this carry no useful signal and are skipped.
const MIN_CHUNK_CHARS: usize = 20;

#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub target_chars: usize,
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_chars: DEFAULT_TARGET_CHARS,
            overlap_chars: DEFAULT_OVERLAP_CHARS,
        }
    }
}

impl ChunkingConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            target_chars: env_usize("CHUNK_TARGET_CHARS", defaults.target_chars),
            overlap_chars: env_usize("CHUNK_OVERLAP_CHARS", defaults.overlap_chars),
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Hex SHA-256 of the chunk content, the dedup/upsert key.
pub fn content_hash(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Rough token estimate for progress accounting (~4 chars per token).
pub fn estimate_tokens(content: &str) -> i32 {
    (content.chars().count() / 4) as i32
}

/// Split text into overlapping windows of at most `target_chars` characters.
/// The window advances by `target - overlap` so neighbouring chunks share
/// context; cuts prefer the last whitespace inside the window so words stay
/// intact.
pub fn split_with_overlap(text: &str, config: ChunkingConfig) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let target = config.target_chars.max(MIN_CHUNK_CHARS);
    let overlap = config.overlap_chars.min(target / 2);

    if chars.len() <= target {
        let trimmed = text.trim();
        if trimmed.chars().count() < MIN_CHUNK_CHARS {
            return Vec::new();
        }
        return vec![trimmed.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < chars.len() {
        let hard_end = (start + target).min(chars.len());
        let end = if hard_end == chars.len() {
            hard_end
        } else {
            // Prefer a whitespace cut in the back half of the window.
            let floor = start + target / 2;
            (floor..hard_end)
                .rev()
                .find(|&i| chars[i].is_whitespace())
                .map(|i| i + 1)
                .unwrap_or(hard_end)
        };

        let chunk: String = chars[start..end].iter().collect();
        let trimmed = chunk.trim();
        if trimmed.chars().count() >= MIN_CHUNK_CHARS {
            chunks.push(trimmed.to_string());
        }

        if end == chars.len() {
            break;
        }
        start = end.saturating_sub(overlap).max(start + 1);
    }

    chunks
}
