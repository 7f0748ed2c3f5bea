//! In-process chat memory — exact and fuzzy completion reuse.
//!
//! [`MemoryStore`] is a plain value owned by whoever constructs it (the
//! server's shared state, a test), not a process-wide singleton. Contents are
//! PII-scrubbed before keying and are not persisted — a restart empties the
//! store.

use serde::Serialize;
use std::collections::HashMap;

use crate::chat::scrub::scrub;

/// One remembered question/answer pair, shared across all users.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryEntry {
    pub key: String,
    /// The scrubbed question text.
    pub question: String,
    pub answer: String,
    pub created_at: String,
    pub last_used: String,
    pub use_count: u32,
}

/// A search hit with its overlap score.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredEntry {
    pub score: f64,
    #[serde(flatten)]
    pub entry: MemoryEntry,
}

/// Aggregate statistics over the store.
#[derive(Debug, Serialize)]
pub struct MemoryStats {
    pub total_entries: usize,
    pub total_usage: u32,
    pub average_usage: f64,
}

pub struct MemoryStore {
    entries: HashMap<String, MemoryEntry>,
    max_entries: usize,
    similarity_threshold: f64,
}

impl MemoryStore {
    pub fn new(max_entries: usize, similarity_threshold: f64) -> Self {
        Self {
            entries: HashMap::new(),
            max_entries,
            similarity_threshold,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store a completion. An existing key is refreshed in place; a new key
    /// may trigger eviction of the lowest-scored tenth of the store.
    pub fn store(&mut self, question: &str, answer: &str) -> MemoryEntry {
        let question = scrub(question);
        let answer = scrub(answer);
        let key = memory_key(&question);
        let now = chrono::Utc::now().to_rfc3339();

        if let Some(existing) = self.entries.get_mut(&key) {
            existing.use_count += 1;
            existing.last_used = now;
            existing.answer = answer;
            return existing.clone();
        }

        let entry = MemoryEntry {
            key: key.clone(),
            question,
            answer,
            created_at: now.clone(),
            last_used: now,
            use_count: 1,
        };
        self.entries.insert(key, entry.clone());

        if self.entries.len() > self.max_entries {
            self.evict();
        }
        entry
    }

    /// Exact key hit, else the first fuzzy match above the threshold.
    /// A hit bumps the entry's usage.
    pub fn retrieve(&mut self, question: &str) -> Option<MemoryEntry> {
        let question = scrub(question);
        let key = memory_key(&question);
        let now = chrono::Utc::now().to_rfc3339();

        if let Some(entry) = self.entries.get_mut(&key) {
            entry.use_count += 1;
            entry.last_used = now;
            return Some(entry.clone());
        }

        // Fuzzy scan, most-used entries first.
        let mut candidates: Vec<&MemoryEntry> = self.entries.values().collect();
        candidates.sort_by(|a, b| b.use_count.cmp(&a.use_count));

        let hit_key = candidates
            .iter()
            .find(|entry| overlap(&question, &entry.question, 3) >= self.similarity_threshold)
            .map(|entry| entry.key.clone())?;

        let entry = self.entries.get_mut(&hit_key)?;
        entry.use_count += 1;
        entry.last_used = now;
        Some(entry.clone())
    }

    /// All entries scoring above zero against `query`, best first.
    pub fn search(&self, query: &str, limit: usize) -> Vec<ScoredEntry> {
        let query = scrub(query);
        let mut scored: Vec<ScoredEntry> = self
            .entries
            .values()
            .map(|entry| ScoredEntry {
                score: overlap(&query, &entry.question, 2),
                entry: entry.clone(),
            })
            .filter(|s| s.score > 0.0)
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        scored
    }

    pub fn stats(&self) -> MemoryStats {
        let total_usage: u32 = self.entries.values().map(|e| e.use_count).sum();
        MemoryStats {
            total_entries: self.entries.len(),
            total_usage,
            average_usage: total_usage as f64 / self.entries.len().max(1) as f64,
        }
    }

    /// Drop the lowest-scored 10% of entries (recency plus usage weight).
    fn evict(&mut self) {
        let mut scored: Vec<(String, i64)> = self
            .entries
            .values()
            .map(|entry| (entry.key.clone(), eviction_score(entry)))
            .collect();
        scored.sort_by_key(|(_, score)| *score);

        let to_remove = (self.max_entries / 10).max(1);
        for (key, _) in scored.into_iter().take(to_remove) {
            self.entries.remove(&key);
        }
        tracing::debug!(removed = to_remove, remaining = self.entries.len(), "evicted memories");
    }
}

/// Oldest and least-used entries score lowest. Each use is worth a second
/// of recency.
fn eviction_score(entry: &MemoryEntry) -> i64 {
    let last_used_millis = chrono::DateTime::parse_from_rfc3339(&entry.last_used)
        .map(|t| t.timestamp_millis())
        .unwrap_or(0);
    last_used_millis + entry.use_count as i64 * 1000
}

/// Key: base36 of a 32-bit string hash over the scrubbed, lowercased text.
pub fn memory_key(question: &str) -> String {
    let clean = question.to_lowercase();
    let mut hash: i32 = 0;
    for ch in clean.trim().chars() {
        hash = hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(ch as i32);
    }
    to_base36(hash.unsigned_abs())
}

fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".into();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).expect("base36 digits are ASCII")
}

/// Token-overlap ratio: shared words longer than `min_len` divided by the
/// larger token count.
fn overlap(a: &str, b: &str, min_len: usize) -> f64 {
    let a_words: Vec<&str> = a.split_whitespace().collect();
    let b_words: Vec<&str> = b.split_whitespace().collect();
    if a_words.is_empty() || b_words.is_empty() {
        return 0.0;
    }

    let a_lower: Vec<String> = a_words.iter().map(|w| w.to_lowercase()).collect();
    let b_lower: Vec<String> = b_words.iter().map(|w| w.to_lowercase()).collect();

    let common = a_lower
        .iter()
        .filter(|word| word.len() > min_len && b_lower.contains(word))
        .count();

    common as f64 / a_words.len().max(b_words.len()) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        MemoryStore::new(1000, 0.8)
    }

    #[test]
    fn store_and_exact_retrieve() {
        let mut memory = store();
        memory.store("tell me about compilers", "Compilers translate source code.");

        let hit = memory.retrieve("tell me about compilers").unwrap();
        assert_eq!(hit.answer, "Compilers translate source code.");
        assert_eq!(hit.use_count, 2); // 1 from store, 1 from retrieve
    }

    #[test]
    fn keying_is_case_insensitive() {
        let mut memory = store();
        memory.store("Tell Me About Compilers", "answer");
        assert!(memory.retrieve("tell me about compilers").is_some());
    }

    #[test]
    fn repeated_store_updates_in_place() {
        let mut memory = store();
        memory.store("what about rust", "old answer");
        memory.store("what about rust", "new answer");

        assert_eq!(memory.len(), 1);
        let hit = memory.retrieve("what about rust").unwrap();
        assert_eq!(hit.answer, "new answer");
        assert_eq!(hit.use_count, 3);
    }

    #[test]
    fn fuzzy_retrieve_above_threshold() {
        let mut memory = store();
        memory.store(
            "please explain quantum computing fundamentals today",
            "Quantum computing uses qubits.",
        );

        // Same long words, one short word differs — overlap stays above 0.8.
        let hit = memory.retrieve("also explain quantum computing fundamentals today");
        assert!(hit.is_some());
    }

    #[test]
    fn fuzzy_miss_below_threshold() {
        let mut memory = store();
        memory.store("explain quantum computing", "answer");
        assert!(memory.retrieve("recommend a good restaurant").is_none());
    }

    #[test]
    fn stored_questions_are_scrubbed() {
        let mut memory = store();
        let entry = memory.store("email me at jane@example.com", "ok");
        assert!(entry.question.contains("[EMAIL]"));
        assert!(!entry.question.contains("jane@example.com"));
    }

    #[test]
    fn search_ranks_by_overlap() {
        let mut memory = store();
        memory.store("rust borrow checker rules", "a");
        memory.store("rust async runtime comparison", "b");
        memory.store("gardening tips for spring", "c");

        let results = memory.search("rust borrow checker", 10);
        assert_eq!(results.len(), 2);
        assert!(results[0].entry.question.contains("borrow"));
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn search_respects_limit() {
        let mut memory = store();
        for i in 0..5 {
            memory.store(&format!("question about rust number {i}"), "a");
        }
        assert_eq!(memory.search("rust question", 2).len(), 2);
    }

    #[test]
    fn eviction_caps_size_and_drops_least_used() {
        let mut memory = MemoryStore::new(10, 0.8);
        for i in 0..10 {
            memory.store(&format!("filler question number {i}"), "a");
        }
        // Make one entry clearly hot
        for _ in 0..50 {
            memory.retrieve("filler question number 0");
        }

        memory.store("one more question entirely", "b");
        assert!(memory.len() <= 10);
        // The hot entry survived eviction
        assert!(memory.retrieve("filler question number 0").is_some());
    }

    #[test]
    fn stats_aggregate_usage() {
        let mut memory = store();
        memory.store("alpha question", "a");
        memory.store("beta question", "b");
        memory.retrieve("alpha question");

        let stats = memory.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.total_usage, 3);
        assert!((stats.average_usage - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn memory_key_is_stable_base36() {
        let a = memory_key("hello world");
        let b = memory_key("hello world");
        let c = memory_key("hello worlds");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.chars().all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit()));
    }
}
