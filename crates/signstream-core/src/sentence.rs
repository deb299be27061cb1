//! Sentence assembly with repeat-suppression cooldown.

use std::collections::HashMap;

/// Per-session ordered word list. Each distinct token remembers when it was
/// last appended so a held sign cannot flood the sentence with duplicates.
pub struct SentenceAssembler {
    words: Vec<String>,
    last_appended: HashMap<String, f64>,
    cooldown_secs: f64,
}

impl SentenceAssembler {
    pub fn new(cooldown_secs: f64) -> Self {
        Self {
            words: Vec::new(),
            last_appended: HashMap::new(),
            cooldown_secs,
        }
    }

    /// Append a confirmed word at timestamp `t` (seconds). A token appended
    /// again within the cooldown window is a no-op. Returns whether the word
    /// was actually appended.
    pub fn append(&mut self, label: &str, t: f64) -> bool {
        if let Some(&last) = self.last_appended.get(label) {
            if t - last < self.cooldown_secs {
                return false;
            }
        }
        self.words.push(label.to_string());
        self.last_appended.insert(label.to_string(), t);
        true
    }

    /// Ordered read-only view of the confirmed words.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Space-joined sentence for outbound messages.
    pub fn text(&self) -> String {
        self.words.join(" ")
    }

    /// Empty the word list. Cooldown timestamps survive a clear so a sign
    /// still held in front of the camera cannot instantly repopulate the
    /// sentence the user just wiped.
    pub fn clear(&mut self) {
        self.words.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_in_order() {
        let mut s = SentenceAssembler::new(1.0);
        assert!(s.append("HELLO", 0.0));
        assert!(s.append("ME", 0.5));
        assert_eq!(s.text(), "HELLO ME");
    }

    #[test]
    fn suppresses_repeat_within_cooldown() {
        let mut s = SentenceAssembler::new(1.0);
        assert!(s.append("YES", 10.0));
        assert!(!s.append("YES", 10.9));
        assert_eq!(s.words(), ["YES"]);
    }

    #[test]
    fn accepts_repeat_after_cooldown() {
        let mut s = SentenceAssembler::new(1.0);
        assert!(s.append("YES", 10.0));
        assert!(s.append("YES", 11.0));
        assert_eq!(s.words(), ["YES", "YES"]);
    }

    #[test]
    fn cooldown_is_per_distinct_token() {
        let mut s = SentenceAssembler::new(1.0);
        assert!(s.append("YES", 10.0));
        assert!(s.append("NO", 10.2));
        assert!(!s.append("YES", 10.5));
        assert_eq!(s.text(), "YES NO");
    }

    #[test]
    fn clear_empties_words_but_keeps_cooldown_history() {
        let mut s = SentenceAssembler::new(1.0);
        s.append("GO", 5.0);
        s.clear();
        assert!(s.is_empty());
        assert_eq!(s.text(), "");
        // A sign still held within the cooldown cannot repopulate the
        // sentence immediately after the wipe.
        assert!(!s.append("GO", 5.1));
        assert!(s.append("GO", 6.1));
    }
}
