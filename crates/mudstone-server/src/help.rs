//! The help tree: keyword-addressed text from `#HELPS` sections.

use mudstone_area::HelpEntry;
use mudstone_world::is_name;

/// All loaded help entries, in file order. Rebuilt wholesale by
/// `reload helps` and swapped in atomically.
#[derive(Debug, Default)]
pub struct HelpTree {
    entries: Vec<HelpEntry>,
}

impl HelpTree {
    pub fn new(entries: Vec<HelpEntry>) -> Self {
        HelpTree { entries }
    }

    /// Finds the first entry whose keyword list matches and whose level
    /// the requester's trust meets.
    pub fn lookup(&self, keyword: &str, trust: i16) -> Option<&HelpEntry> {
        self.entries
            .iter()
            .find(|h| h.level <= i32::from(trust) && is_name(keyword, &h.keywords))
    }

    /// The pre-login greeting screen, when one is defined.
    pub fn greeting(&self) -> Option<&str> {
        self.entries
            .iter()
            .find(|h| is_name("greeting", &h.keywords))
            .map(|h| h.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(level: i32, keywords: &str, text: &str) -> HelpEntry {
        HelpEntry {
            level,
            keywords: keywords.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn lookup_honors_trust_gates() {
        let tree = HelpTree::new(vec![
            entry(0, "MURDER KILL", "Violence basics."),
            entry(55, "WIZHELP", "Immortal commands."),
        ]);
        assert!(tree.lookup("kill", 1).is_some());
        assert!(tree.lookup("wizhelp", 1).is_none());
        assert!(tree.lookup("wizhelp", 60).is_some());
    }

    #[test]
    fn first_match_wins() {
        let tree = HelpTree::new(vec![
            entry(0, "SUMMON", "first"),
            entry(0, "SUMMON", "second"),
        ]);
        assert_eq!(tree.lookup("summon", 1).unwrap().text, "first");
    }

    #[test]
    fn greeting_is_found_by_keyword() {
        let tree = HelpTree::new(vec![entry(-1, "GREETING", "Welcome!")]);
        assert_eq!(tree.greeting(), Some("Welcome!"));
    }
}
