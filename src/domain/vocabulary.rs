// ============================================================
// Layer 3 — Vocabulary Domain Type
// ============================================================
// A bidirectional symbol ↔ ID table for one side of the corpus
// (source or target). Every symbol is a single character.
//
// The first four IDs are reserved and always present:
//
//   0 → <pad>   filler after the end of a sequence
//   1 → <unk>   any symbol the vocabulary has never seen
//   2 → <eos>   end of a target sequence
//   3 → <sos>   start of a target sequence
//
// New symbols get dense IDs from 4 upwards in the order they are
// first looked up with `extend = true`. Nothing is ever removed,
// so an ID handed out once stays valid for the whole run.

use std::collections::HashMap;

pub const PAD_TOKEN: &str = "<pad>";
pub const UNK_TOKEN: &str = "<unk>";
pub const EOS_TOKEN: &str = "<eos>";
pub const SOS_TOKEN: &str = "<sos>";

/// IDs of the reserved tokens shared by every vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialTokens {
    pub pad:     u32,
    pub unknown: u32,
    pub end:     u32,
    pub start:   u32,
}

impl Default for SpecialTokens {
    fn default() -> Self {
        Self { pad: 0, unknown: 1, end: 2, start: 3 }
    }
}

#[derive(Debug, Clone)]
pub struct Vocabulary {
    id_to_symbol: Vec<String>,
    symbol_to_id: HashMap<String, u32>,
    specials:     SpecialTokens,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}

impl Vocabulary {
    /// Create a vocabulary holding only the four reserved tokens.
    pub fn new() -> Self {
        let mut vocab = Self {
            id_to_symbol: Vec::new(),
            symbol_to_id: HashMap::new(),
            specials:     SpecialTokens::default(),
        };
        // Order matters: the position in this list is the ID.
        for token in [PAD_TOKEN, UNK_TOKEN, EOS_TOKEN, SOS_TOKEN] {
            vocab.insert(token);
        }
        vocab
    }

    fn insert(&mut self, symbol: &str) -> u32 {
        let id = self.id_to_symbol.len() as u32;
        self.id_to_symbol.push(symbol.to_string());
        self.symbol_to_id.insert(symbol.to_string(), id);
        id
    }

    /// Return the ID of `symbol`.
    ///
    /// Unknown symbols are added when `extend` is true and mapped
    /// to `<unk>` otherwise. This never fails.
    pub fn lookup(&mut self, symbol: &str, extend: bool) -> u32 {
        if let Some(&id) = self.symbol_to_id.get(symbol) {
            return id;
        }
        if extend {
            self.insert(symbol)
        } else {
            self.specials.unknown
        }
    }

    /// Read-only lookup, `None` if the symbol was never added.
    pub fn id(&self, symbol: &str) -> Option<u32> {
        self.symbol_to_id.get(symbol).copied()
    }

    pub fn symbol(&self, id: u32) -> Option<&str> {
        self.id_to_symbol.get(id as usize).map(String::as_str)
    }

    /// Number of known symbols, reserved tokens included.
    pub fn len(&self) -> usize {
        self.id_to_symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_symbol.is_empty()
    }

    pub fn specials(&self) -> SpecialTokens {
        self.specials
    }

    /// Map every character of `text` to an ID, one symbol per char.
    pub fn encode(&mut self, text: &str, extend: bool) -> Vec<u32> {
        let mut buf = [0u8; 4];
        text.chars()
            .map(|c| self.lookup(c.encode_utf8(&mut buf), extend))
            .collect()
    }

    /// Like `encode(text, false)` but without needing `&mut self`.
    pub fn encode_known(&self, text: &str) -> Vec<u32> {
        let mut buf = [0u8; 4];
        text.chars()
            .map(|c| self.id(c.encode_utf8(&mut buf)).unwrap_or(self.specials.unknown))
            .collect()
    }

    /// Turn predicted IDs back into text.
    ///
    /// Stops at the first `<eos>`, drops `<pad>` and `<sos>`, and
    /// renders IDs outside the table as `<unk>`.
    pub fn decode(&self, ids: &[u32]) -> String {
        let mut out = String::new();
        for &id in ids {
            if id == self.specials.end {
                break;
            }
            if id == self.specials.pad || id == self.specials.start {
                continue;
            }
            out.push_str(self.symbol(id).unwrap_or(UNK_TOKEN));
        }
        out
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_tokens_occupy_first_ids() {
        let vocab = Vocabulary::new();
        assert_eq!(vocab.len(), 4);
        assert_eq!(vocab.id(PAD_TOKEN), Some(0));
        assert_eq!(vocab.id(UNK_TOKEN), Some(1));
        assert_eq!(vocab.id(EOS_TOKEN), Some(2));
        assert_eq!(vocab.id(SOS_TOKEN), Some(3));
    }

    #[test]
    fn test_extend_then_lookup_returns_same_id() {
        let mut vocab = Vocabulary::new();
        let a = vocab.lookup("a", true);
        let b = vocab.lookup("b", true);
        assert_eq!(a, 4);
        assert_eq!(b, 5);
        assert_eq!(vocab.lookup("a", false), a);
        assert_eq!(vocab.lookup("b", false), b);
        assert_eq!(vocab.symbol(a), Some("a"));
    }

    #[test]
    fn test_unknown_without_extend_maps_to_unk() {
        let mut vocab = Vocabulary::new();
        assert_eq!(vocab.lookup("z", false), 1);
        // A failed lookup must not grow the table
        assert_eq!(vocab.len(), 4);
    }

    #[test]
    fn test_corpus_content_cannot_displace_reserved_ids() {
        let mut vocab = Vocabulary::new();
        vocab.encode("<pad>xyz", true);
        assert_eq!(vocab.id(PAD_TOKEN), Some(0));
        assert_eq!(vocab.id(SOS_TOKEN), Some(3));
        assert_eq!(vocab.id("<"), Some(4));
    }

    #[test]
    fn test_encode_assigns_ids_in_first_seen_order() {
        let mut vocab = Vocabulary::new();
        assert_eq!(vocab.encode("abca", true), vec![4, 5, 6, 4]);
        assert_eq!(vocab.encode("cd", false), vec![6, 1]);
        assert_eq!(vocab.encode_known("dab"), vec![1, 4, 5]);
    }

    #[test]
    fn test_decode_stops_at_end_and_skips_padding() {
        let mut vocab = Vocabulary::new();
        vocab.encode("hi", true);
        assert_eq!(vocab.decode(&[3, 4, 5, 2, 4, 0]), "hi");
        assert_eq!(vocab.decode(&[4, 99]), "h<unk>");
    }
}
