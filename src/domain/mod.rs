// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that define what the system talks about:
// vocabularies, tokenised sequence pairs, validation reports,
// and the traits other layers implement.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits

// Symbol ↔ ID tables with reserved pad/unk/eos/sos tokens
pub mod vocabulary;

// A padded (source, target) ID pair
pub mod sequence_pair;

// Snapshot produced at every validation pass
pub mod report;

// Core abstractions (traits) that other layers implement
pub mod traits;
