//! Operand normalization. Bare register names inside an operand are tagged with a
//! `%` marker so the disassembler output reads `ld a, (%hl)` rather than
//! `ld a, (hl)`.

/// Characters an operand is split on. Each one is kept as its own token.
const DELIMITERS: [char; 5] = ['(', ')', ',', ' ', '+'];

/// Register names and their tagged forms.
const REGISTERS: [(&str, &str); 14] = [
  ("af", "%af"),
  ("bc", "%bc"),
  ("de", "%de"),
  ("hl", "%hl"),
  ("pc", "%pc"),
  ("sp", "%sp"),
  ("a", "%a"),
  ("f", "%f"),
  ("b", "%b"),
  ("c", "%c"),
  ("d", "%d"),
  ("e", "%e"),
  ("h", "%h"),
  ("l", "%l"),
];

/// Splits an operand at every delimiter, keeping the delimiters. Empty tokens between
/// adjacent delimiters are dropped since they contribute nothing to the output.
fn tokenize(operand: &str) -> Vec<&str> {
  let mut tokens = Vec::new();
  let mut start = 0;
  for (i, ch) in operand.char_indices() {
    if DELIMITERS.contains(&ch) {
      if start < i {
        tokens.push(&operand[start..i]);
      }
      let end = i + ch.len_utf8();
      tokens.push(&operand[i..end]);
      start = end;
    }
  }
  if start < operand.len() {
    tokens.push(&operand[start..]);
  }
  tokens
}

fn tag_register(token: &str) -> &str {
  REGISTERS
    .iter()
    .find(|(name, _)| *name == token)
    .map_or(token, |(_, tagged)| tagged)
}

/// Rewrites a lowercase operand so every bare register token carries the `%` marker.
/// Everything else (immediates, displacements, punctuation) passes through untouched.
pub fn transform_operand(operand: &str) -> String {
  tokenize(operand).into_iter().map(tag_register).collect()
}
