//! Symbol assignment for working-palette entries.

/// Single-glyph markers handed out in rank order before falling back to
/// two-letter codes.
const SYMBOL_SET: &[&str] = &[
    "●", "■", "▲", "◆", "✖", "✚", "○", "□", "△", "◇", "★", "☆", "✦", "✧", "✿", "✤", "✶", "✷",
    "✸", "✹", "✺", "✻", "✼", "✽", "✪", "✫", "✬", "✭", "✮", "✯",
];

/// Marker for the palette entry at `index`. Indexes past the fixed glyph set
/// synthesize a base-26 two-letter code from the raw index, so assignments
/// stay collision-free well past the glyph set.
pub fn symbol_for_index(index: usize) -> String {
    if let Some(symbol) = SYMBOL_SET.get(index) {
        return (*symbol).to_string();
    }
    let first = (b'A' + (index % 26) as u8) as char;
    let second = (b'A' + ((index / 26) % 26) as u8) as char;
    format!("{second}{first}")
}
