/// Glyph used for keys the catalog does not know.
pub const FALLBACK_GLYPH: char = '✓';

const GLYPHS: &[(&str, char)] = &[
    ("dumbbell", '🏋'),
    ("bath", '🛁'),
    ("coffee", '☕'),
    ("mail", '✉'),
    ("star", '★'),
    ("book", '📖'),
    ("heart", '♥'),
    ("utensils", '🍴'),
    ("laptop", '💻'),
    ("car", '🚗'),
    ("smartphone", '📱'),
    ("glass-water", '🥛'),
    ("users", '👥'),
    ("music", '♪'),
    ("Activity", '⚡'),
    ("Code", '⌨'),
    ("MessageSquare", '💬'),
    ("Target", '◎'),
];

/// Resolves symbolic icon keys to terminal glyphs. Events only ever store the key.
#[derive(Debug, Default, Clone, Copy)]
pub struct IconCatalog;

impl IconCatalog {
    pub fn glyph(&self, key: &str) -> char {
        GLYPHS
            .iter()
            .find(|(k, _)| *k == key)
            .map_or(FALLBACK_GLYPH, |(_, g)| *g)
    }
}
