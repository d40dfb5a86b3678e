/// Icon used when nothing more specific applies
pub const DEFAULT_ICON: &str = "default";

/// Phrases checked in order against the lowercased label
const PHRASE_ICONS: &[(&str, &str)] = &[
    ("cerah berawan", "cerah_berawan"),
    ("berawan dan berkabut", "berawan_berkabut"),
    ("cerah berkabut", "cerah_berkabut"),
    ("mendung", "mendung"),
    ("hujan berkabut", "hujan_berkabut"),
    ("hujan disertai kabut", "hujan_berkabut"),
    ("hujan cerah", "hujan_cerah"),
    ("cuaca campuran", DEFAULT_ICON),
];

/// Map a label to an icon file stem.
///
/// The first phrase contained in the lowercased label wins; otherwise the
/// first token up to whitespace or `(` is used.
pub fn sanitize_icon_key(label: &str) -> String {
    let lower = label.to_lowercase();
    if let Some((_, key)) = PHRASE_ICONS.iter().find(|(phrase, _)| lower.contains(phrase)) {
        return (*key).to_string();
    }
    lower
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or_default()
        .to_string()
}
