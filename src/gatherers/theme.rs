use std::sync::OnceLock;

use regex::Regex;

// A theme line looks like:
//   #2: "Kimi no Shiranai Monogatari (君の知らない物語)" by supercell (eps 1-12)
// with every part but the name and the artist being optional.

/// An optional position, e.g. "#2: " or "2: "
macro_rules! opt_position {
    () => {
        r#"(?:#?(?P<position>\d+) *: *)?"#
    };
}
/// The song name, between straight or curly quotes
macro_rules! name {
    () => {
        r#"["“](?P<name>.+)["”]"#
    };
}
/// The artist, up to the optional episodes part
macro_rules! artist {
    () => {
        r#" +by +(?P<artist>.+?)"#
    };
}
/// Optional episodes the song is used in, e.g. "(ep 5)" or "(eps 1-12, 14)"
macro_rules! opt_episodes {
    () => {
        r#"(?: *\((?P<eps>eps?)\.? *(?P<range>[^)]*)\))?"#
    };
}
const THEME_PATTERN: &str = concat!(
    "^",
    opt_position!(),
    name!(),
    artist!(),
    opt_episodes!(),
    " *$"
);

static THEME_RE: OnceLock<Regex> = OnceLock::new();

fn theme_re() -> &'static Regex {
    THEME_RE.get_or_init(|| Regex::new(THEME_PATTERN).expect("theme pattern is valid"))
}

/// A song as listed by a catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeLine {
    pub position: Option<u32>,
    pub name: String,
    pub artist: String,
    /// Set only when the song is used in a single episode
    pub episode: Option<u32>,
}

/// Parse one theme line, returning `None` if it does not look like a song
pub fn parse_theme_line(line: &str) -> Option<ThemeLine> {
    let cap = theme_re().captures(line.trim())?;

    let position = cap.name("position").and_then(|m| m.as_str().parse().ok());
    let episode = match (cap.name("eps"), cap.name("range")) {
        (Some(eps), Some(range)) if eps.as_str() == "ep" => range.as_str().trim().parse().ok(),
        _ => None,
    };

    Some(ThemeLine {
        position,
        name: cap.name("name")?.as_str().to_owned(),
        artist: cap.name("artist")?.as_str().trim().to_owned(),
        episode,
    })
}
