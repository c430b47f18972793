//! Named regex pattern sets shared by every string-shaped field.

use once_cell::sync::Lazy;
use regex::Regex;

/// A named, pre-compiled pattern a caller can request for `validate_string`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternSet {
    Alphanumeric,
    AlphanumericUnderscore,
    AlphanumericDash,
    Numeric,
    Float,
    Fraction,
    Uuid,
    HexColor,
    SafeFilename,
    SafeDirectory,
    ScenePath,
    IpAddress,
    Port,
}

impl PatternSet {
    pub fn regex(self) -> &'static Regex {
        match self {
            PatternSet::Alphanumeric => &ALPHANUMERIC,
            PatternSet::AlphanumericUnderscore => &ALPHANUMERIC_UNDERSCORE,
            PatternSet::AlphanumericDash => &ALPHANUMERIC_DASH,
            PatternSet::Numeric => &NUMERIC,
            PatternSet::Float => &FLOAT,
            PatternSet::Fraction => &FRACTION,
            PatternSet::Uuid => &UUID,
            PatternSet::HexColor => &HEX_COLOR,
            PatternSet::SafeFilename => &SAFE_FILENAME,
            PatternSet::SafeDirectory => &SAFE_DIRECTORY,
            PatternSet::ScenePath => &SCENE_PATH,
            PatternSet::IpAddress => &IP_ADDRESS,
            PatternSet::Port => &PORT,
        }
    }
}

static ALPHANUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]+$").unwrap());
static ALPHANUMERIC_UNDERSCORE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").unwrap());
static ALPHANUMERIC_DASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9\-]+$").unwrap());
static NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+$").unwrap());
static FLOAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+(\.\d+)?$").unwrap());
static FRACTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+/\d+$").unwrap());
static UUID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-4[0-9a-fA-F]{3}-[89abAB][0-9a-fA-F]{3}-[0-9a-fA-F]{12}$").unwrap());
static HEX_COLOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").unwrap());
static SAFE_FILENAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_\-. ]+$").unwrap());
static SAFE_DIRECTORY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_\-./]+$").unwrap());
static SCENE_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/[a-zA-Z0-9_/]+$").unwrap());
static IP_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})$").unwrap());
static PORT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,5}$").unwrap());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_path_requires_leading_slash() {
        assert!(PatternSet::ScenePath.regex().is_match("/World/cube_1"));
        assert!(!PatternSet::ScenePath.regex().is_match("World/cube_1"));
    }

    #[test]
    fn hex_color_requires_six_hex_digits() {
        assert!(PatternSet::HexColor.regex().is_match("#FF0000"));
        assert!(!PatternSet::HexColor.regex().is_match("FF0000"));
        assert!(!PatternSet::HexColor.regex().is_match("#FFF"));
    }
}
