/// Marker that build servers append to a color token while a build runs.
/// Matching is by substring so both `blue_anime` and `blue_animated` resolve.
const ANIMATED_MARKER: &str = "_anime";

/// Health color reported by the build server for one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JobColor {
    NotBuilt,
    Disabled,
    Red,
    Green,
    Blue,
    Yellow,
    Cyan,
    Magenta,
    White,
    #[default]
    None,
}

impl JobColor {
    const TABLE: [(JobColor, &'static str); 9] = [
        (JobColor::NotBuilt, "notbuilt"),
        (JobColor::Disabled, "disabled"),
        (JobColor::Red, "red"),
        (JobColor::Green, "green"),
        (JobColor::Blue, "blue"),
        (JobColor::Yellow, "yellow"),
        (JobColor::Cyan, "cyan"),
        (JobColor::Magenta, "magenta"),
        (JobColor::White, "white"),
    ];

    /// Resolve a bare token (no animation marker). Unknown tokens map to `None`.
    pub fn from_token(token: &str) -> Self {
        Self::TABLE
            .iter()
            .find(|(_, name)| *name == token)
            .map(|(color, _)| *color)
            .unwrap_or(JobColor::None)
    }

    pub fn as_str(&self) -> &'static str {
        Self::TABLE
            .iter()
            .find(|(color, _)| color == self)
            .map(|(_, name)| *name)
            .unwrap_or("noColor")
    }

    /// Jobs in this state take no part in the group verdict.
    pub fn is_inactive(&self) -> bool {
        matches!(self, JobColor::NotBuilt | JobColor::Disabled)
    }
}

impl std::fmt::Display for JobColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split a raw color token into its color and animation flag.
///
/// Everything from the first animation marker onwards is discarded, then the
/// remainder is looked up in the fixed table. Never fails.
pub fn parse_color_token(raw: &str) -> (JobColor, bool) {
    let raw = raw.trim();
    match raw.find(ANIMATED_MARKER) {
        Some(idx) => (JobColor::from_token(&raw[..idx]), true),
        None => (JobColor::from_token(raw), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_tokens_resolve() {
        assert_eq!(parse_color_token("blue"), (JobColor::Blue, false));
        assert_eq!(parse_color_token("red"), (JobColor::Red, false));
        assert_eq!(parse_color_token("notbuilt"), (JobColor::NotBuilt, false));
        assert_eq!(parse_color_token("disabled"), (JobColor::Disabled, false));
    }

    #[test]
    fn animated_suffix_is_stripped() {
        assert_eq!(parse_color_token("blue_anime"), (JobColor::Blue, true));
        assert_eq!(parse_color_token("red_animated"), (JobColor::Red, true));
        assert_eq!(parse_color_token("notbuilt_anime"), (JobColor::NotBuilt, true));
    }

    #[test]
    fn unknown_tokens_are_none() {
        assert_eq!(parse_color_token("aborted"), (JobColor::None, false));
        assert_eq!(parse_color_token("grey_anime"), (JobColor::None, true));
        assert_eq!(parse_color_token(""), (JobColor::None, false));
        assert_eq!(parse_color_token("Blue"), (JobColor::None, false));
    }

    #[test]
    fn display_uses_table_names() {
        assert_eq!(JobColor::Magenta.to_string(), "magenta");
        assert_eq!(JobColor::None.to_string(), "noColor");
    }

    #[test]
    fn inactive_colors() {
        assert!(JobColor::NotBuilt.is_inactive());
        assert!(JobColor::Disabled.is_inactive());
        assert!(!JobColor::None.is_inactive());
        assert!(!JobColor::Blue.is_inactive());
    }
}
