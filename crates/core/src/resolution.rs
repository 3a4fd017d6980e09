//! Resolution presets for generated video.
//!
//! Maps the three supported resolution strings to pixel dimensions.
//! Parsing is strict here; the lenient 720p fallback for unrecognized
//! strings is applied (and logged) by the workflow builder so the
//! fallback shows up as a named event rather than a hidden default.

/// A supported output resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    P480,
    P720,
    P1080,
}

impl Resolution {
    /// Resolution used when the request carries an unrecognized string.
    pub const FALLBACK: Resolution = Resolution::P720;

    /// Parse a resolution string. Returns `None` for anything outside
    /// the fixed preset table.
    pub fn parse(raw: &str) -> Option<Resolution> {
        match raw {
            "480p" => Some(Resolution::P480),
            "720p" => Some(Resolution::P720),
            "1080p" => Some(Resolution::P1080),
            _ => None,
        }
    }

    /// Pixel dimensions as `(width, height)`.
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Resolution::P480 => (854, 480),
            Resolution::P720 => (1280, 720),
            Resolution::P1080 => (1920, 1080),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Resolution::P480 => "480p",
            Resolution::P720 => "720p",
            Resolution::P1080 => "1080p",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_table_matches() {
        assert_eq!(Resolution::parse("480p").unwrap().dimensions(), (854, 480));
        assert_eq!(Resolution::parse("720p").unwrap().dimensions(), (1280, 720));
        assert_eq!(
            Resolution::parse("1080p").unwrap().dimensions(),
            (1920, 1080)
        );
    }

    #[test]
    fn unrecognized_strings_do_not_parse() {
        assert_eq!(Resolution::parse("4k"), None);
        assert_eq!(Resolution::parse("720P"), None);
        assert_eq!(Resolution::parse(""), None);
    }

    #[test]
    fn fallback_is_720p() {
        assert_eq!(Resolution::FALLBACK.dimensions(), (1280, 720));
    }

    #[test]
    fn as_str_round_trips() {
        for res in [Resolution::P480, Resolution::P720, Resolution::P1080] {
            assert_eq!(Resolution::parse(res.as_str()), Some(res));
        }
    }
}
