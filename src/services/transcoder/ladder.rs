//! Fixed quality ladder.

/// One quality level of the HLS ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rung {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    /// Target video bitrate in kbps.
    pub video_kbps: u32,
}

impl Rung {
    /// `WxH` as the encoder's `-s` flag expects it.
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }

    /// Bitrate as the encoder's `-b:v` flag expects it.
    pub fn bitrate(&self) -> String {
        format!("{}k", self.video_kbps)
    }
}

/// Rungs in encode order, lowest first.
pub static LADDER: [Rung; 5] = [
    Rung {
        label: "240p",
        width: 426,
        height: 240,
        video_kbps: 400,
    },
    Rung {
        label: "360p",
        width: 640,
        height: 360,
        video_kbps: 800,
    },
    Rung {
        label: "480p",
        width: 854,
        height: 480,
        video_kbps: 1500,
    },
    Rung {
        label: "720p",
        width: 1280,
        height: 720,
        video_kbps: 2500,
    },
    Rung {
        label: "1080p",
        width: 1920,
        height: 1080,
        video_kbps: 4000,
    },
];

pub fn find_rung(label: &str) -> Option<&'static Rung> {
    LADDER.iter().find(|r| r.label == label)
}

/// Quality requested by a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    Original,
    Rendition(&'static Rung),
}

impl Quality {
    /// Parse a query value; empty means original.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("original") {
            return Some(Self::Original);
        }
        find_rung(&s.to_ascii_lowercase()).map(Self::Rendition)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Rendition(rung) => rung.label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ladder_is_ascending() {
        let heights: Vec<u32> = LADDER.iter().map(|r| r.height).collect();
        assert_eq!(heights, vec![240, 360, 480, 720, 1080]);
        assert!(LADDER.windows(2).all(|w| w[0].video_kbps < w[1].video_kbps));
    }

    #[test]
    fn test_rung_flags() {
        let rung = find_rung("480p").unwrap();
        assert_eq!(rung.resolution(), "854x480");
        assert_eq!(rung.bitrate(), "1500k");
    }

    #[test]
    fn test_quality_parse() {
        assert_eq!(Quality::parse(""), Some(Quality::Original));
        assert_eq!(Quality::parse("Original"), Some(Quality::Original));
        assert_eq!(Quality::parse("720P").map(|q| q.label()), Some("720p"));
        assert_eq!(Quality::parse("4k"), None);
    }
}
