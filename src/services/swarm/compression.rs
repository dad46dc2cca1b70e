//! Semantic compression helper for handoff context.
//!
//! Produces a length-ratio prefix of the original; callers must treat the
//! result as lossy.

/// Compression levels and their retention ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionLevel {
    None,
    Light,
    Aggressive,
    Semantic,
}

impl CompressionLevel {
    pub fn ratio(&self) -> f64 {
        match self {
            Self::None => 1.0,
            Self::Light => 0.8,
            Self::Aggressive => 0.6,
            Self::Semantic => 0.4,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::None),
            "light" => Some(Self::Light),
            "aggressive" => Some(Self::Aggressive),
            "semantic" => Some(Self::Semantic),
            _ => None,
        }
    }
}

/// Keep `floor(len * ratio)` characters of the original.
pub fn compress(text: &str, level: CompressionLevel) -> String {
    if level == CompressionLevel::None {
        return text.to_string();
    }
    let total = text.chars().count();
    let keep = (total as f64 * level.ratio()).floor() as usize;
    text.chars().take(keep).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_identity() {
        assert_eq!(compress("hello world", CompressionLevel::None), "hello world");
    }

    #[test]
    fn test_ratios() {
        let text = "x".repeat(100);
        assert_eq!(compress(&text, CompressionLevel::Light).len(), 80);
        assert_eq!(compress(&text, CompressionLevel::Aggressive).len(), 60);
        assert_eq!(compress(&text, CompressionLevel::Semantic).len(), 40);
    }

    #[test]
    fn test_floor_applied() {
        // 7 chars * 0.8 = 5.6 → 5
        assert_eq!(compress("abcdefg", CompressionLevel::Light).len(), 5);
    }

    #[test]
    fn test_multibyte_safe() {
        let text = "héllo wörld ünïcode";
        let compressed = compress(text, CompressionLevel::Semantic);
        assert!(compressed.chars().count() <= text.chars().count());
    }
}
