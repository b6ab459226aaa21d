use serde::{Deserialize, Serialize};
use std::fmt;

/// Named resolution class used to pick an image variant from a source.
///
/// The reference dimensions are fixed; remote sources expose one URL
/// template per bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Bucket {
    #[serde(rename = "uhd")]
    Uhd,
    #[serde(rename = "1080p")]
    Fhd,
    #[serde(rename = "768p")]
    Hd,
    #[serde(rename = "mobile")]
    Mobile,
}

/// All buckets in preference order. Ties in the matching heuristic resolve
/// to the earliest entry here.
pub const ALL_BUCKETS: [Bucket; 4] = [Bucket::Uhd, Bucket::Fhd, Bucket::Hd, Bucket::Mobile];

impl Bucket {
    /// Reference pixel dimensions (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Bucket::Uhd => (3840, 2160),
            Bucket::Fhd => (1920, 1080),
            Bucket::Hd => (1366, 768),
            Bucket::Mobile => (1080, 1920),
        }
    }

    fn area(&self) -> u64 {
        let (w, h) = self.dimensions();
        w as u64 * h as u64
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Bucket::Uhd => "uhd",
            Bucket::Fhd => "1080p",
            Bucket::Hd => "768p",
            Bucket::Mobile => "mobile",
        }
    }

    /// Map detected screen dimensions to the best-fitting bucket.
    ///
    /// Exact match wins. Otherwise the covering bucket (both reference
    /// dimensions >= detected) with the least wasted area is chosen. When
    /// nothing covers the screen, the highest-resolution bucket is the
    /// last resort. Never fails.
    pub fn for_dimensions(width: u32, height: u32) -> Bucket {
        if let Some(exact) = ALL_BUCKETS
            .iter()
            .find(|b| b.dimensions() == (width, height))
        {
            return *exact;
        }

        let screen_area = width as u64 * height as u64;
        ALL_BUCKETS
            .iter()
            .filter(|b| {
                let (w, h) = b.dimensions();
                w >= width && h >= height
            })
            .min_by_key(|b| b.area() - screen_area)
            .copied()
            .unwrap_or(Bucket::Uhd)
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_matches_win() {
        assert_eq!(Bucket::for_dimensions(3840, 2160), Bucket::Uhd);
        assert_eq!(Bucket::for_dimensions(1920, 1080), Bucket::Fhd);
        assert_eq!(Bucket::for_dimensions(1366, 768), Bucket::Hd);
        assert_eq!(Bucket::for_dimensions(1080, 1920), Bucket::Mobile);
    }

    #[test]
    fn covered_only_by_uhd() {
        // 1440p is larger than every bucket except uhd
        assert_eq!(Bucket::for_dimensions(2560, 1440), Bucket::Uhd);
    }

    #[test]
    fn least_waste_covering_bucket() {
        // Covered by every bucket; 768p has the smallest area
        assert_eq!(Bucket::for_dimensions(100, 100), Bucket::Hd);
        // Covered by 1080p and uhd; 1080p wastes less
        assert_eq!(Bucket::for_dimensions(1600, 900), Bucket::Fhd);
    }

    #[test]
    fn oversized_screen_falls_back_to_uhd() {
        assert_eq!(Bucket::for_dimensions(5120, 2880), Bucket::Uhd);
        assert_eq!(Bucket::for_dimensions(7680, 4320), Bucket::Uhd);
    }

    #[test]
    fn portrait_screen_prefers_mobile() {
        // Only the portrait bucket covers a tall narrow screen
        assert_eq!(Bucket::for_dimensions(1080, 1800), Bucket::Mobile);
    }

    #[test]
    fn serde_names_are_stable() {
        assert_eq!(serde_json::to_string(&Bucket::Fhd).unwrap(), "\"1080p\"");
        assert_eq!(
            serde_json::from_str::<Bucket>("\"mobile\"").unwrap(),
            Bucket::Mobile
        );
    }
}
