use image::GrayImage;
use sha2::{Digest, Sha256};
use std::fmt;

/// Deterministic lookup key for one cropped letter bitmap.
///
/// Keys are compared for equality only and never decoded back into
/// pixels. The encoding is stable across runs and platforms: the SHA-256
/// digest, in lowercase hex, of `"{width}x{height}:"` followed by the
/// row-major bitmap serialized as `'1'` for ink and `'0'` for background.
/// The dimension prefix keeps equal bit strings of different shapes
/// apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureKey(String);

impl FeatureKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for FeatureKey {
    fn from(key: String) -> FeatureKey {
        FeatureKey(key)
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Encode a cropped monochrome letter into its feature key.
pub fn extract_feature(img: &GrayImage) -> FeatureKey {
    let mut bits = String::with_capacity((img.width() * img.height()) as usize);
    for p in img.pixels() {
        bits.push(if p[0] == 0 { '1' } else { '0' });
    }
    let mut hasher = Sha256::new();
    hasher.update(format!("{}x{}:", img.width(), img.height()).as_bytes());
    hasher.update(bits.as_bytes());
    FeatureKey(hex::encode(hasher.finalize()))
}
