//! An OCR library that reads the answer text from an Amazon image captcha
//!
//! The captcha shows six distorted letters drawn from a fixed 18-letter
//! alphabet. Recognition is exact: the image is thresholded to pure ink,
//! split into its six letters, and each letter bitmap is encoded into a
//! deterministic feature key that is looked up in precomputed per-letter
//! training data. A captcha with any unknown letter stays unresolved,
//! there is no fuzzy matching.
//!
//! # Basic usage
//! ```no_run
//! # use amazon_captcha_ocr::{Recognizer, Solution, Error};
//! let path = "captcha.png";
//! let gray = image::open(path)?.into_luma8();
//! let recognizer = Recognizer::new();
//! match recognizer.recognize(&gray) {
//!     Solution::Solved(text) => println!("answer: {}", text),
//!     Solution::Unresolved => println!("could not recognize the captcha"),
//! }
//! # Ok::<(), Error>(())
//! ```

mod error;
mod features;
mod recognizer;
mod segment;
mod training;

pub use error::Error;
pub use features::{extract_feature, FeatureKey};
pub use recognizer::{Recognizer, Solution};
pub use segment::{
    crop_border, monochrome, split_letters, GlyphRegion, Segmentation, MAX_LETTER_WIDTH,
    MIN_LETTER_WIDTH, MONOCHROME_WEIGHT, SPLIT_MARGIN,
};
pub use training::{TrainingSet, ALPHABET};
