use crate::features::extract_feature;
use crate::segment::{
    crop_border, monochrome, split_letters, Segmentation, MAX_LETTER_WIDTH, MIN_LETTER_WIDTH,
    MONOCHROME_WEIGHT,
};
use crate::training::TrainingSet;
use crate::Error;
use image::GrayImage;
use log::debug;
use std::fmt;

/// Outcome of a solve attempt.
///
/// A captcha either resolves completely or not at all: if any of the six
/// letters is unknown the whole attempt is `Unresolved`, never a partial
/// answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Solution {
    /// The recognized six-letter answer.
    Solved(String),
    /// Segmentation failed or some letter matched no known key.
    Unresolved,
}

impl Solution {
    pub fn text(&self) -> Option<&str> {
        match self {
            Solution::Solved(text) => Some(text),
            Solution::Unresolved => None,
        }
    }

    pub fn is_solved(&self) -> bool {
        matches!(self, Solution::Solved(_))
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Solution::Solved(text) => write!(f, "{}", text),
            Solution::Unresolved => write!(f, "<unresolved>"),
        }
    }
}

/// Amazon captcha recognizer.
pub struct Recognizer {
    training: TrainingSet,
}

impl Default for Recognizer {
    fn default() -> Self {
        Recognizer::new()
    }
}

impl Recognizer {
    /// A recognizer backed by the embedded training data.
    pub fn new() -> Recognizer {
        Recognizer {
            training: TrainingSet::embedded(),
        }
    }

    /// A recognizer backed by caller supplied training data.
    pub fn with_training(training: TrainingSet) -> Recognizer {
        Recognizer { training }
    }

    /// Recognize a grayscale captcha image.
    ///
    /// The recognition process consists of these phases:
    /// 1. Threshold the image to pure ink and background
    /// 2. Split it into six letters, left to right
    /// 3. Crop each letter to its ink, encode it, and look the key up in
    ///    the training data
    ///
    /// The first letter without a match aborts the attempt.
    pub fn recognize(&self, captcha: &GrayImage) -> Solution {
        let mono = monochrome(captcha, MONOCHROME_WEIGHT);
        let regions = match split_letters(&mono, MAX_LETTER_WIDTH, MIN_LETTER_WIDTH) {
            Segmentation::Glyphs(regions) => regions,
            Segmentation::Failed => return Solution::Unresolved,
        };

        let mut text = String::with_capacity(regions.len());
        for region in &regions {
            let letter = crop_border(&region.img);
            let key = extract_feature(&letter);
            match self.training.lookup(&key) {
                Some(letter) => text.push(letter),
                None => {
                    debug!("no match for the letter at columns {:?}", region.span);
                    return Solution::Unresolved;
                }
            }
        }
        Solution::Solved(text)
    }

    /// Recognize a captcha image file.
    ///
    /// # Errors
    /// * The file can not be read or decoded
    pub fn recognize_from_file(&self, path: &str) -> Result<Solution, Error> {
        let gray = image::open(path)?.into_luma8();
        Ok(self.recognize(&gray))
    }

    /// Recognize a captcha image from an encoded byte buffer.
    ///
    /// # Errors
    /// * The buffer can not be decoded
    pub fn recognize_from_memory(&self, captcha: &[u8]) -> Result<Solution, Error> {
        let gray = image::load_from_memory(captcha)?.into_luma8();
        Ok(self.recognize(&gray))
    }
}
