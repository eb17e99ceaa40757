use image::{GenericImageView, GrayImage, Luma};
use imageproc::map::map_pixels;
use log::debug;

/// Pixels at or below this gray value become ink.
pub const MONOCHROME_WEIGHT: u8 = 1;
/// A wider run must be two fused letters.
pub const MAX_LETTER_WIDTH: usize = 33;
/// The first of six letters may not be narrower than this.
pub const MIN_LETTER_WIDTH: usize = 14;
/// Columns ignored on each side of a fused run when looking for the cut.
pub const SPLIT_MARGIN: usize = 5;

/// Reduce a grayscale captcha to pure ink (0) and background (255).
pub fn monochrome(img: &GrayImage, weight: u8) -> GrayImage {
    map_pixels(img, |_x, _y, p| {
        if p[0] <= weight {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    })
}

/// One letter position cut out of the captcha.
#[derive(Debug, Clone)]
pub struct GlyphRegion {
    /// Source column span, half open. A glyph repaired by the 7-to-6
    /// merge keeps the span of its right-hand part.
    pub span: (usize, usize),
    /// Full-height sub-raster of the span.
    pub img: GrayImage,
}

impl GlyphRegion {
    pub fn width(&self) -> usize {
        self.img.width() as usize
    }
}

/// Result of splitting a captcha into letters.
///
/// `Failed` covers every malformed layout: a run count other than 6 or 7,
/// or a six-letter layout whose first letter is too narrow.
#[derive(Debug, Clone)]
pub enum Segmentation {
    Glyphs(Vec<GlyphRegion>),
    Failed,
}

fn ink_count(img: &GrayImage, x: u32) -> usize {
    (0..img.height()).filter(|&y| img.get_pixel(x, y)[0] == 0).count()
}

/// Column spans of the letter runs, before the count is validated.
///
/// Runs are delimited by their boundary columns: ink columns whose left or
/// right neighbour carries no ink. An odd marker count means a run was
/// clipped to a single column, which is compensated by doubling the first
/// marker. A run wider than `max_width` is cut in two at the column with
/// the least ink, ignoring `SPLIT_MARGIN` columns on each side; ties go to
/// the leftmost column.
fn run_spans(img: &GrayImage, max_width: usize) -> Vec<(usize, usize)> {
    let width = img.width() as usize;
    let content: Vec<bool> = (0..width as u32).map(|x| ink_count(img, x) > 0).collect();
    let mut markers: Vec<usize> = (0..width)
        .filter(|&x| content[x])
        .filter(|&x| x == 0 || !content[x - 1] || x + 1 == width || !content[x + 1])
        .collect();
    if markers.len() % 2 != 0 {
        let first = markers[0];
        markers.insert(1, first);
    }

    let mut spans = Vec::new();
    for pair in markers.chunks(2) {
        let start = pair[0];
        let end = (pair[1] + 1).min(width - 1);
        if end - start <= max_width {
            spans.push((start, end));
        } else {
            let mut divider = SPLIT_MARGIN;
            let mut least = usize::MAX;
            for (k, x) in (start + SPLIT_MARGIN..end - SPLIT_MARGIN).enumerate() {
                let ink = ink_count(img, x as u32);
                if ink < least {
                    least = ink;
                    divider = k + SPLIT_MARGIN;
                }
            }
            debug!("cut fused run {}..{} at column {}", start, end, start + divider);
            spans.push((start, start + divider));
            spans.push((start + divider + 1, end));
        }
    }
    spans
}

fn merge_horizontally(left: &GrayImage, right: &GrayImage) -> GrayImage {
    GrayImage::from_fn(left.width() + right.width(), left.height(), |x, y| {
        if x < left.width() {
            *left.get_pixel(x, y)
        } else {
            *right.get_pixel(x - left.width(), y)
        }
    })
}

/// Split a monochrome captcha into its six letters, left to right.
///
/// Exactly 6 or 7 runs must be found. Seven runs mean the last letter was
/// clipped at the image edge: the first run is then glued to the right of
/// the last one, which restores the reading order of the rotated layout.
pub fn split_letters(img: &GrayImage, max_width: usize, min_width: usize) -> Segmentation {
    let spans = run_spans(img, max_width);
    debug!("{} runs: {:?}", spans.len(), spans);

    let height = img.height();
    let mut regions: Vec<GlyphRegion> = spans
        .into_iter()
        .map(|(start, end)| GlyphRegion {
            span: (start, end),
            img: img.view(start as u32, 0, (end - start) as u32, height).to_image(),
        })
        .collect();

    if regions.len() != 6 && regions.len() != 7
        || (regions.len() == 6 && regions[0].width() < min_width)
    {
        debug!("segmentation failed with {} regions", regions.len());
        return Segmentation::Failed;
    }

    if regions.len() == 7 {
        let first = regions.remove(0);
        if let Some(last) = regions.last_mut() {
            last.img = merge_horizontally(&last.img, &first.img);
        }
    }
    Segmentation::Glyphs(regions)
}

/// Tighten a letter image to the bounding box of its ink.
///
/// A letter without any ink is returned unchanged; its feature key can
/// never be in the training data, so it fails matching downstream.
pub fn crop_border(img: &GrayImage) -> GrayImage {
    let (mut x0, mut y0, mut x1, mut y1) = (u32::MAX, u32::MAX, 0, 0);
    for (x, y, p) in img.enumerate_pixels() {
        if p[0] == 0 {
            x0 = x0.min(x);
            y0 = y0.min(y);
            x1 = x1.max(x);
            y1 = y1.max(y);
        }
    }
    if x0 == u32::MAX {
        return img.clone();
    }
    img.view(x0, y0, x1 - x0 + 1, y1 - y0 + 1).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Raster with an ink run of `width` columns starting at each `x`,
    /// filled over the given row range.
    fn raster(size: (u32, u32), runs: &[(usize, usize)], rows: (u32, u32)) -> GrayImage {
        let mut img = GrayImage::from_pixel(size.0, size.1, Luma([255u8]));
        for &(x, width) in runs {
            for col in x..x + width {
                for row in rows.0..rows.1 {
                    img.put_pixel(col as u32, row, Luma([0u8]));
                }
            }
        }
        img
    }

    #[test]
    fn test_monochrome() {
        let mut img = GrayImage::new(4, 1);
        for (x, v) in [0u8, 1, 2, 255].iter().enumerate() {
            img.put_pixel(x as u32, 0, Luma([*v]));
        }
        let mono = monochrome(&img, MONOCHROME_WEIGHT);
        let values: Vec<u8> = mono.pixels().map(|p| p[0]).collect();
        assert_eq!(values, vec![0, 0, 255, 255]);
    }

    #[test]
    fn test_six_clean_runs() {
        let runs = [(10, 20), (40, 18), (68, 22), (100, 19), (129, 21), (160, 20)];
        let img = raster((200, 70), &runs, (15, 55));
        match split_letters(&img, MAX_LETTER_WIDTH, MIN_LETTER_WIDTH) {
            Segmentation::Glyphs(regions) => {
                assert_eq!(regions.len(), 6);
                for (region, &(x, width)) in regions.iter().zip(runs.iter()) {
                    assert_eq!(region.span, (x, x + width));
                    assert_eq!(region.width(), width);
                }
            }
            Segmentation::Failed => panic!("expected 6 glyphs"),
        }
    }

    #[test]
    fn test_run_at_max_width_is_one_letter() {
        let img = raster((100, 70), &[(10, MAX_LETTER_WIDTH)], (15, 55));
        let spans = run_spans(&img, MAX_LETTER_WIDTH);
        assert_eq!(spans, vec![(10, 10 + MAX_LETTER_WIDTH)]);
    }

    #[test]
    fn test_fused_run_is_cut_at_least_ink_column() {
        let mut img = raster((100, 70), &[(10, MAX_LETTER_WIDTH + 1)], (15, 55));
        // carve a near-empty column inside the run, outside the margins
        for row in 15..55 {
            img.put_pixel(10 + 12, row, Luma([255u8]));
        }
        img.put_pixel(10 + 12, 15, Luma([0u8]));
        let spans = run_spans(&img, MAX_LETTER_WIDTH);
        assert_eq!(spans, vec![(10, 22), (23, 44)]);
    }

    #[test]
    fn test_fused_run_tie_breaks_on_first_column() {
        // uniform ink everywhere, so every interior column ties
        let img = raster((100, 70), &[(10, MAX_LETTER_WIDTH + 1)], (15, 55));
        let spans = run_spans(&img, MAX_LETTER_WIDTH);
        assert_eq!(spans, vec![(10, 10 + SPLIT_MARGIN), (10 + SPLIT_MARGIN + 1, 44)]);
    }

    #[test]
    fn test_single_column_run_doubles_marker() {
        let img = raster((100, 70), &[(5, 1)], (15, 55));
        let spans = run_spans(&img, MAX_LETTER_WIDTH);
        assert_eq!(spans, vec![(5, 6)]);
    }

    #[test]
    fn test_wrong_run_count_fails() {
        let runs = [(10, 20), (40, 18), (68, 22), (100, 19), (129, 21)];
        let img = raster((200, 70), &runs, (15, 55));
        assert!(matches!(
            split_letters(&img, MAX_LETTER_WIDTH, MIN_LETTER_WIDTH),
            Segmentation::Failed
        ));
    }

    #[test]
    fn test_narrow_first_letter_fails() {
        let runs = [(10, 13), (40, 18), (68, 22), (100, 19), (129, 21), (160, 20)];
        let img = raster((200, 70), &runs, (15, 55));
        assert!(matches!(
            split_letters(&img, MAX_LETTER_WIDTH, MIN_LETTER_WIDTH),
            Segmentation::Failed
        ));
    }

    #[test]
    fn test_seven_runs_merge_last_and_first() {
        let runs = [
            (5, 16),
            (30, 16),
            (55, 16),
            (80, 16),
            (105, 16),
            (130, 16),
            (155, 16),
        ];
        let img = raster((200, 70), &runs, (15, 55));
        let regions = match split_letters(&img, MAX_LETTER_WIDTH, MIN_LETTER_WIDTH) {
            Segmentation::Glyphs(regions) => regions,
            Segmentation::Failed => panic!("expected merge repair"),
        };
        assert_eq!(regions.len(), 6);
        // surviving regions start at the second run
        assert_eq!(regions[0].span, (30, 46));
        // repaired letter is last run followed by first run
        let repaired = &regions[5];
        assert_eq!(repaired.width(), 32);
        let last = img.view(155, 0, 16, 70).to_image();
        let first = img.view(5, 0, 16, 70).to_image();
        let expected = merge_horizontally(&last, &first);
        assert!(repaired.img.pixels().eq(expected.pixels()));
    }

    #[test]
    fn test_crop_border_tightens_to_ink() {
        let img = raster((40, 70), &[(10, 12)], (20, 50));
        let cropped = crop_border(&img);
        assert_eq!((cropped.width(), cropped.height()), (12, 30));
        assert!(cropped.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_crop_border_is_idempotent() {
        let img = raster((40, 70), &[(10, 12)], (20, 50));
        let once = crop_border(&img);
        let twice = crop_border(&once);
        assert_eq!((once.width(), once.height()), (twice.width(), twice.height()));
        assert!(once.pixels().eq(twice.pixels()));
    }

    #[test]
    fn test_crop_border_without_ink_is_unchanged() {
        let img = GrayImage::from_pixel(20, 30, Luma([255u8]));
        let cropped = crop_border(&img);
        assert_eq!((cropped.width(), cropped.height()), (20, 30));
    }
}
