//! Poster geometry and text wrapping.
//!
//! Layout is computed independently of any font rasterizer: widths come from
//! a [`TextMeasure`], so the positions can be checked without a font file.

use crate::config::PosterDesign;

/// Top-left corner of the photo.
pub const PHOTO_X: u32 = 20;
pub const PHOTO_Y: u32 = 60;
/// Space between the photo and the message text.
pub const TEXT_GAP: u32 = 20;
pub const RIGHT_MARGIN: u32 = 20;

pub const MESSAGE_Y: i32 = 100;
pub const LINE_STEP: i32 = 20;
/// Distance of the club name's top from the bottom edge.
pub const CLUB_NAME_BOTTOM_OFFSET: i32 = 40;

/// Font sizes in pixels per em.
pub const MEDIUM_FONT_SIZE: f32 = 16.0;
pub const LARGE_FONT_SIZE: f32 = 24.0;

pub trait TextMeasure {
    /// Advance width of `text` at `size` pixels per em.
    fn text_width(&self, text: &str, size: f32) -> f32;
}

/// A line of text, positioned by the top-left of its line box.
#[derive(Clone, Debug, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub x: i32,
    pub y: i32,
    pub size: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PosterLayout {
    pub width: u32,
    pub height: u32,
    pub photo_x: u32,
    pub photo_y: u32,
    pub photo_size: u32,
    pub lines: Vec<TextLine>,
}

/// Greedy word wrap. A word wider than `max_width` is kept whole on its own line.
pub fn wrap_words(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut words = text.split_whitespace();
    let Some(first) = words.next() else {
        return Vec::new();
    };

    let mut lines = Vec::new();
    let mut current = first.to_string();
    for word in words {
        let candidate = format!("{current} {word}");
        if measure(&candidate) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    lines.push(current);
    lines
}

/// X coordinate where the message text starts.
pub fn text_x(design: &PosterDesign) -> u32 {
    PHOTO_X + design.photo_size + TEXT_GAP
}

/// Width available to the message text, at least one pixel.
pub fn max_text_width(design: &PosterDesign) -> u32 {
    design
        .poster_width
        .saturating_sub(text_x(design) + RIGHT_MARGIN)
        .max(1)
}

pub fn layout_poster(
    design: &PosterDesign,
    club_name: &str,
    name: &str,
    event_name: &str,
    measure: &dyn TextMeasure,
) -> PosterLayout {
    let x = text_x(design) as i32;
    let max_width = max_text_width(design) as f32;

    let greeting = format!("Happy {event_name}");
    let greeting_lines = if measure.text_width(&greeting, MEDIUM_FONT_SIZE) > max_width {
        wrap_words(&greeting, max_width, |t| {
            measure.text_width(t, MEDIUM_FONT_SIZE)
        })
    } else {
        vec![greeting]
    };

    let mut lines: Vec<TextLine> = greeting_lines
        .into_iter()
        .chain(std::iter::once(format!("{name}!")))
        .enumerate()
        .map(|(i, text)| TextLine {
            text,
            x,
            y: MESSAGE_Y + LINE_STEP * i as i32,
            size: MEDIUM_FONT_SIZE,
        })
        .collect();

    if !club_name.is_empty() {
        let width = measure.text_width(club_name, LARGE_FONT_SIZE);
        let centered = ((design.poster_width as f32 - width) / 2.0).floor() as i32;
        lines.push(TextLine {
            text: club_name.to_string(),
            x: centered.max(0),
            y: design.poster_height as i32 - CLUB_NAME_BOTTOM_OFFSET,
            size: LARGE_FONT_SIZE,
        });
    }

    PosterLayout {
        width: design.poster_width,
        height: design.poster_height,
        photo_x: PHOTO_X,
        photo_y: PHOTO_Y,
        photo_size: design.photo_size,
        lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every character is half an em wide.
    struct HalfEm;

    impl TextMeasure for HalfEm {
        fn text_width(&self, text: &str, size: f32) -> f32 {
            text.chars().count() as f32 * size / 2.0
        }
    }

    fn chars(t: &str) -> f32 {
        t.chars().count() as f32
    }

    #[test]
    fn test_wrap_words() {
        assert_eq!(
            wrap_words("Happy Wedding Anniversary", 13.0, chars),
            vec!["Happy Wedding", "Anniversary"]
        );
        assert_eq!(wrap_words("a b c d", 3.0, chars), vec!["a b", "c d"]);
        assert_eq!(wrap_words("   ", 10.0, chars), Vec::<String>::new());
    }

    #[test]
    fn test_wrap_keeps_long_word_whole() {
        assert_eq!(
            wrap_words("Happy Supercalifragilistic day", 6.0, chars),
            vec!["Happy", "Supercalifragilistic", "day"]
        );
    }

    #[test]
    fn test_default_geometry() {
        let design = PosterDesign::default();
        assert_eq!(text_x(&design), 220);
        assert_eq!(max_text_width(&design), 360);
    }

    #[test]
    fn test_max_text_width_never_zero() {
        let design = PosterDesign {
            poster_width: 230,
            photo_size: 200,
            ..PosterDesign::default()
        };
        assert_eq!(max_text_width(&design), 1);
    }

    #[test]
    fn test_short_greeting_is_two_lines() {
        let design = PosterDesign::default();
        let layout = layout_poster(&design, "", "Ada", "Birthday", &HalfEm);
        assert_eq!(
            layout.lines,
            vec![
                TextLine {
                    text: "Happy Birthday".to_string(),
                    x: 220,
                    y: 100,
                    size: MEDIUM_FONT_SIZE
                },
                TextLine {
                    text: "Ada!".to_string(),
                    x: 220,
                    y: 120,
                    size: MEDIUM_FONT_SIZE
                },
            ]
        );
        assert_eq!((layout.photo_x, layout.photo_y, layout.photo_size), (20, 60, 180));
    }

    #[test]
    fn test_long_greeting_wraps_and_pushes_name_down() {
        // 360px at 8px per char fits 45 characters.
        let design = PosterDesign::default();
        let event = "Anniversary of joining the amateur astronomy society";
        let layout = layout_poster(&design, "", "Ada", event, &HalfEm);

        let texts: Vec<&str> = layout.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Happy Anniversary of joining the amateur",
                "astronomy society",
                "Ada!"
            ]
        );
        let ys: Vec<i32> = layout.lines.iter().map(|l| l.y).collect();
        assert_eq!(ys, vec![100, 120, 140]);
    }

    #[test]
    fn test_club_name_centered_at_bottom() {
        let design = PosterDesign::default();
        // 10 chars * 12px = 120px wide.
        let layout = layout_poster(&design, "Chess Club", "Ada", "Birthday", &HalfEm);
        let club = layout.lines.last().unwrap();
        assert_eq!(club.text, "Chess Club");
        assert_eq!(club.x, 240);
        assert_eq!(club.y, 260);
        assert_eq!(club.size, LARGE_FONT_SIZE);
    }

    #[test]
    fn test_wide_club_name_clamped_to_left_edge() {
        let design = PosterDesign::default();
        let club = "x".repeat(80);
        let layout = layout_poster(&design, &club, "Ada", "Birthday", &HalfEm);
        assert_eq!(layout.lines.last().unwrap().x, 0);
    }
}
