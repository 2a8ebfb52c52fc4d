//! Text measurement and wrapping.
//!
//! Layout uses fixed-pitch metrics: every glyph advances half the font size
//! and lines are 1.4× the font size. The rasterizer paints glyphs into the
//! same cells, which keeps measured and painted widths identical at any scale.

/// Horizontal advance per character, as a fraction of the font size.
pub const ADVANCE_RATIO: f32 = 0.5;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_RATIO: f32 = 1.4;

/// Width of `text` at `size`.
pub fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * ADVANCE_RATIO
}

/// Height of one line at `size`.
pub fn line_height(size: f32) -> f32 {
    (size * LINE_HEIGHT_RATIO).round()
}

/// Number of characters that fit in `width`.
pub fn chars_per_line(size: f32, width: f32) -> usize {
    if size <= 0.0 {
        return 1;
    }
    ((width / (size * ADVANCE_RATIO)).floor() as usize).max(1)
}

/// Greedy word wrap. Explicit newlines are kept; words longer than a line
/// are split. Blank input produces no lines.
///
/// ```
/// use proforma::layout::text::wrap;
///
/// let lines = wrap("copper piping kit with insulation", 10.0, 60.0);
/// assert_eq!(lines, vec!["copper", "piping kit", "with", "insulation"]);
/// ```
pub fn wrap(text: &str, size: f32, width: f32) -> Vec<String> {
    let max = chars_per_line(size, width);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_len = 0usize;

        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();

            if word_len > max {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let chars: Vec<char> = word.chars().collect();
                for chunk in chars.chunks(max) {
                    if chunk.len() == max {
                        lines.push(chunk.iter().collect());
                    } else {
                        current = chunk.iter().collect();
                        current_len = chunk.len();
                    }
                }
                continue;
            }

            let needed = if current_len == 0 { word_len } else { current_len + 1 + word_len };
            if needed > max {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_len = word_len;
            } else {
                if current_len > 0 {
                    current.push(' ');
                }
                current.push_str(word);
                current_len = needed;
            }
        }

        if current_len > 0 {
            lines.push(current);
        }
    }

    lines
}
