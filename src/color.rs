//! Color type and rainbow math

use smart_leds::RGB8;

/// A single LED color. Equality is componentwise.
pub type Rgb = RGB8;

const SECTION_RED_TO_YELLOW: usize = 0;
const SECTION_YELLOW_TO_GREEN: usize = 1;
const SECTION_GREEN_TO_CYAN: usize = 2;
const SECTION_CYAN_TO_BLUE: usize = 3;
const SECTION_BLUE_TO_MAGENTA: usize = 4;

/// Returns the color at `index` of a rainbow spanning `count` pixels.
///
/// The rainbow has 6 sections, one per color transition. Within each
/// section two of the RGB components are fixed at `max_brightness` or 0
/// and the third ramps between them.
///
/// Section boundaries are computed with integer division so that counts
/// that are not a multiple of 6 still tile a full hue cycle without a
/// visible seam.
#[allow(clippy::cast_possible_truncation)]
pub fn rainbow_color(index: usize, count: usize, max_brightness: u8) -> Rgb {
    let max = max_brightness as usize;

    let section = index * 6 / count;
    let section_start = count * section / 6;
    let section_end = count * (section + 1) / 6;
    let offset = index - section_start;
    // Sections can be empty on rings shorter than 6 pixels.
    let section_size = (section_end - section_start).max(1);
    let partial = (offset * max / section_size) as u8;
    let max = max_brightness;

    match section {
        SECTION_RED_TO_YELLOW => Rgb {
            r: max,
            g: partial,
            b: 0,
        },
        SECTION_YELLOW_TO_GREEN => Rgb {
            r: max - partial,
            g: max,
            b: 0,
        },
        SECTION_GREEN_TO_CYAN => Rgb {
            r: 0,
            g: max,
            b: partial,
        },
        SECTION_CYAN_TO_BLUE => Rgb {
            r: 0,
            g: max - partial,
            b: max,
        },
        SECTION_BLUE_TO_MAGENTA => Rgb {
            r: partial,
            g: 0,
            b: max,
        },
        _ => Rgb {
            r: max,
            g: 0,
            b: max - partial,
        },
    }
}
