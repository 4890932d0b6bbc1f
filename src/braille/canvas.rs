/// Offset of the empty Braille pattern (U+2800)
const BRAILLE_BASE: u32 = 0x2800;

/// Dot bit for each (x, y) position inside a 2x4 cell:
/// ```text
/// (0,0) (1,0)   bits: 0x01 0x08
/// (0,1) (1,1)   bits: 0x02 0x10
/// (0,2) (1,2)   bits: 0x04 0x20
/// (0,3) (1,3)   bits: 0x40 0x80
/// ```
const DOT_BITS: [[u8; 4]; 2] = [[0x01, 0x02, 0x04, 0x40], [0x08, 0x10, 0x20, 0x80]];

/// Monochrome raster where every terminal cell holds 2x4 dots.
///
/// Each map layer gets its own canvas so layers can be coloured separately.
#[derive(Clone)]
pub struct BrailleCanvas {
    width: usize,  // cells
    height: usize, // cells
    cells: Vec<u8>,
}

impl BrailleCanvas {
    /// Canvas of `width` x `height` cells, i.e. `width*2` x `height*4` dots
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    /// Set a dot; coordinates outside the canvas are ignored
    pub fn set_pixel(&mut self, x: i32, y: i32) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        let (cx, cy) = (x / 2, y / 4);
        if cx >= self.width || cy >= self.height {
            return;
        }
        self.cells[cy * self.width + cx] |= DOT_BITS[x % 2][y % 4];
    }

    #[cfg(test)]
    pub fn is_set(&self, x: usize, y: usize) -> bool {
        let (cx, cy) = (x / 2, y / 4);
        cx < self.width
            && cy < self.height
            && self.cells[cy * self.width + cx] & DOT_BITS[x % 2][y % 4] != 0
    }

    /// Non-empty cells as (column, row, glyph)
    pub fn glyphs(&self) -> impl Iterator<Item = (usize, usize, char)> + '_ {
        self.cells.iter().enumerate().filter_map(|(idx, &bits)| {
            if bits == 0 {
                return None;
            }
            let glyph = char::from_u32(BRAILLE_BASE + bits as u32)?;
            Some((idx % self.width, idx / self.width, glyph))
        })
    }

    /// One row rendered as Braille characters
    pub fn row_to_string(&self, row: usize) -> String {
        if row >= self.height {
            return String::new();
        }
        self.cells[row * self.width..(row + 1) * self.width]
            .iter()
            .map(|&b| char::from_u32(BRAILLE_BASE + b as u32).unwrap_or(' '))
            .collect()
    }
}

impl std::fmt::Display for BrailleCanvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in 0..self.height {
            if row > 0 {
                writeln!(f)?;
            }
            f.write_str(&self.row_to_string(row))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_pixel() {
        let mut canvas = BrailleCanvas::new(1, 1);
        canvas.set_pixel(0, 0);
        assert_eq!(canvas.to_string(), "⠁");
    }

    #[test]
    fn test_all_dots() {
        let mut canvas = BrailleCanvas::new(1, 1);
        for x in 0..2 {
            for y in 0..4 {
                canvas.set_pixel(x, y);
            }
        }
        assert_eq!(canvas.to_string(), "⣿");
    }

    #[test]
    fn test_out_of_bounds_ignored() {
        let mut canvas = BrailleCanvas::new(1, 1);
        canvas.set_pixel(-1, 0);
        canvas.set_pixel(2, 0);
        canvas.set_pixel(0, 4);
        assert_eq!(canvas.glyphs().count(), 0);
    }

    #[test]
    fn test_glyph_positions() {
        let mut canvas = BrailleCanvas::new(3, 2);
        canvas.set_pixel(4, 5);
        let glyphs: Vec<_> = canvas.glyphs().collect();
        assert_eq!(glyphs, vec![(2, 1, '⠂')]);
        assert!(canvas.is_set(4, 5));
        assert!(!canvas.is_set(5, 5));
    }
}
