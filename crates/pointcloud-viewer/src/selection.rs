use plycloud::Color;

pub const HIGHLIGHT: Color = [1.0, 0.0, 0.0];

/// Single-point highlight over a cloud's color array.
///
/// Keeps the colors the cloud was loaded with so a previously highlighted
/// point can be put back exactly as it was.
#[derive(Debug, Clone)]
pub struct Selection {
    original: Vec<Color>,
    selected: Option<usize>,
}

impl Selection {
    pub fn new(original: Vec<Color>) -> Self {
        Self {
            original,
            selected: None,
        }
    }

    #[inline]
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Highlights `index` in `colors`, restoring the previous selection.
    /// Returns the indices whose color changed, for partial re-upload.
    pub fn select(&mut self, colors: &mut [Color], index: usize) -> Vec<usize> {
        let mut dirty = Vec::with_capacity(2);

        if let Some(prev) = self.selected.take() {
            if prev != index {
                if let (Some(slot), Some(orig)) = (colors.get_mut(prev), self.original.get(prev)) {
                    *slot = *orig;
                    dirty.push(prev);
                }
            }
        }

        if let Some(slot) = colors.get_mut(index) {
            if *slot != HIGHLIGHT {
                *slot = HIGHLIGHT;
                dirty.push(index);
            }
            self.selected = Some(index);
        } else {
            log::warn!("Pick index {index} is outside the cloud ({} points)", colors.len());
        }

        dirty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREY: Color = [0.5, 0.5, 0.5];
    const BLUE: Color = [0.0, 0.0, 1.0];

    #[test]
    fn switching_selection_restores_previous_color() {
        let original = vec![GREY, BLUE, GREY];
        let mut colors = original.clone();
        let mut sel = Selection::new(original);

        assert_eq!(sel.select(&mut colors, 1), vec![1]);
        assert_eq!(colors[1], HIGHLIGHT);

        assert_eq!(sel.select(&mut colors, 2), vec![1, 2]);
        assert_eq!(colors, vec![GREY, BLUE, HIGHLIGHT]);
        assert_eq!(sel.selected(), Some(2));
    }

    #[test]
    fn reselecting_keeps_point_red() {
        let original = vec![GREY, BLUE];
        let mut colors = original.clone();
        let mut sel = Selection::new(original);

        sel.select(&mut colors, 0);
        assert!(sel.select(&mut colors, 0).is_empty());
        assert_eq!(colors[0], HIGHLIGHT);
        assert_eq!(sel.selected(), Some(0));
    }

    #[test]
    fn at_most_one_point_is_highlighted() {
        let original = vec![GREY; 5];
        let mut colors = original.clone();
        let mut sel = Selection::new(original);

        for i in [3, 0, 4, 4, 1] {
            sel.select(&mut colors, i);
            assert_eq!(colors.iter().filter(|c| **c == HIGHLIGHT).count(), 1);
        }
    }
}
