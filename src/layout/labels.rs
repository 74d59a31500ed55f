use crate::dataset::Record;

use super::LayoutConfig;

/// Where a tile's text goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelPlacement {
    /// Drawn inside the tile, centred on the anchor.
    Inline,
    /// Tile is too small to be legible; drawn outside with a leader line.
    Callout,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileLabel {
    pub anchor_x: f64,
    pub anchor_y: f64,
    /// `name=count`
    pub text: String,
    pub placement: LabelPlacement,
}

/// Label for a tile at `(x, y, w, h)`, anchored on its centroid.
pub fn label_for(record: &Record, x: f64, y: f64, w: f64, h: f64, config: &LayoutConfig) -> TileLabel {
    let placement = if w > config.min_inline_width && h > config.min_inline_height {
        LabelPlacement::Inline
    } else {
        LabelPlacement::Callout
    };

    TileLabel {
        anchor_x: x + w / 2.0,
        anchor_y: y + h / 2.0,
        text: format!("{}={}", record.name, record.count),
        placement,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Record {
        Record {
            name: "alice".into(),
            count: 50,
            rank: 1,
        }
    }

    #[test]
    fn roomy_tiles_are_inline() {
        let label = label_for(&record(), 10.0, 20.0, 200.0, 100.0, &LayoutConfig::default());
        assert_eq!(label.placement, LabelPlacement::Inline);
        assert_eq!((label.anchor_x, label.anchor_y), (110.0, 70.0));
        assert_eq!(label.text, "alice=50");
    }

    #[test]
    fn both_sides_must_clear_the_threshold() {
        let config = LayoutConfig::default();
        let wide_but_flat = label_for(&record(), 0.0, 0.0, 500.0, config.min_inline_height, &config);
        assert_eq!(wide_but_flat.placement, LabelPlacement::Callout);

        let tall_but_narrow = label_for(&record(), 0.0, 0.0, 10.0, 400.0, &config);
        assert_eq!(tall_but_narrow.placement, LabelPlacement::Callout);
    }
}
