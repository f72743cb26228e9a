use serde::{Deserialize, Serialize};

const ZONE_SPAN: f64 = 33.33;
const LAST_ZONE_SPAN: f64 = 33.34;
const YELLOW_FLOOR: f64 = 33.33;
const GREEN_FLOOR: f64 = 66.66;
/// Beyond this the bar is full; the displayed number keeps going.
const FILL_CEILING_PCT: f64 = 150.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressZone {
    /// Under target (up to and including 50%).
    Red,
    /// Near target (above 50%, up to and including 100%).
    Yellow,
    /// Over target.
    Green,
}

impl ProgressZone {
    pub fn label(self) -> &'static str {
        match self {
            ProgressZone::Red => "red",
            ProgressZone::Yellow => "yellow",
            ProgressZone::Green => "green",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressBar {
    pub zone: ProgressZone,
    /// Visual fill in `[0, 100]`; each zone owns one third of the bar.
    pub visual_fill: f64,
    /// Percentage shown to the player, never clamped.
    pub display_percentage: f64,
}

/// Map a percentage onto the three-zone bar. Invalid input (negative, NaN,
/// infinite) renders as an empty red bar.
pub fn compute_progress_bar(percentage: f64) -> ProgressBar {
    let pct = if percentage.is_finite() && percentage > 0.0 {
        percentage
    } else {
        0.0
    };

    let (zone, fill) = if pct <= 50.0 {
        (ProgressZone::Red, (pct / 50.0) * ZONE_SPAN)
    } else if pct <= 100.0 {
        (
            ProgressZone::Yellow,
            YELLOW_FLOOR + ((pct - 50.0) / 50.0) * ZONE_SPAN,
        )
    } else {
        let fill = if pct >= FILL_CEILING_PCT {
            100.0
        } else {
            (GREEN_FLOOR + ((pct - 100.0) / 50.0) * LAST_ZONE_SPAN).min(100.0)
        };
        (ProgressZone::Green, fill)
    };

    ProgressBar {
        zone,
        visual_fill: fill,
        display_percentage: pct,
    }
}

/// Fixed-width text rendering, e.g. `[#######.............]`.
pub fn render_text_bar(bar: &ProgressBar, width: usize) -> String {
    let filled = ((bar.visual_fill / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    let mut out = String::with_capacity(width + 2);
    out.push('[');
    out.extend(std::iter::repeat_n('#', filled));
    out.extend(std::iter::repeat_n('.', width - filled));
    out.push(']');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn zone_boundaries() {
        let cases = [
            (0.0, ProgressZone::Red, 0.0),
            (50.0, ProgressZone::Red, 33.33),
            (85.0, ProgressZone::Yellow, 56.66),
            (100.0, ProgressZone::Yellow, 66.66),
            (110.0, ProgressZone::Green, 73.33),
            (150.0, ProgressZone::Green, 100.0),
            (200.0, ProgressZone::Green, 100.0),
        ];
        for (pct, zone, fill) in cases {
            let bar = compute_progress_bar(pct);
            assert_eq!(bar.zone, zone, "zone for {pct}");
            assert!(close(bar.visual_fill, fill), "fill for {pct}: {}", bar.visual_fill);
        }
    }

    #[test]
    fn displayed_percentage_is_not_clamped() {
        let bar = compute_progress_bar(200.0);
        assert_eq!(bar.display_percentage, 200.0);
        assert!(bar.visual_fill <= 100.0);
    }

    #[test]
    fn fill_is_monotonic() {
        let mut last = -1.0;
        for step in 0..=400 {
            let bar = compute_progress_bar(step as f64 * 0.5);
            assert!(bar.visual_fill >= last);
            last = bar.visual_fill;
        }
    }

    #[test]
    fn invalid_input_is_empty_red() {
        for pct in [-10.0, f64::NAN, f64::INFINITY] {
            let bar = compute_progress_bar(pct);
            assert_eq!(bar.zone, ProgressZone::Red);
            assert_eq!(bar.visual_fill, 0.0);
            assert_eq!(bar.display_percentage, 0.0);
        }
    }

    #[test]
    fn text_bar_width() {
        let bar = compute_progress_bar(100.0);
        let text = render_text_bar(&bar, 30);
        assert_eq!(text.len(), 32);
        assert_eq!(text.matches('#').count(), 20);
    }
}
