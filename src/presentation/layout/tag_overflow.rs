//! Tag overflow computation.
//!
//! Given measured tag widths and a container width, [`fit_tags`] finds the
//! longest prefix of tags that fits, reserving room for the "+N" indicator
//! whenever tags would remain hidden. Measurement happens once per tag set
//! ([`measure_chips`]) and never touches the frame buffer; only the fit is
//! recomputed when the container width changes.

use unicode_width::UnicodeWidthStr;

/// Horizontal cells between adjacent chips.
pub const TAG_GAP: u16 = 1;

/// Cells a chip adds around its label (one padding cell per side).
pub const CHIP_PADDING: u16 = 2;

/// Result of the overflow computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagFit {
    /// Number of leading tags to show.
    pub visible: usize,
    /// Number of trailing tags behind the indicator.
    pub hidden: usize,
}

impl TagFit {
    /// Fit of an empty tag set: nothing shown, no indicator.
    pub const EMPTY: Self = Self { visible: 0, hidden: 0 };

    /// Whether the "+N" indicator is shown.
    #[must_use]
    pub const fn has_indicator(&self) -> bool {
        self.hidden > 0
    }
}

/// Rendered width of one chip for `label`.
#[must_use]
pub fn chip_width(label: &str) -> u16 {
    u16::try_from(label.width()).unwrap_or(u16::MAX).saturating_add(CHIP_PADDING)
}

/// Rendered width of the "+N" indicator when `hidden` tags are behind it.
#[must_use]
pub fn indicator_width(hidden: usize) -> u16 {
    u16::try_from(format!("+{hidden}").width()).unwrap_or(u16::MAX)
}

/// Measures every chip once.
#[must_use]
pub fn measure_chips(labels: &[String]) -> Vec<u16> {
    labels.iter().map(|label| chip_width(label)).collect()
}

/// Finds the largest `m` such that the first `m` chips, the gaps between
/// them, and (whenever `m < n`) the indicator all fit into `container`:
///
/// `Σ(w_1..m) + (m-1)·gap + (m<n ? indicator : 0) ≤ container`
///
/// Holds at the extremes: a zero-width container shows nothing and a
/// container wider than everything shows all tags without an indicator.
#[must_use]
pub fn fit_tags(widths: &[u16], gap: u16, indicator: u16, container: u16) -> TagFit {
    let n = widths.len();
    if n == 0 {
        return TagFit::EMPTY;
    }

    let mut used = 0u32;
    let mut budgets = Vec::with_capacity(n);
    for (i, &width) in widths.iter().enumerate() {
        used += u32::from(width);
        if i > 0 {
            used += u32::from(gap);
        }
        budgets.push(used);
    }

    // The reserve vanishes when everything is visible, so the budget is not
    // monotone across the m = n boundary; scan from the full set down.
    for m in (1..=n).rev() {
        let reserve = if m < n { u32::from(indicator) } else { 0 };
        if budgets[m - 1] + reserve <= u32::from(container) {
            return TagFit { visible: m, hidden: n - m };
        }
    }

    TagFit { visible: 0, hidden: n }
}
