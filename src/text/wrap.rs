use crate::text::layout::break_lines;
use crate::text::metrics::FontMetrics;

/// Pre-wrap a heading into lines with the caption fill rule. Done once per render.
pub fn wrap_lines(text: &str, max_width: f64, metrics: &mut dyn FontMetrics) -> Vec<String> {
    let (lines, _) = break_lines(text, max_width, metrics);
    lines
        .into_iter()
        .map(|l| {
            l.words
                .iter()
                .map(|(w, _)| *w)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/text/wrap.rs"]
mod tests;
