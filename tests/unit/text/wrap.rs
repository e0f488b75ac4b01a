use super::*;
use crate::text::metrics::FixedAdvanceMetrics;

#[test]
fn wraps_with_caption_rule() {
    let mut m = FixedAdvanceMetrics::new(10.0);
    // "Lectura del" = 110 < 120, adding " santo" would reach 170.
    let lines = wrap_lines("Lectura del  santo Evangelio", 120.0, &mut m);
    assert_eq!(lines, vec!["Lectura del", "santo", "Evangelio"]);
}

#[test]
fn blank_title_has_no_lines() {
    let mut m = FixedAdvanceMetrics::new(10.0);
    assert!(wrap_lines("   ", 100.0, &mut m).is_empty());
}
