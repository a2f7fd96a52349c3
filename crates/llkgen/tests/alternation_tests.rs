//! Tests for alternation merging, divisions and ambiguity suppression

use llkgen::diagnostics::{DiagnosticCode, Severity};
use llkgen::grammar::GrammarBuilder;
use llkgen::pred::{Division, EXIT_ARM, LoopMode, Pred};
use llkgen::terminal::KindSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(dead_code)]
enum TestKind {
    Number,
    Ident,
    Plus,
    Minus,
    LParen,
    RParen,
}

type Builder = GrammarBuilder<KindSet<TestKind>>;

/// Calls of rules `A`, `B`, `C`, ... (rule calls never collapse into one
/// terminal, unlike token alternatives).
fn calls(b: &mut Builder, names: &[&str]) -> Vec<Pred<KindSet<TestKind>>> {
    names
        .iter()
        .map(|name| {
            let id = b.declare(name);
            b.call(id).unwrap()
        })
        .collect()
}

fn arm_count(p: &Pred<KindSet<TestKind>>) -> usize {
    p.as_alts().map_or(1, |a| a.arm_count())
}

#[test]
fn test_token_alternatives_become_one_set() {
    let mut b = Builder::new();
    let (plus, minus) = (b.single(TestKind::Plus), b.single(TestKind::Minus));
    let op = b.or(plus, minus);
    assert!(op.is_terminal());
    assert_eq!(op.to_string(), "(Minus|Plus)");
    assert!(b.diagnostics().is_empty());
}

#[test]
fn test_three_way_alternation_is_flat_either_way() {
    let mut b = Builder::new();
    let [x, y, z]: [_; 3] = calls(&mut b, &["A", "B", "C"]).try_into().unwrap();
    let xy = b.or(x.clone(), y.clone());
    let left = b.or(xy, z.clone());

    let yz = b.or(y, z);
    let right = b.or(x, yz);

    assert_eq!(arm_count(&left), 3);
    assert_eq!(arm_count(&right), 3);
    assert_eq!(left.to_string(), right.to_string());
}

#[test]
fn test_divisions_stay_in_bounds() {
    let mut b = Builder::new();
    let [a, c, d, e, f]: [_; 5] = calls(&mut b, &["A", "C", "D", "E", "F"]).try_into().unwrap();
    let cd = b.ordered(c, d);
    let acd = b.or(a, cd);
    let ef = b.or(e, f);
    let all = b.ordered(ef, acd);

    let alts = all.as_alts().unwrap();
    assert_eq!(alts.arm_count(), 5);
    let n = i16::try_from(alts.arm_count()).unwrap();
    for d in alts.divisions() {
        assert!(0 <= d.left && d.left <= d.mid && d.mid <= d.right && d.right <= n);
    }
    assert!(alts.divisions().contains(&Division::new(0, 2, 5, true)));
}

#[test]
fn test_grouped_ordered_alternation_suppresses_across_slash() {
    let mut b = Builder::new();
    let [a, x, c, d]: [_; 4] = calls(&mut b, &["A", "B", "C", "D"]).try_into().unwrap();
    let ab = b.or(a, x);
    let cd = b.or(c, d);
    let all = b.ordered(ab, cd);
    let alts = all.as_alts().unwrap();

    for (i, j) in [(0, 2), (0, 3), (1, 2), (1, 3)] {
        assert!(alts.should_suppress_warning(i, j, 0), "{i} vs {j}");
    }
    assert!(!alts.should_suppress_warning(0, 1, 0));
    assert!(!alts.should_suppress_warning(2, 3, 0));
}

#[test]
fn test_default_arm_is_unique() {
    let mut b = Builder::new();
    let [x, y, z]: [_; 3] = calls(&mut b, &["A", "B", "C"]).try_into().unwrap();
    let x = b.default_arm(x);
    let xy = b.or(x, y);
    let z = b.default_arm(z);
    let all = b.or(xy, z);

    let diags: Vec<_> = b.diagnostics().iter().collect();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].severity, Severity::Error);
    assert_eq!(diags[0].message, "there is already a default branch");
    assert_eq!(all.as_alts().unwrap().default_arm(), Some(0));
}

#[test]
fn test_error_branch_position_warning_can_be_disabled() {
    use llkgen::config::GrammarConfig;

    for warn in [true, false] {
        let config = GrammarConfig::default().with_warn_error_branch_position(warn);
        let mut b = Builder::with_config(config);
        let [x, e, y]: [_; 3] = calls(&mut b, &["A", "E", "B"]).try_into().unwrap();
        let e = b.error_branch(e, false);
        let xe = b.or(x, e);
        let all = b.or(xe, y);
        assert_eq!(arm_count(&all), 2);
        assert_eq!(
            b.diagnostics().count_code(DiagnosticCode::ErrorBranchPosition),
            usize::from(warn)
        );
    }
}

#[test]
fn test_ambiguity_reports_are_memoized() {
    let mut b = Builder::new();
    let [w, x, y, z]: [_; 4] = calls(&mut b, &["A", "B", "C", "D"]).try_into().unwrap();
    let wx = b.or(w, x);
    let yz = b.or(y, z);
    let mut all = b.or(wx, yz);
    let alts = all.as_alts_mut().unwrap();

    assert!(alts.should_report_ambiguity(&[1, 2], 0, false));
    assert!(!alts.should_report_ambiguity(&[1, 2], 0, false));
    assert!(alts.should_report_ambiguity(&[1, 2, 3], 0, false));

    all.discard_analysis();
    let alts = all.as_alts_mut().unwrap();
    assert!(alts.should_report_ambiguity(&[1, 2], 0, false));
}

#[test]
fn test_greedy_loop_does_not_report_exit() {
    let mut b = Builder::new();
    let [x, y]: [_; 2] = calls(&mut b, &["A", "B"]).try_into().unwrap();
    let body = b.or(x, y);
    let mut lp = b.star_greedy(body, true).unwrap();
    let alts = lp.as_alts_mut().unwrap();
    assert_eq!(alts.mode(), LoopMode::Star);
    assert!(!alts.should_report_ambiguity(&[EXIT_ARM, 0], 0, false));
    assert_eq!(alts.alt_name(EXIT_ARM), "exit");
    assert_eq!(alts.alt_name(1), "2:B");
}

#[test]
fn test_clones_are_independent() {
    let mut b = Builder::new();
    let [x, y, z]: [_; 3] = calls(&mut b, &["A", "B", "C"]).try_into().unwrap();
    let original = b.or(x, y);
    let copy = original.clone();
    let grown = b.or(copy, z);

    assert_eq!(arm_count(&original), 2);
    assert_eq!(arm_count(&grown), 3);
    assert_ne!(original, grown);
}

#[test]
fn test_extra_mask_drops_arms_from_reports() {
    let mut b = Builder::new();
    let [x, y, z]: [_; 3] = calls(&mut b, &["A", "B", "C"]).try_into().unwrap();
    let xy = b.ordered(x, y);
    let mut all = b.or(xy, z);
    assert_eq!(all.to_string(), "A / B | C");
    let alts = all.as_alts_mut().unwrap();

    // Everything in the mask: nothing left to report.
    assert!(!alts.should_report_ambiguity(&[0, 2], 0b101, false));

    // B is ordered against A and masked against C, so only A and C remain.
    let mask = 0b110;
    assert!(alts.should_report_ambiguity(&[0, 1, 2], mask, false));
    assert!(!alts.should_report_ambiguity(&[0, 1, 2], mask, false));
    assert!(!alts.should_report_ambiguity(&[0, 2], 0, false));

    // Without the mask B is ambiguous with C, which is new.
    assert!(alts.should_report_ambiguity(&[0, 1, 2], 0, false));
}

#[test]
fn test_alt_name_follows_configured_budget() {
    use llkgen::config::GrammarConfig;

    let config = GrammarConfig::default().with_alt_name_max_len(2);
    let mut b = Builder::with_config(config);
    let [n, i]: [_; 2] = calls(&mut b, &["Number", "Ident"]).try_into().unwrap();
    let token = b.or(n, i);
    let alts = token.as_alts().unwrap();
    assert_eq!(b.grammar().alt_name(alts, 0), "1");
    assert_eq!(b.grammar().alt_name(alts, 1), "2");
    assert_eq!(alts.alt_name(0), "1:Number");
}
