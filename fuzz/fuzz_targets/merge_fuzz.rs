#![no_main]
use libfuzzer_sys::fuzz_target;
use llkgen::pred::{EXIT_ARM, PredKind};
use llkgen::testing::{ScriptConfig, ScriptOp, run_script};

fuzz_target!(|data: &[u8]| {
    let ops = ScriptOp::decode(data);
    let outcome = run_script(&ops, &ScriptConfig::default());

    for mut pred in outcome.stack {
        // Printing walks every division; it must never index out of range.
        let _ = pred.to_string();

        let copy = pred.clone();
        assert_eq!(copy, pred);

        if let PredKind::Alts(alts) = &mut pred.kind {
            let n = i16::try_from(alts.arm_count()).unwrap_or(i16::MAX);
            for d in alts.divisions() {
                assert!(0 <= d.left && d.left <= d.mid && d.mid <= d.right && d.right <= n);
            }
            let arms: Vec<i32> = data.iter().take(6).map(|&b| i32::from(b % 8) - 1).collect();
            if alts.should_report_ambiguity(&arms, 0, false) {
                assert!(!alts.should_report_ambiguity(&arms, 0, false));
            }
            let _ = alts.alt_name(EXIT_ARM);
        }
    }
});
