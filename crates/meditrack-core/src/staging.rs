//! Breast-cancer staging and molecular subtyping.
//!
//! Both derivations are deliberate simplifications used to pre-fill the
//! explicit diagnosis fields and as a display fallback when those fields are
//! unset. They are not a substitute for the AJCC tables.

use crate::models::{
    BreastCancerSubtype, Her2Status, ReceptorStatus, TumorM, TumorN, TumorStage, TumorT,
};

/// Inputs to [`calculate_subtype`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReceptorPanel {
    pub er: ReceptorStatus,
    pub pr: ReceptorStatus,
    pub her2: Her2Status,
    pub ki67: Option<f64>,
}

/// Ki-67 threshold (percent) separating luminal A from luminal B.
pub const KI67_LUMINAL_A_THRESHOLD: f64 = 20.0;

/// Derive the stage group from TNM.
///
/// Decision order: `M1` is IV; `T4` or any `N3*` is III; `T3` or any `N2*`
/// is III; `T2` with any `N1*` is II; `T0`/`Tis`/`T1*` with `N0` is I;
/// everything else falls back to II. Only the bare `T4` triggers the T4
/// branch, so `T4a`..`T4d` without nodal or distant disease land on II.
pub fn calculate_stage(t: TumorT, n: TumorN, m: TumorM) -> TumorStage {
    if m == TumorM::M1 {
        return TumorStage::IV;
    }

    if t == TumorT::T4 || matches!(n, TumorN::N3 | TumorN::N3a | TumorN::N3b | TumorN::N3c) {
        return TumorStage::III;
    }

    if t == TumorT::T3 || matches!(n, TumorN::N2 | TumorN::N2a | TumorN::N2b) {
        return TumorStage::III;
    }

    if t == TumorT::T2 && matches!(n, TumorN::N1 | TumorN::N1a | TumorN::N1b | TumorN::N1c) {
        return TumorStage::II;
    }

    let early_tumor = matches!(
        t,
        TumorT::T0 | TumorT::Tis | TumorT::T1 | TumorT::T1a | TumorT::T1b | TumorT::T1c
    );
    if early_tumor && n == TumorN::N0 {
        return TumorStage::I;
    }

    TumorStage::II
}

/// Derive the molecular subtype from the receptor panel.
///
/// Hormone-receptor positive means ER or PR is `+` or `low`. HER2 positive
/// means `+` or `IHC2+FISH+`; `IHC2+FISH-` counts as negative. A
/// hormone-positive, HER2-negative tumor is luminal A only when Ki-67 is
/// known and below 20%.
pub fn calculate_subtype(panel: &ReceptorPanel) -> BreastCancerSubtype {
    let hormonal_positive = is_receptor_positive(panel.er) || is_receptor_positive(panel.pr);
    let her2_positive = matches!(panel.her2, Her2Status::Positive | Her2Status::Ihc2FishPositive);

    match (hormonal_positive, her2_positive) {
        (false, false) => BreastCancerSubtype::TripleNegative,
        (false, true) => BreastCancerSubtype::Her2Positive,
        (true, true) => BreastCancerSubtype::LuminalBHer2Positive,
        (true, false) => match panel.ki67 {
            Some(ki67) if ki67 < KI67_LUMINAL_A_THRESHOLD => BreastCancerSubtype::LuminalA,
            _ => BreastCancerSubtype::LuminalBHer2Negative,
        },
    }
}

fn is_receptor_positive(status: ReceptorStatus) -> bool {
    matches!(status, ReceptorStatus::Positive | ReceptorStatus::Low)
}
