//! Structured diagnoses attached to a patient.

use serde::{Deserialize, Serialize};

use super::FieldError;
use crate::staging::{calculate_stage, calculate_subtype, ReceptorPanel};

/// Patient diagnosis, tagged by diagnosis kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "diagnosis", content = "details")]
pub enum Diagnosis {
    #[serde(rename = "breast-cancer")]
    BreastCancer(BreastCancerDetails),
}

impl Diagnosis {
    /// Wire name of the diagnosis kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Diagnosis::BreastCancer(_) => "breast-cancer",
        }
    }

    pub(crate) fn collect_errors(&self, errors: &mut Vec<FieldError>) {
        match self {
            Diagnosis::BreastCancer(details) => details.collect_errors(errors),
        }
    }
}

/// Breast-cancer diagnosis detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreastCancerDetails {
    pub localization: TumorLocalization,
    pub tnm_t: TumorT,
    pub tnm_n: TumorN,
    pub tnm_m: TumorM,
    /// Explicit stage; derived from TNM when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<TumorStage>,
    pub metastatic_status: MetastaticStatus,
    pub tumor_type: TumorType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tumor_type_other: Option<String>,
    pub er: ReceptorStatus,
    pub pr: ReceptorStatus,
    pub her2: Her2Status,
    /// Ki-67 proliferation index, percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ki67: Option<f64>,
    pub grade: TumorGrade,
    /// Explicit molecular subtype; derived from the receptor panel when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<BreastCancerSubtype>,
}

impl BreastCancerDetails {
    /// Stored stage, or the TNM-derived one.
    pub fn effective_stage(&self) -> TumorStage {
        self.stage
            .unwrap_or_else(|| calculate_stage(self.tnm_t, self.tnm_n, self.tnm_m))
    }

    /// Stored subtype, or the panel-derived one.
    pub fn effective_subtype(&self) -> BreastCancerSubtype {
        self.subtype
            .unwrap_or_else(|| calculate_subtype(&self.receptor_panel()))
    }

    pub fn receptor_panel(&self) -> ReceptorPanel {
        ReceptorPanel {
            er: self.er,
            pr: self.pr,
            her2: self.her2,
            ki67: self.ki67,
        }
    }

    fn collect_errors(&self, errors: &mut Vec<FieldError>) {
        if let Some(ki67) = self.ki67 {
            if !ki67.is_finite() || !(0.0..=100.0).contains(&ki67) {
                errors.push(FieldError::new(
                    "diagnosis.details.ki67",
                    "must be between 0 and 100",
                ));
            }
        }
    }
}

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire representation.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }

            /// Parse the wire representation.
            pub fn parse(raw: &str) -> Option<Self> {
                match raw {
                    $($wire => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum! {
    /// Anatomic stage group.
    TumorStage { I => "I", II => "II", III => "III", IV => "IV" }
}

wire_enum! {
    /// Primary tumor (T) category.
    TumorT {
        T0 => "T0", Tis => "Tis", T1 => "T1", T1a => "T1a", T1b => "T1b", T1c => "T1c",
        T2 => "T2", T3 => "T3", T4 => "T4", T4a => "T4a", T4b => "T4b", T4c => "T4c",
        T4d => "T4d",
    }
}

wire_enum! {
    /// Regional lymph node (N) category.
    TumorN {
        N0 => "N0", N1 => "N1", N1a => "N1a", N1b => "N1b", N1c => "N1c", N2 => "N2",
        N2a => "N2a", N2b => "N2b", N3 => "N3", N3a => "N3a", N3b => "N3b", N3c => "N3c",
    }
}

wire_enum! {
    /// Distant metastasis (M) category.
    TumorM { M0 => "M0", M1 => "M1" }
}

wire_enum! {
    TumorLocalization { Left => "left", Right => "right", Both => "both" }
}

wire_enum! {
    MetastaticStatus { Early => "early", Metastatic => "metastatic" }
}

wire_enum! {
    /// Hormone receptor (ER/PR) status.
    ReceptorStatus { Negative => "0", Low => "low", Positive => "+" }
}

wire_enum! {
    /// HER2 status, including FISH-qualified IHC 2+ results.
    Her2Status {
        Zero => "0",
        Low => "low",
        Positive => "+",
        Ihc2FishPositive => "IHC2+FISH+",
        Ihc2FishNegative => "IHC2+FISH-",
    }
}

wire_enum! {
    TumorGrade { G1 => "G1", G2 => "G2", G3 => "G3" }
}

wire_enum! {
    /// Histologic tumor type; `Other` pairs with `tumorTypeOther`.
    TumorType { InvasiveNst => "invasive-nst", Lobular => "lobular", Other => "other" }
}

wire_enum! {
    /// Molecular subtype.
    BreastCancerSubtype {
        LuminalA => "luminal-a",
        LuminalBHer2Negative => "luminal-b-her2-negative",
        LuminalBHer2Positive => "luminal-b-her2-positive",
        Her2Positive => "her2-positive",
        TripleNegative => "triple-negative",
    }
}
