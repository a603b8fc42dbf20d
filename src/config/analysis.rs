//! Analysis stage enumeration

use std::fmt;
use std::str::FromStr;

/// One named optional analysis stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Analysis {
    Agat,
    Busco,
    Psauron,
    Omark,
    Detenga,
    Prothomology,
    Lai,
    Rnaseq,
}

/// Execution order of the optional stages. The configured `Analysis` list
/// selects which stages run; this order decides when, regardless of how the
/// user ordered them.
pub const CANONICAL_ORDER: [Analysis; 8] = [
    Analysis::Agat,
    Analysis::Busco,
    Analysis::Psauron,
    Analysis::Omark,
    Analysis::Detenga,
    Analysis::Prothomology,
    Analysis::Lai,
    Analysis::Rnaseq,
];

impl Analysis {
    pub fn name(&self) -> &'static str {
        match self {
            Analysis::Agat => "AGAT",
            Analysis::Busco => "BUSCO",
            Analysis::Psauron => "PSAURON",
            Analysis::Omark => "OMARK",
            Analysis::Detenga => "DETENGA",
            Analysis::Prothomology => "PROTHOMOLOGY",
            Analysis::Lai => "LAI",
            Analysis::Rnaseq => "RNASEQ",
        }
    }

    /// External binaries the stage shells out to.
    pub fn binaries(&self) -> &'static [&'static str] {
        match self {
            Analysis::Agat => &[
                "agat_sp_statistics.pl",
                "agat_sp_flag_premature_stop_codons.pl",
                "agat_sp_filter_incomplete_gene_coding_models.pl",
            ],
            Analysis::Busco => &["busco"],
            Analysis::Psauron => &["psauron"],
            Analysis::Omark => &["omamer", "omark"],
            Analysis::Detenga => &["TEsorter", "interproscan.sh"],
            Analysis::Prothomology => &["diamond"],
            Analysis::Lai => &["gt", "LTR_FINDER_parallel", "LTR_retriever", "LAI"],
            Analysis::Rnaseq => &["stringtie", "gffcompare"],
        }
    }
}

impl fmt::Display for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAnalysis(pub String);

impl fmt::Display for UnknownAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is not a valid analysis", self.0)
    }
}

impl FromStr for Analysis {
    type Err = UnknownAnalysis;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "AGAT" => Ok(Analysis::Agat),
            "BUSCO" => Ok(Analysis::Busco),
            "PSAURON" => Ok(Analysis::Psauron),
            "OMARK" => Ok(Analysis::Omark),
            "DETENGA" => Ok(Analysis::Detenga),
            "PROTHOMOLOGY" => Ok(Analysis::Prothomology),
            "LAI" => Ok(Analysis::Lai),
            "RNASEQ" => Ok(Analysis::Rnaseq),
            other => Err(UnknownAnalysis(other.to_string())),
        }
    }
}
