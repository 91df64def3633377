use crate::profile::{self, MatchPolicy};
use crate::state::Selection;
use serde::Serialize;
use std::path::PathBuf;

/// One located profile declaration with its score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub name: String,
    pub path: PathBuf,
    pub score: usize,
}

impl Candidate {
    pub fn new(path: PathBuf, declaration: &str, score: usize) -> Self {
        Self {
            name: profile::profile_name(&path, declaration),
            path,
            score,
        }
    }
}

/// Outcome of ranking all candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The winner agrees with every detected fact.
    Perfect { selection: Selection, score: usize },
    /// Best-effort winner agreeing with `score` of `total` facts.
    Partial {
        selection: Selection,
        score: usize,
        total: usize,
    },
    /// No profile could be selected.
    Unmatched(Unmatched),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unmatched {
    NoCandidates,
    /// Exact mode, and the best profile still missed some facts.
    NotExact { best: usize, total: usize },
}

impl Resolution {
    pub fn selection(&self) -> Option<&Selection> {
        match self {
            Resolution::Perfect { selection, .. } | Resolution::Partial { selection, .. } => {
                Some(selection)
            }
            Resolution::Unmatched(_) => None,
        }
    }
}

/// Highest score first; equal scores ordered by profile name, then path.
pub fn rank(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.path.cmp(&b.path))
    });
}

/// Pick the winning profile out of `candidates` for an inventory holding
/// `total` facts. `candidates` is left ranked.
pub fn resolve(candidates: &mut [Candidate], total: usize, policy: MatchPolicy) -> Resolution {
    rank(candidates);

    let Some(best) = candidates.first() else {
        return Resolution::Unmatched(Unmatched::NoCandidates);
    };

    if policy == MatchPolicy::Exact && best.score != total {
        return Resolution::Unmatched(Unmatched::NotExact {
            best: best.score,
            total,
        });
    }

    let selection = Selection {
        name: best.name.clone(),
        dir: profile::profile_dir(&best.path),
    };

    if best.score == total {
        Resolution::Perfect {
            selection,
            score: best.score,
        }
    } else {
        Resolution::Partial {
            selection,
            score: best.score,
            total,
        }
    }
}
