use std::sync::OnceLock;
use levenshtein_automata::{Distance, LevenshteinAutomatonBuilder, DFA};
use crate::core::config::MAX_FUZZY_EDITS;
use crate::core::error::{Error, Result};

/// Parametric builders are expensive; one per (distance, transpositions) pair
static BUILDERS: OnceLock<Vec<LevenshteinAutomatonBuilder>> = OnceLock::new();

fn builder(max_edits: u8, transpositions: bool) -> &'static LevenshteinAutomatonBuilder {
    let builders = BUILDERS.get_or_init(|| {
        (0..=MAX_FUZZY_EDITS)
            .flat_map(|d| [false, true].map(|t| LevenshteinAutomatonBuilder::new(d, t)))
            .collect()
    });
    &builders[max_edits as usize * 2 + transpositions as usize]
}

/// Automaton for fuzzy matching with edit distance
pub struct FuzzyAutomaton {
    /// The target term to match
    term: String,

    /// Maximum allowed edit distance (0-2)
    max_edit_distance: u8,

    /// Built DFA for matching
    dfa: DFA,
}

impl FuzzyAutomaton {
    /// Without transpositions this is plain Levenshtein distance
    pub fn new(term: &str, max_edit_distance: u8, transpositions: bool) -> Result<Self> {
        if max_edit_distance > MAX_FUZZY_EDITS {
            return Err(Error::invalid_argument(format!(
                "fuzzy distance must be between 0 and {}, got {}", MAX_FUZZY_EDITS, max_edit_distance
            )));
        }

        Ok(FuzzyAutomaton {
            term: term.to_string(),
            max_edit_distance,
            dfa: builder(max_edit_distance, transpositions).build_dfa(term),
        })
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    /// Edit distance to `candidate` when it is within bounds
    pub fn distance(&self, candidate: &str) -> Option<u8> {
        let mut state = self.dfa.initial_state();
        for &byte in candidate.as_bytes() {
            state = self.dfa.transition(state, byte);
        }

        match self.dfa.distance(state) {
            Distance::Exact(d) if d <= self.max_edit_distance => Some(d),
            _ => None,
        }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.distance(candidate).is_some()
    }

    /// Score multiplier for a term found at `distance` edits
    pub fn similarity(&self, distance: u8) -> f32 {
        let len = self.term.chars().count() as f32;
        1.0 - distance as f32 / (len + 1.0)
    }
}
