//! Random sampling of strings from a grammar.
//!
//! Each candidate starts from the start symbol and rewrites a randomly chosen
//! non-terminal with a randomly chosen alternative until only terminals are
//! left. Candidates that grow past the configured ceilings are dropped, so a
//! restrictive grammar may yield fewer samples than requested.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::grammar::{Grammar, SententialForm};

/// Source of uniform choices for the generator
pub trait RandomSource {
    /// Pick an index in `0..len`; `len` is never zero
    fn pick(&mut self, len: usize) -> usize;
}

/// Uniform random choices backed by a standard RNG
#[derive(Debug, Clone)]
pub struct RandomWalk {
    rng: StdRng,
}

impl RandomWalk {
    /// Seeded from OS entropy
    pub fn new() -> Self {
        RandomWalk {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded for reproducible sampling
    pub fn from_seed(seed: u64) -> Self {
        RandomWalk {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomWalk {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for RandomWalk {
    fn pick(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

/// Limits applied while sampling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Stop once this many strings have been accepted
    pub max_samples: usize,
    /// Total number of candidates to try
    pub max_attempts: usize,
    /// Abandon a candidate once its form holds more terminals than this
    pub max_terminals: usize,
    /// Discard finished strings longer than this
    pub max_length: usize,
    /// Abandon a candidate after this many rewrites
    pub max_rewrites: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            max_samples: 10,
            max_attempts: 1000,
            max_terminals: 10,
            max_length: 10,
            max_rewrites: 10_000,
        }
    }
}

/// Sampler over one grammar
pub struct Generator<'g, R: RandomSource> {
    grammar: &'g Grammar,
    config: GeneratorConfig,
    source: R,
}

impl<'g> Generator<'g, RandomWalk> {
    /// Sampler with default limits and an entropy-seeded source
    pub fn new(grammar: &'g Grammar) -> Self {
        Generator::with_source(grammar, GeneratorConfig::default(), RandomWalk::new())
    }
}

impl<'g, R: RandomSource> Generator<'g, R> {
    pub fn with_source(grammar: &'g Grammar, config: GeneratorConfig, source: R) -> Self {
        Generator {
            grammar,
            config,
            source,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Collect up to `max_samples` accepted strings; duplicates are kept
    pub fn generate(&mut self) -> Vec<String> {
        let mut results = Vec::new();
        let mut attempts = 0;
        while results.len() < self.config.max_samples && attempts < self.config.max_attempts {
            attempts += 1;
            if let Some(s) = self.generate_one() {
                results.push(s);
            }
        }
        debug!(accepted = results.len(), attempts, "finished sampling grammar");
        results
    }

    /// Expand a single candidate, or `None` if it was abandoned or too long
    pub fn generate_one(&mut self) -> Option<String> {
        let mut form = SententialForm::start(self.grammar.start_symbol());
        let mut rewrites = 0;

        while form.has_non_terminal() {
            if form.terminal_count() > self.config.max_terminals {
                trace!(form = %form, "abandoned: too many terminals");
                return None;
            }
            if rewrites >= self.config.max_rewrites {
                trace!(form = %form, "abandoned: rewrite limit");
                return None;
            }

            let positions: Vec<(usize, char)> = form.non_terminal_positions().collect();
            let (position, non_terminal) = positions[self.source.pick(positions.len())];
            let alternatives = self.grammar.alternatives(non_terminal);
            if alternatives.is_empty() {
                trace!(%non_terminal, "abandoned: no production");
                return None;
            }
            let alternative = &alternatives[self.source.pick(alternatives.len())];
            form = form.rewrite(position, alternative);
            rewrites += 1;
        }

        let result = form.concat();
        if result.chars().count() > self.config.max_length {
            trace!(%result, "discarded: too long");
            return None;
        }
        Some(result)
    }
}

/// Sample up to ten strings with default limits
pub fn generate(grammar: &Grammar) -> Vec<String> {
    Generator::new(grammar).generate()
}

impl Grammar {
    /// Sample strings from this grammar with default limits
    pub fn generate(&self) -> Vec<String> {
        generate(self)
    }
}
