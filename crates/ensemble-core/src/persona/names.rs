//! Persona name pools and the name generator.
//!
//! The catalogue is static, read-only data shared by every generator. Each
//! [`NameGenerator`] owns only its `used` set and random source, both behind
//! one mutex, so concurrent callers in a process never receive the same name
//! while the relevant pool still has unused entries.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A named category of candidate persona names.
#[derive(Debug, Clone, Copy)]
pub struct NameCategory {
    pub name: &'static str,
    pub names: &'static [&'static str],
}

/// The full catalogue. Category names are lowercase.
pub static NAME_POOL: &[NameCategory] = &[
    NameCategory {
        name: "scientists",
        names: &[
            "Curie", "Newton", "Einstein", "Darwin", "Tesla", "Faraday", "Galileo", "Kepler",
            "Bohr", "Feynman", "Hopper", "Lovelace", "Turing", "Noether", "Pasteur", "Planck",
            "Maxwell", "Franklin", "Hawking", "Sagan",
        ],
    },
    NameCategory {
        name: "explorers",
        names: &[
            "Amundsen", "Shackleton", "Earhart", "Armstrong", "Gagarin", "Polo", "Cook",
            "Hillary", "Norgay", "Lewis", "Clark", "Drake", "Hudson", "Vespucci", "Cousteau",
            "Livingstone", "Nansen", "Peary", "Tereshkova", "Ride",
        ],
    },
    NameCategory {
        name: "artists",
        names: &[
            "Picasso", "Monet", "Kahlo", "Rembrandt", "Vermeer", "Dali", "Matisse", "Klimt",
            "Cezanne", "Renoir", "Hokusai", "Warhol", "Pollock", "Rothko", "Magritte", "Degas",
            "Gauguin", "Turner", "Botticelli", "Caravaggio",
        ],
    },
    NameCategory {
        name: "philosophers",
        names: &[
            "Socrates", "Plato", "Aristotle", "Kant", "Hume", "Descartes", "Spinoza", "Leibniz",
            "Locke", "Confucius", "Laozi", "Seneca", "Epictetus", "Nietzsche", "Hegel", "Sartre",
            "Arendt", "Wittgenstein", "Russell", "Popper",
        ],
    },
    NameCategory {
        name: "mythology",
        names: &[
            "Athena", "Apollo", "Hermes", "Odin", "Thor", "Freya", "Isis", "Osiris", "Prometheus",
            "Artemis",
        ],
    },
    NameCategory {
        name: "detectives",
        names: &[
            "Holmes", "Poirot", "Marple", "Columbo", "Dupin", "Maigret", "Morse", "Wimsey",
            "Spade", "Marlowe",
        ],
    },
    NameCategory {
        name: "composers",
        names: &[
            "Bach", "Mozart", "Beethoven", "Chopin", "Vivaldi", "Handel", "Haydn", "Brahms",
            "Debussy", "Ravel",
        ],
    },
];

/// Persona-type substrings mapped to the categories their names are drawn
/// from. First matching rule wins; a rule with two categories picks one by
/// coin flip.
const PERSONA_CATEGORY_RULES: &[(&[&str], &[&str])] = &[
    (&["orchestr", "manager", "lead", "coordinat"], &["mythology", "philosophers"]),
    (&["architect"], &["philosophers", "scientists"]),
    (&["design"], &["artists"]),
    (&["test", "qa", "review", "audit"], &["detectives"]),
    (&["devops", "ops", "deploy", "infra"], &["explorers"]),
    (&["develop", "engineer", "coder", "program", "implement"], &["scientists", "explorers"]),
    (&["writer", "doc"], &["composers", "philosophers"]),
];

/// Prefix for synthetic names issued once every pooled name is taken.
const SYNTHETIC_PREFIX: &str = "Agent";

struct GeneratorState {
    used: HashSet<String>,
    rng: StdRng,
}

/// Issues unique, category-appropriate persona names.
pub struct NameGenerator {
    state: Mutex<GeneratorState>,
}

impl Default for NameGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl NameGenerator {
    /// Creates a generator seeded from OS entropy.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Creates a generator with a fixed seed, for reproducible issuance.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            state: Mutex::new(GeneratorState {
                used: HashSet::new(),
                rng,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GeneratorState> {
        // The state stays consistent even if a holder panicked mid-call.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a random unused name from any category.
    ///
    /// Falls back to a synthetic time-suffixed name once all pools are empty.
    pub fn get_random_name(&self) -> String {
        let mut state = self.lock();
        Self::random_name_locked(&mut state)
    }

    /// Returns an unused name from `category` (case-insensitive).
    ///
    /// Unknown categories and exhausted pools fall back to
    /// [`get_random_name`](Self::get_random_name).
    pub fn get_name_by_category(&self, category: &str) -> String {
        let mut state = self.lock();
        Self::category_name_locked(&mut state, category)
    }

    /// Returns a name suited to `persona_type`.
    pub fn get_name_for_persona(&self, persona_type: &str) -> String {
        let mut state = self.lock();
        let lowered = persona_type.to_lowercase();
        let rule = PERSONA_CATEGORY_RULES
            .iter()
            .find(|(needles, _)| needles.iter().any(|needle| lowered.contains(needle)));

        let category = match rule {
            Some((_, [only])) => *only,
            Some((_, [first, second, ..])) => {
                if state.rng.gen_bool(0.5) {
                    *first
                } else {
                    *second
                }
            }
            _ => "",
        };

        Self::category_name_locked(&mut state, category)
    }

    /// Reserves `name` so it is never issued by this generator.
    pub fn mark_used(&self, name: &str) {
        self.lock().used.insert(name.trim().to_lowercase());
    }

    /// Whether `name` has not been issued or reserved yet.
    pub fn is_available(&self, name: &str) -> bool {
        !self.lock().used.contains(&name.trim().to_lowercase())
    }

    /// Number of pooled names still unused, across all categories.
    pub fn remaining(&self) -> usize {
        let state = self.lock();
        NAME_POOL
            .iter()
            .flat_map(|category| category.names.iter())
            .filter(|name| !state.used.contains(&name.to_lowercase()))
            .count()
    }

    fn category_name_locked(state: &mut GeneratorState, category: &str) -> String {
        let wanted = category.trim().to_lowercase();
        let Some(pool) = NAME_POOL.iter().find(|c| c.name == wanted) else {
            return Self::random_name_locked(state);
        };

        let candidates: Vec<&'static str> = pool
            .names
            .iter()
            .copied()
            .filter(|name| !state.used.contains(&name.to_lowercase()))
            .collect();

        match candidates.choose(&mut state.rng) {
            Some(name) => {
                state.used.insert(name.to_lowercase());
                name.to_string()
            }
            None => {
                tracing::debug!("[NameGenerator] Category '{}' exhausted, using global pool", wanted);
                Self::random_name_locked(state)
            }
        }
    }

    fn random_name_locked(state: &mut GeneratorState) -> String {
        let candidates: Vec<&'static str> = NAME_POOL
            .iter()
            .flat_map(|category| category.names.iter().copied())
            .filter(|name| !state.used.contains(&name.to_lowercase()))
            .collect();

        if let Some(name) = candidates.choose(&mut state.rng) {
            state.used.insert(name.to_lowercase());
            return name.to_string();
        }

        let mut suffix = Utc::now().timestamp_millis() % 1_000_000;
        let mut name = format!("{}-{}", SYNTHETIC_PREFIX, suffix);
        while state.used.contains(&name.to_lowercase()) {
            suffix += 1;
            name = format!("{}-{}", SYNTHETIC_PREFIX, suffix);
        }
        tracing::warn!("[NameGenerator] All name pools exhausted, issuing synthetic name '{}'", name);
        state.used.insert(name.to_lowercase());
        name
    }
}
