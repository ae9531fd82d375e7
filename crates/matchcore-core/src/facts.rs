//! Per-request fact state.
//!
//! A [`ResolvedRequest`] is the immutable input produced by the upstream
//! validation layer. The rule engine seeds a [`FactContext`] from it and
//! grows the derived section during inference; nothing else mutates the
//! context, and the context never outlives its request.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constraint::FieldValue;

/// One required or preferred skill with an optional minimum proficiency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRequirement {
    /// Canonical skill id.
    pub skill: String,
    /// Minimum proficiency level, if the request states one.
    #[serde(default)]
    pub min_proficiency: Option<String>,
}

impl SkillRequirement {
    /// Creates a skill requirement without a proficiency floor.
    pub fn new(skill: impl Into<String>) -> Self {
        Self {
            skill: skill.into(),
            min_proficiency: None,
        }
    }

    /// Sets the minimum proficiency.
    pub fn with_proficiency(mut self, level: impl Into<String>) -> Self {
        self.min_proficiency = Some(level.into());
        self
    }
}

/// A fully resolved hiring request.
///
/// Produced by an external validation/resolution layer: all skill and
/// domain identifiers are already canonical, and no schema validation
/// happens here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRequest {
    /// Explicitly required properties (seniority, budget, timezone, ...).
    #[serde(default)]
    pub required: BTreeMap<String, FieldValue>,
    /// Explicitly preferred properties.
    #[serde(default)]
    pub preferred: BTreeMap<String, FieldValue>,
    /// Explicitly required skills.
    #[serde(default)]
    pub skills: Vec<SkillRequirement>,
    /// Required business domains.
    #[serde(default)]
    pub domains: Vec<String>,
    /// Inference rules the user has disabled for this request.
    #[serde(default)]
    pub overridden_rules: BTreeSet<String>,
}

/// An ordered derivation path: rule ids from root cause to the rule that
/// most recently produced the value.
pub type ProvenanceChain = Vec<String>;

/// A validated dotted path into the fact context.
///
/// Recognized shapes:
/// - `required.<field>` / `preferred.<field>` — a property value
/// - `skills` — the set of all known skill ids
/// - `domains` — the required domain list
///
/// Anything else is a configuration error, rejected when rules are loaded
/// rather than at request time.
///
/// # Example
///
/// ```
/// use matchcore_core::FactPath;
///
/// let path = FactPath::parse("required.budget").unwrap();
/// assert_eq!(path.to_string(), "required.budget");
/// assert!(FactPath::parse("budget").is_err());
/// assert!(FactPath::parse("required").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactPath {
    /// `required.<field>`
    Required(String),
    /// `preferred.<field>`
    Preferred(String),
    /// `skills`
    Skills,
    /// `domains`
    Domains,
}

impl FactPath {
    /// Parses and validates a dotted fact path.
    pub fn parse(raw: &str) -> crate::Result<Self> {
        let mut segments = raw.split('.');
        let root = segments.next().unwrap_or("");
        let field = segments.next();
        if segments.next().is_some() {
            return Err(crate::MatchCoreError::Config(format!(
                "fact path '{raw}' has too many segments"
            )));
        }
        match (root, field) {
            ("required", Some(f)) if !f.is_empty() => Ok(FactPath::Required(f.to_string())),
            ("preferred", Some(f)) if !f.is_empty() => Ok(FactPath::Preferred(f.to_string())),
            ("skills", None) => Ok(FactPath::Skills),
            ("domains", None) => Ok(FactPath::Domains),
            _ => Err(crate::MatchCoreError::Config(format!(
                "malformed fact path '{raw}'"
            ))),
        }
    }

    /// The provenance key a leaf on this path reads from, if any.
    ///
    /// Skill membership checks are keyed per skill, so `skills` needs the
    /// concrete skill id being tested.
    pub fn provenance_key(&self, tested_value: Option<&str>) -> Option<String> {
        match self {
            FactPath::Required(f) => Some(format!("required.{f}")),
            FactPath::Preferred(f) => Some(format!("preferred.{f}")),
            FactPath::Skills => tested_value.map(|s| format!("skills.{s}")),
            FactPath::Domains => None,
        }
    }
}

impl fmt::Display for FactPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactPath::Required(field) => write!(f, "required.{field}"),
            FactPath::Preferred(field) => write!(f, "preferred.{field}"),
            FactPath::Skills => write!(f, "skills"),
            FactPath::Domains => write!(f, "domains"),
        }
    }
}

/// Per-request fact accumulator.
///
/// Seeded from the explicit request, then grown by the rule engine during
/// one `infer` call. Explicit and derived facts live in the same maps so
/// conditions resolve against both uniformly; provenance distinguishes
/// them (explicit facts have no chains).
#[derive(Debug, Clone, PartialEq)]
pub struct FactContext {
    request: ResolvedRequest,
    required: BTreeMap<String, FieldValue>,
    preferred: BTreeMap<String, FieldValue>,
    /// skill id -> minimum proficiency (if any)
    skills: BTreeMap<String, Option<String>>,
    /// fact key -> derivation chains, appended to, never overwritten
    provenance: BTreeMap<String, Vec<ProvenanceChain>>,
}

impl FactContext {
    /// Seeds a context from a resolved request.
    pub fn new(request: ResolvedRequest) -> Self {
        let required = request.required.clone();
        let preferred = request.preferred.clone();
        let skills = request
            .skills
            .iter()
            .map(|s| (s.skill.clone(), s.min_proficiency.clone()))
            .collect();
        Self {
            request,
            required,
            preferred,
            skills,
            provenance: BTreeMap::new(),
        }
    }

    /// The original request this context was seeded from.
    pub fn request(&self) -> &ResolvedRequest {
        &self.request
    }

    /// All required properties, explicit and derived.
    pub fn required(&self) -> &BTreeMap<String, FieldValue> {
        &self.required
    }

    /// All preferred properties, explicit and derived.
    pub fn preferred(&self) -> &BTreeMap<String, FieldValue> {
        &self.preferred
    }

    /// All known skills with their proficiency floors.
    pub fn skills(&self) -> &BTreeMap<String, Option<String>> {
        &self.skills
    }

    /// Derivation chains for a fact key, empty for explicit facts.
    pub fn provenance_of(&self, key: &str) -> &[ProvenanceChain] {
        self.provenance.get(key).map_or(&[], Vec::as_slice)
    }

    /// The full provenance map, for explainability rendering.
    pub fn provenance(&self) -> &BTreeMap<String, Vec<ProvenanceChain>> {
        &self.provenance
    }

    /// Resolves a path to its current value, cloning collections into a
    /// uniform [`FieldValue`]. A missing path yields `None`, never an
    /// error.
    pub fn resolve(&self, path: &FactPath) -> Option<FieldValue> {
        match path {
            FactPath::Required(f) => self.required.get(f).cloned(),
            FactPath::Preferred(f) => self.preferred.get(f).cloned(),
            FactPath::Skills => Some(FieldValue::List(self.skills.keys().cloned().collect())),
            FactPath::Domains => {
                if self.request.domains.is_empty() {
                    None
                } else {
                    Some(FieldValue::List(self.request.domains.clone()))
                }
            }
        }
    }

    /// Sets a required property. Later writers overwrite the scalar;
    /// provenance chains accumulate.
    pub fn set_required(&mut self, field: &str, value: FieldValue, chains: Vec<ProvenanceChain>) {
        self.required.insert(field.to_string(), value);
        self.append_provenance(&format!("required.{field}"), chains);
    }

    /// Sets a preferred property with the same overwrite/accumulate rules.
    pub fn set_preferred(&mut self, field: &str, value: FieldValue, chains: Vec<ProvenanceChain>) {
        self.preferred.insert(field.to_string(), value);
        self.append_provenance(&format!("preferred.{field}"), chains);
    }

    /// Unions a skill into the derived skill set. An existing proficiency
    /// floor is kept; a new one is only set where none was known.
    pub fn add_skill(
        &mut self,
        skill: &str,
        min_proficiency: Option<String>,
        chains: Vec<ProvenanceChain>,
    ) {
        let entry = self.skills.entry(skill.to_string()).or_default();
        if entry.is_none() {
            *entry = min_proficiency;
        }
        self.append_provenance(&format!("skills.{skill}"), chains);
    }

    fn append_provenance(&mut self, key: &str, chains: Vec<ProvenanceChain>) {
        let existing = self.provenance.entry(key.to_string()).or_default();
        for chain in chains {
            if !existing.contains(&chain) {
                existing.push(chain);
            }
        }
    }
}
