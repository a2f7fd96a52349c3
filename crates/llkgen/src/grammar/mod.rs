//! # Grammar
//!
//! The rule arena that predicate trees refer into, and the operator layer
//! ([`GrammarBuilder`]) used to build those trees.
//!
//! Rules are stored in a `Vec` and addressed by [`RuleId`]. A
//! [`RuleRef`](crate::pred::RuleRef) stores only the id, so rules may call each
//! other (or themselves) freely and cloning a tree never copies a rule.
//! Declare a rule first to obtain its id, then define its body; this allows
//! forward and recursive references.

pub mod builder;

pub use builder::{Arm, GrammarBuilder};

use crate::basis::Basis;
use crate::config::GrammarConfig;
use crate::error::GrammarError;
use crate::pred::{Alternation, EndOfRule, Pred, RuleRef};
use crate::terminal::TerminalSet;
use compact_str::CompactString;
use hashbrown::HashMap;
use lasso::{Rodeo, Spur};
use std::fmt;

/// Index of a rule in its [`Grammar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleId(u32);

impl RuleId {
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A named rule: a predicate tree plus the settings code generation needs.
#[derive(Debug, Clone)]
pub struct Rule<S> {
    pub name: CompactString,
    /// `None` until the rule is defined.
    pub pred: Option<Pred<S>>,
    /// Token (lexer) rule rather than parser rule.
    pub is_token: bool,
    /// Maximum lookahead.
    pub k: usize,
    /// Helper rule that is not exposed as a parser entry point.
    pub is_private: bool,
    /// Entry point of the generated parser.
    pub is_start: bool,
    pub end: EndOfRule<S>,
}

impl<S> Rule<S> {
    #[must_use]
    pub const fn is_defined(&self) -> bool {
        self.pred.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Grammar<S> {
    rules: Vec<Rule<S>>,
    by_name: HashMap<Spur, RuleId, ahash::RandomState>,
    interner: Rodeo,
    config: GrammarConfig,
}

impl<S: TerminalSet> Default for Grammar<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TerminalSet> Grammar<S> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(GrammarConfig::default())
    }

    #[must_use]
    pub fn with_config(config: GrammarConfig) -> Self {
        Self {
            rules: Vec::new(),
            by_name: HashMap::with_hasher(ahash::RandomState::new()),
            interner: Rodeo::new(),
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &GrammarConfig {
        &self.config
    }

    /// Declare a rule without defining it, returning its id. Declaring a
    /// name twice returns the existing id.
    pub fn declare(&mut self, name: &str) -> RuleId {
        let key = self.interner.get_or_intern(name);
        if let Some(&id) = self.by_name.get(&key) {
            return id;
        }
        let id = RuleId::new(u32::try_from(self.rules.len()).unwrap_or(u32::MAX));
        let is_token = self.config.token_rule_prefix_upper
            && name.chars().next().is_some_and(char::is_uppercase);
        self.rules.push(Rule {
            name: CompactString::from(name),
            pred: None,
            is_token,
            k: self.config.default_k,
            is_private: false,
            is_start: false,
            end: EndOfRule::new(id),
        });
        self.by_name.insert(key, id);
        id
    }

    /// Give a declared rule its body.
    ///
    /// # Errors
    ///
    /// [`GrammarError::UnknownRule`] if `id` is not in this grammar,
    /// [`GrammarError::DuplicateRule`] if the rule already has a body.
    pub fn define(&mut self, id: RuleId, body: Pred<S>) -> Result<(), GrammarError> {
        let rule = self
            .rules
            .get_mut(id.index())
            .ok_or(GrammarError::UnknownRule { id })?;
        if rule.pred.is_some() {
            return Err(GrammarError::DuplicateRule {
                name: rule.name.clone(),
            });
        }
        rule.pred = Some(body);
        Ok(())
    }

    /// Declare and define a rule in one step.
    ///
    /// # Errors
    ///
    /// [`GrammarError::DuplicateRule`] if a rule of that name already has a
    /// body.
    pub fn rule(&mut self, name: &str, body: Pred<S>) -> Result<RuleId, GrammarError> {
        let id = self.declare(name);
        self.define(id, body)?;
        Ok(id)
    }

    /// A reference to rule `id`, for use inside another rule's body.
    ///
    /// # Errors
    ///
    /// [`GrammarError::UnknownRule`] if `id` is not in this grammar.
    pub fn rule_ref(&self, id: RuleId, basis: Basis) -> Result<Pred<S>, GrammarError> {
        let rule = self.get(id).ok_or(GrammarError::UnknownRule { id })?;
        Ok(Pred::rule_ref(basis, RuleRef::new(id, rule.name.clone())))
    }

    #[must_use]
    pub fn get(&self, id: RuleId) -> Option<&Rule<S>> {
        self.rules.get(id.index())
    }

    pub fn get_mut(&mut self, id: RuleId) -> Option<&mut Rule<S>> {
        self.rules.get_mut(id.index())
    }

    #[must_use]
    pub fn rule_id(&self, name: &str) -> Option<RuleId> {
        let key = self.interner.get(name)?;
        self.by_name.get(&key).copied()
    }

    pub fn rules(&self) -> impl Iterator<Item = (RuleId, &Rule<S>)> {
        self.rules
            .iter()
            .enumerate()
            .map(|(i, rule)| (RuleId::new(u32::try_from(i).unwrap_or(u32::MAX)), rule))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Explicitly mark a rule as a token or parser rule, overriding the
    /// name-based default.
    ///
    /// # Errors
    ///
    /// [`GrammarError::UnknownRule`] if `id` is not in this grammar.
    pub fn set_token(&mut self, id: RuleId, is_token: bool) -> Result<(), GrammarError> {
        self.get_mut(id)
            .ok_or(GrammarError::UnknownRule { id })?
            .is_token = is_token;
        Ok(())
    }

    /// # Errors
    ///
    /// [`GrammarError::UnknownRule`] if `id` is not in this grammar.
    pub fn set_k(&mut self, id: RuleId, k: usize) -> Result<(), GrammarError> {
        self.get_mut(id).ok_or(GrammarError::UnknownRule { id })?.k = k;
        Ok(())
    }

    /// # Errors
    ///
    /// [`GrammarError::UnknownRule`] if `id` is not in this grammar.
    pub fn set_private(&mut self, id: RuleId, is_private: bool) -> Result<(), GrammarError> {
        self.get_mut(id)
            .ok_or(GrammarError::UnknownRule { id })?
            .is_private = is_private;
        Ok(())
    }

    /// Mark a rule as an entry point of the generated parser.
    ///
    /// # Errors
    ///
    /// [`GrammarError::UnknownRule`] if `id` is not in this grammar.
    pub fn set_start(&mut self, id: RuleId, is_start: bool) -> Result<(), GrammarError> {
        self.get_mut(id)
            .ok_or(GrammarError::UnknownRule { id })?
            .is_start = is_start;
        Ok(())
    }

    /// Entry points: rules marked start, or every public rule when none is.
    pub fn start_rules(&self) -> impl Iterator<Item = RuleId> {
        let explicit = self.rules.iter().any(|r| r.is_start);
        self.rules()
            .filter(move |(_, r)| if explicit { r.is_start } else { !r.is_private })
            .map(|(id, _)| id)
    }

    /// Name of an arm of `alts` for diagnostics, within this grammar's
    /// `alt_name_max_len` budget.
    #[must_use]
    pub fn alt_name(&self, alts: &Alternation<S>, arm: i32) -> String {
        alts.alt_name_with(arm, self.config.alt_name_max_len)
    }

    /// Drop analysis results from every rule body and reset every rule's
    /// follow set, so that re-analysis after an edit starts clean.
    pub fn discard_analysis(&mut self) {
        for rule in &mut self.rules {
            if let Some(pred) = rule.pred.as_mut() {
                pred.discard_analysis();
            }
            rule.end.clear_follow();
        }
    }

    /// Check that every declared rule was defined.
    ///
    /// # Errors
    ///
    /// [`GrammarError::UndefinedRule`] naming the first rule without a body.
    pub fn finish(self) -> Result<Self, GrammarError> {
        if let Some(rule) = self.rules.iter().find(|r| !r.is_defined()) {
            return Err(GrammarError::UndefinedRule {
                name: rule.name.clone(),
            });
        }
        Ok(self)
    }
}
