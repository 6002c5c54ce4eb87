//! # bicfg-core
//!
//! Condition and effect engine for bicfg.
//!
//! This crate provides:
//! - The variable store and change tracking
//! - Condition parsing, type coercion and comparison
//! - State evaluation and effect application
//! - The configuration model (elements, events, states) and its export document
//! - A `Workspace` that owns one configuration and drives test mode

pub mod compare;
pub mod condition;
pub mod document;
pub mod effect;
pub mod element;
pub mod error;
pub mod evaluator;
pub mod event;
pub mod lint;
pub mod state;
pub mod tracker;
pub mod variable;
pub mod workspace;

pub use condition::{Condition, Operand, Operator};
pub use document::ConfigDocument;
pub use effect::EffectApplier;
pub use element::{Element, ElementKind, ElementRegistry, ElementSet};
pub use error::CoreError;
pub use evaluator::{Activation, ActiveState, StateEvaluator};
pub use event::{EventAction, EventDef};
pub use lint::{lint, LintIssue};
pub use state::{Effect, StateDef};
pub use tracker::ChangeTracker;
pub use variable::{value_text, SetOutcome, VarType, Variable, VariableStore};
pub use workspace::{EventDraft, PassReport, StateDraft, VariableDraft, Workspace, WorkspaceConfig};
