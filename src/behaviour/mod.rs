// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Behaviour rules: CSS selectors mapped to element initializers

mod builtin;
mod rules;

pub use builtin::krang_rules;
pub use rules::{Autocompleter, BehaviourRules, Binding, Bindings, Initializer};
