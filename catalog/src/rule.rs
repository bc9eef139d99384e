use {
    std::fmt,
    syncval_core::{Field, Func, Location, Struct},
};

/// Stable identifier of the rule a finding violates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleId(&'static str);

impl RuleId {
    /// Returned when no table covers the finding.
    /// Upstream treats it as an internal consistency defect.
    pub const UNCLASSIFIED: RuleId = RuleId("UNASSIGNED-SyncVal-unclassified");

    /// Wrap identifier.
    pub const fn new(id: &'static str) -> Self {
        RuleId(id)
    }

    /// Identifier text.
    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Check if this is not the unclassified sentinel.
    pub fn is_classified(&self) -> bool {
        *self != RuleId::UNCLASSIFIED
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Pattern over a `Location`.
/// Set parts must match, unset parts match anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Key {
    function: Option<Func>,
    structure: Option<Struct>,
    field: Option<Field>,
    recurse_field: bool,
}

impl Key {
    /// Key matching an entry point.
    pub const fn func(function: Func) -> Self {
        Key {
            function: Some(function),
            structure: None,
            field: None,
            recurse_field: false,
        }
    }

    /// Key matching a structure in any entry point.
    pub const fn structure(structure: Struct) -> Self {
        Key {
            function: None,
            structure: Some(structure),
            field: None,
            recurse_field: false,
        }
    }

    /// Restrict key to a field.
    pub const fn field(self, field: Field) -> Self {
        Key {
            field: Some(field),
            ..self
        }
    }

    /// Restrict key to a field, also matching when the field is the parent array.
    pub const fn parent_field(self, field: Field) -> Self {
        Key {
            field: Some(field),
            recurse_field: true,
            ..self
        }
    }

    /// Check if location matches the key.
    pub fn matches(&self, location: &Location) -> bool {
        if let Some(function) = self.function {
            if function != location.function {
                return false;
            }
        }
        if let Some(structure) = self.structure {
            if Some(structure) != location.structure {
                return false;
            }
        }
        match self.field {
            None => true,
            Some(field) => {
                location.field == Some(field)
                    || (self.recurse_field && location.parent == Some(field))
            }
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.function, self.structure) {
            (Some(function), Some(structure)) => write!(f, "{} {}", function, structure)?,
            (Some(function), None) => write!(f, "{}", function)?,
            (None, Some(structure)) => write!(f, "{}", structure)?,
            (None, None) => write!(f, "*")?,
        }
        if let Some(field) = self.field {
            write!(f, ".{}", field)?;
        }
        Ok(())
    }
}

/// Key and the rule it maps to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Entry {
    /// Location pattern.
    pub key: Key,

    /// Rule reported on match.
    pub rule: RuleId,
}

impl Entry {
    /// Create entry.
    pub const fn new(key: Key, rule: &'static str) -> Self {
        Entry {
            key,
            rule: RuleId(rule),
        }
    }
}

/// Rule of the first entry whose key matches `location`.
pub fn find(entries: &[Entry], location: &Location) -> Option<RuleId> {
    entries
        .iter()
        .find(|entry| entry.key.matches(location))
        .map(|entry| entry.rule)
}
