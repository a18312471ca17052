use super::topology::{BondType, ParseBondTypeError};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

pub const RCA_PLUS_RULE: &str = "ATplus";
pub const RCA_MINUS_RULE: &str = "ATminus";
pub const RCA_NEUTRAL_RULE: &str = "ATneutral";

/// Separator between rule, sub-class and bond type in the text form of a class.
pub const SEPARATOR: char = ':';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApClassError {
    #[error("Invalid APClass rule '{0}': only letters, digits, '_' and '-' are allowed")]
    InvalidRule(String),
    #[error("Malformed APClass string '{0}': expected 'rule:sub' or 'rule:sub:BOND'")]
    Malformed(String),
    #[error("Invalid sub-class '{value}' in APClass '{input}'")]
    InvalidSubClass { input: String, value: String },
    #[error(transparent)]
    BondType(#[from] ParseBondTypeError),
}

/// Polarity of a ring-closing-attractor class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RcaPolarity {
    Plus,
    Minus,
    Neutral,
}

impl RcaPolarity {
    /// Whether two attractors of these polarities can pair to close a ring.
    pub fn pairs_with(self, other: RcaPolarity) -> bool {
        matches!(
            (self, other),
            (Self::Plus, Self::Minus) | (Self::Minus, Self::Plus) | (Self::Neutral, Self::Neutral)
        )
    }
}

/// Attachment-point class: a rule name, a sub-class index and the bond type it forms.
///
/// Equality, ordering and hashing only look at `(rule, sub_class)`, so two classes that
/// differ solely in bond type are the same class.
#[derive(Debug, Clone)]
pub struct APClass {
    rule: String,
    sub_class: i32,
    bond_type: BondType,
}

fn is_valid_rule(rule: &str) -> bool {
    !rule.is_empty()
        && rule
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl APClass {
    pub fn new(rule: &str, sub_class: i32) -> Result<Self, ApClassError> {
        Self::with_bond_type(rule, sub_class, BondType::default())
    }

    pub fn with_bond_type(
        rule: &str,
        sub_class: i32,
        bond_type: BondType,
    ) -> Result<Self, ApClassError> {
        if !is_valid_rule(rule) {
            return Err(ApClassError::InvalidRule(rule.to_string()));
        }
        Ok(Self {
            rule: rule.to_string(),
            sub_class,
            bond_type,
        })
    }

    fn reserved(rule: &'static str) -> Self {
        Self {
            rule: rule.to_string(),
            sub_class: 0,
            bond_type: BondType::Any,
        }
    }

    pub fn rca_plus() -> Self {
        Self::reserved(RCA_PLUS_RULE)
    }

    pub fn rca_minus() -> Self {
        Self::reserved(RCA_MINUS_RULE)
    }

    pub fn rca_neutral() -> Self {
        Self::reserved(RCA_NEUTRAL_RULE)
    }

    pub fn rule(&self) -> &str {
        &self.rule
    }

    pub fn sub_class(&self) -> i32 {
        self.sub_class
    }

    pub fn bond_type(&self) -> BondType {
        self.bond_type
    }

    /// Polarity of this class if it is one of the ring-closing-attractor classes.
    pub fn rca_polarity(&self) -> Option<RcaPolarity> {
        if self.sub_class != 0 {
            return None;
        }
        match self.rule.as_str() {
            RCA_PLUS_RULE => Some(RcaPolarity::Plus),
            RCA_MINUS_RULE => Some(RcaPolarity::Minus),
            RCA_NEUTRAL_RULE => Some(RcaPolarity::Neutral),
            _ => None,
        }
    }

    pub fn is_rca(&self) -> bool {
        self.rca_polarity().is_some()
    }

    /// Text form including the bond type, e.g. `C:0:DOUBLE`.
    pub fn to_extended_string(&self) -> String {
        format!(
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            self.rule, self.sub_class, self.bond_type
        )
    }
}

impl PartialEq for APClass {
    fn eq(&self, other: &Self) -> bool {
        self.rule == other.rule && self.sub_class == other.sub_class
    }
}

impl Eq for APClass {}

impl Hash for APClass {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rule.hash(state);
        self.sub_class.hash(state);
    }
}

impl PartialOrd for APClass {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for APClass {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rule
            .cmp(&other.rule)
            .then(self.sub_class.cmp(&other.sub_class))
    }
}

impl fmt::Display for APClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.rule, self.sub_class)
    }
}

impl FromStr for APClass {
    type Err = ApClassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(SEPARATOR).collect();
        let (rule, sub, bond) = match parts.as_slice() {
            [rule, sub] => (*rule, *sub, None),
            [rule, sub, bond] => (*rule, *sub, Some(*bond)),
            _ => return Err(ApClassError::Malformed(s.to_string())),
        };
        let sub_class = sub
            .parse::<i32>()
            .map_err(|_| ApClassError::InvalidSubClass {
                input: s.to_string(),
                value: sub.to_string(),
            })?;
        let bond_type = match bond {
            Some(b) => b.parse::<BondType>()?,
            None => BondType::default(),
        };
        Self::with_bond_type(rule, sub_class, bond_type)
    }
}
