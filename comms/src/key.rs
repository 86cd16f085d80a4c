use std::{
    error::Error,
    fmt::{self, Display},
    str::FromStr,
};

/// The specific result type for key parsing.
pub type Result<T> = std::result::Result<T, KeyErr>;

/// Error returned whenever a parameter name doesn't follow the `{role}_{index}` convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyErr {
    UnknownRole { key: String, token: String },
    MalformedIndex { key: String },
}

impl Display for KeyErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyErr::UnknownRole { key, token } => {
                write!(f, "unknown role token `{token}` in parameter key `{key}`")
            }
            KeyErr::MalformedIndex { key } => {
                write!(f, "parameter key `{key}` has a missing or invalid index")
            }
        }
    }
}

impl Error for KeyErr {}

/// The role of a parameter, the single dispatch signal for initialization and updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Weight,
    Bias,
    WeightMomentum,
    BiasMomentum,
}

impl Role {
    /// Resolves a role from its leading token.
    ///
    /// # Arguments
    /// * `token` - One of `w`, `b`, `wd` or `bd`.
    ///
    /// # Returns
    /// The matching role or `None` if the token is unknown.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "w" => Some(Self::Weight),
            "b" => Some(Self::Bias),
            "wd" => Some(Self::WeightMomentum),
            "bd" => Some(Self::BiasMomentum),
            _ => None,
        }
    }

    /// The token used to write this role in a key.
    pub fn token(self) -> &'static str {
        match self {
            Self::Weight => "w",
            Self::Bias => "b",
            Self::WeightMomentum => "wd",
            Self::BiasMomentum => "bd",
        }
    }

    /// Whether this role names a momentum accumulator.
    pub fn is_momentum(self) -> bool {
        matches!(self, Self::WeightMomentum | Self::BiasMomentum)
    }

    /// The role of the tensor this one is paired with, `w <-> wd` and `b <-> bd`.
    pub fn paired(self) -> Self {
        match self {
            Self::Weight => Self::WeightMomentum,
            Self::Bias => Self::BiasMomentum,
            Self::WeightMomentum => Self::Weight,
            Self::BiasMomentum => Self::Bias,
        }
    }

    /// A small stable discriminant, used to derive per-key seeds.
    pub fn id(self) -> u64 {
        match self {
            Self::Weight => 1,
            Self::Bias => 2,
            Self::WeightMomentum => 3,
            Self::BiasMomentum => 4,
        }
    }
}

/// A parsed parameter key.
///
/// The original name is kept verbatim, so `w1` and `w_1` address different parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    name: String,
    role: Role,
    index: usize,
}

impl Key {
    /// Creates a new key in the `{role}_{index}` form.
    ///
    /// # Arguments
    /// * `role` - The role of the parameter.
    /// * `index` - The index of the layer.
    ///
    /// # Returns
    /// A new `Key` instance.
    pub fn new(role: Role, index: usize) -> Self {
        Self {
            name: format!("{}_{index}", role.token()),
            role,
            index,
        }
    }

    /// Parses a parameter name.
    ///
    /// Names are either `{role}_{index}` or flat like `w1`, where the role token ends
    /// at the first digit.
    ///
    /// # Arguments
    /// * `name` - The raw parameter name.
    ///
    /// # Returns
    /// The parsed key or a `KeyErr` naming the offending key.
    pub fn parse(name: &str) -> Result<Self> {
        let (token, index) = match name.split_once('_') {
            Some(parts) => parts,
            None => {
                let at = name.find(|c: char| c.is_ascii_digit()).unwrap_or(name.len());
                name.split_at(at)
            }
        };

        let role = Role::from_token(token).ok_or_else(|| KeyErr::UnknownRole {
            key: name.to_string(),
            token: token.to_string(),
        })?;

        let index = index.parse().map_err(|_| KeyErr::MalformedIndex {
            key: name.to_string(),
        })?;

        Ok(Self {
            name: name.to_string(),
            role,
            index,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the key of the paired tensor, keeping the naming style of this key.
    pub fn paired(&self) -> Self {
        let role = self.role.paired();
        let sep = if self.name.contains('_') { "_" } else { "" };

        Self {
            name: format!("{}{sep}{}", role.token(), self.index),
            role,
            index: self.index,
        }
    }
}

impl FromStr for Key {
    type Err = KeyErr;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_underscored_keys() {
        let key = Key::parse("wd_2").unwrap();
        assert_eq!(key.role(), Role::WeightMomentum);
        assert_eq!(key.index(), 2);
        assert_eq!(key.name(), "wd_2");
    }

    #[test]
    fn parses_flat_keys() {
        let key = Key::parse("b2").unwrap();
        assert_eq!(key.role(), Role::Bias);
        assert_eq!(key.index(), 2);

        let key = Key::parse("bd13").unwrap();
        assert_eq!(key.role(), Role::BiasMomentum);
        assert_eq!(key.index(), 13);
    }

    #[test]
    fn flat_and_underscored_names_are_distinct() {
        assert_ne!(Key::parse("w1").unwrap(), Key::parse("w_1").unwrap());
    }

    #[test]
    fn rejects_unknown_role() {
        let err = Key::parse("x_0").unwrap_err();
        assert_eq!(
            err,
            KeyErr::UnknownRole {
                key: "x_0".to_string(),
                token: "x".to_string()
            }
        );
        assert!(err.to_string().contains("x_0"));
    }

    #[test]
    fn rejects_missing_index() {
        assert!(matches!(
            Key::parse("w"),
            Err(KeyErr::MalformedIndex { .. })
        ));
        assert!(matches!(
            Key::parse("w_a"),
            Err(KeyErr::MalformedIndex { .. })
        ));
    }

    #[test]
    fn paired_keeps_naming_style() {
        assert_eq!(Key::parse("w_3").unwrap().paired().name(), "wd_3");
        assert_eq!(Key::parse("bd1").unwrap().paired().name(), "b1");
        assert_eq!(Key::new(Role::Bias, 0).paired(), Key::parse("bd_0").unwrap());
    }
}
