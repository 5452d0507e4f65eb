use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

/// One of the two seats in a match.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(crate = "rocket::serde")]
pub enum Side {
    P1,
    P2,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::P1, Side::P2];

    pub const fn other(self) -> Side {
        match self {
            Side::P1 => Side::P2,
            Side::P2 => Side::P1,
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Side::P1 => 0,
            Side::P2 => 1,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::P1 => write!(f, "P1"),
            Side::P2 => write!(f, "P2"),
        }
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "P1" | "p1" => Ok(Side::P1),
            "P2" | "p2" => Ok(Side::P2),
            other => Err(format!("unknown side {:?}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sides_parse_and_flip() {
        assert_eq!("p2".parse::<Side>(), Ok(Side::P2));
        assert!("P3".parse::<Side>().is_err());
        assert_eq!(Side::P1.other(), Side::P2);
        assert_eq!(Side::P2.to_string(), "P2");
    }
}
