use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of card kinds. Deserializing any other tag fails, so a
/// stored deck can never carry a kind the draw resolver does not handle.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    Cat,
    Defuse,
    Bomb,
    Shuffle,
}

impl CardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardKind::Cat => "cat",
            CardKind::Defuse => "defuse",
            CardKind::Bomb => "bomb",
            CardKind::Shuffle => "shuffle",
        }
    }
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Card {
    #[serde(rename = "type")]
    pub kind: CardKind,
}

impl Card {
    pub const fn new(kind: CardKind) -> Self {
        Self { kind }
    }
}

pub const STARTING_DECK_SIZE: usize = 5;

pub fn all_kinds() -> [CardKind; 4] {
    [
        CardKind::Cat,
        CardKind::Defuse,
        CardKind::Bomb,
        CardKind::Shuffle,
    ]
}

/// Unshuffled starting composition: two cats, one defuse, one shuffle, one bomb.
pub fn starting_cards() -> Vec<Card> {
    let mut v = Vec::with_capacity(STARTING_DECK_SIZE);
    v.push(Card::new(CardKind::Cat));
    v.push(Card::new(CardKind::Cat));
    v.push(Card::new(CardKind::Defuse));
    v.push(Card::new(CardKind::Shuffle));
    v.push(Card::new(CardKind::Bomb));
    v
}
