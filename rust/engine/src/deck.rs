use crate::cards::{starting_cards, Card, CardKind};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Ordered draw pile. Cards leave from the front only; the pile never grows
/// once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Deck {
    cards: VecDeque<Card>,
}

impl Deck {
    /// A fresh starting deck in uniformly random order.
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::unshuffled();
        deck.shuffle(rng);
        deck
    }

    pub fn new_with_seed(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Self::new(&mut rng)
    }

    pub fn unshuffled() -> Self {
        Self::from_cards(starting_cards())
    }

    /// Builds a deck in exactly the given order, front first.
    pub fn from_cards<I>(cards: I) -> Self
    where
        I: IntoIterator<Item = Card>,
    {
        Self {
            cards: cards.into_iter().collect(),
        }
    }

    pub fn from_kinds<I>(kinds: I) -> Self
    where
        I: IntoIterator<Item = CardKind>,
    {
        Self::from_cards(kinds.into_iter().map(Card::new))
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.make_contiguous().shuffle(rng);
    }

    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop_front()
    }

    pub fn peek(&self) -> Option<&Card> {
        self.cards.front()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn count(&self, kind: CardKind) -> usize {
        self.cards.iter().filter(|card| card.kind == kind).count()
    }
}
