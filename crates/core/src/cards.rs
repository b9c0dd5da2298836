//! Card encoding and parsing.
//!
//! Cards live in two forms. A `CardIndex` in `[0, 52)` identifies a card as
//! `4 * rank + suit` and is what the public bucketing API consumes. A `Card`
//! is the 32-bit encoded form the evaluator operates on:
//!
//! ```text
//! xxxbbbbb bbbbbbbb cdhsrrrr xxpppppp
//! ```
//!
//! - bits 0–5: a small prime per rank (2→2, 3→3, …, A→41)
//! - bits 8–11: the rank index
//! - bits 12–15: a one-hot suit bitmask (clubs, diamonds, hearts, spades)
//! - bits 16–28: a one-hot rank bitmask
//!
//! The layout is contractual: the evaluator's table lookups index directly
//! off the rank bitmask and multiply the rank primes.

use crate::abstraction::AbstractionError;

/// A card identified by its position in the deck: `4 * rank + suit`.
pub type CardIndex = u8;

/// Number of cards in the deck.
pub const DECK_SIZE: usize = 52;

/// One prime per rank, deuce through ace.
pub const RANK_PRIMES: [u32; 13] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41];

const RANK_CHARS: [char; 13] = [
    '2', '3', '4', '5', '6', '7', '8', '9', 'T', 'J', 'Q', 'K', 'A',
];
const SUIT_CHARS: [char; 4] = ['c', 'd', 'h', 's'];

/// A card in the encoded 32-bit form used by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Card(u32);

impl Card {
    /// Encode a card from its rank (`0..13`, deuce through ace) and suit
    /// (`0..4`, clubs/diamonds/hearts/spades).
    #[must_use]
    pub const fn encode(rank: u8, suit: u8) -> Self {
        Card(
            RANK_PRIMES[rank as usize]
                | ((rank as u32) << 8)
                | (1u32 << (suit as u32 + 12))
                | (1u32 << (rank as u32 + 16)),
        )
    }

    /// The raw 32-bit word.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The rank index in `[0, 13)`.
    #[must_use]
    pub const fn rank(self) -> u8 {
        ((self.0 >> 8) & 0xF) as u8
    }

    /// The rank prime (bits 0–5).
    #[must_use]
    pub(crate) const fn prime(self) -> u32 {
        self.0 & 0x3F
    }

    /// The one-hot suit bits (bits 12–15).
    #[must_use]
    pub(crate) const fn suit_bits(self) -> u32 {
        self.0 & 0xF000
    }

    /// The suit index in `[0, 4)`.
    #[must_use]
    pub(crate) const fn suit(self) -> usize {
        (self.suit_bits() >> 12).trailing_zeros() as usize
    }

    /// The one-hot rank bit, shifted down to bit 0..13.
    #[must_use]
    pub(crate) const fn rank_bit(self) -> u32 {
        self.0 >> 16
    }
}

/// The 52-card deck in index order: `DECK[4 * rank + suit]`.
///
/// Built at compile time and immutable for the life of the process.
pub static DECK: [Card; 52] = build_deck();

const fn build_deck() -> [Card; 52] {
    let mut deck = [Card(0); 52];
    let mut i = 0;
    while i < 52 {
        deck[i] = Card::encode((i / 4) as u8, (i % 4) as u8);
        i += 1;
    }
    deck
}

/// Look up the encoded form of a card index.
#[must_use]
pub fn encoded(index: CardIndex) -> Card {
    DECK[index as usize]
}

/// Parse a two-character card literal such as `"As"` or `"td"`.
///
/// The first character is a rank in `23456789TJQKA`, the second a suit in
/// `cdhs`; both are case-insensitive.
///
/// # Errors
///
/// Returns [`AbstractionError::BadCardString`] for anything else, including
/// strings that are not exactly two characters long.
#[allow(clippy::cast_possible_truncation)]
pub fn parse_card(text: &str) -> Result<CardIndex, AbstractionError> {
    let mut chars = text.chars();
    let (Some(rank_ch), Some(suit_ch), None) = (chars.next(), chars.next(), chars.next()) else {
        return Err(AbstractionError::BadCardString(text.to_string()));
    };

    let rank_ch = rank_ch.to_ascii_uppercase();
    let suit_ch = suit_ch.to_ascii_lowercase();

    let rank = RANK_CHARS
        .iter()
        .position(|&c| c == rank_ch)
        .ok_or_else(|| AbstractionError::BadCardString(text.to_string()))?;
    let suit = SUIT_CHARS
        .iter()
        .position(|&c| c == suit_ch)
        .ok_or_else(|| AbstractionError::BadCardString(text.to_string()))?;

    Ok((rank * 4 + suit) as CardIndex)
}

/// Parse a four-character hole-card literal such as `"AsKs"`.
///
/// # Errors
///
/// Returns [`AbstractionError::BadCardString`] if either half fails to parse
/// and [`AbstractionError::DuplicateCardInDeal`] if both halves name the
/// same card (e.g. `"7c7c"`).
pub fn parse_hand(text: &str) -> Result<[CardIndex; 2], AbstractionError> {
    if text.chars().count() != 4 {
        return Err(AbstractionError::BadCardString(text.to_string()));
    }
    let split = text
        .char_indices()
        .nth(2)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let first = parse_card(&text[..split])?;
    let second = parse_card(&text[split..])?;
    if first == second {
        return Err(AbstractionError::DuplicateCardInDeal(first));
    }
    Ok([first, second])
}
