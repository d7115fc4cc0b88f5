/// The four suits, ordered so that a stronger suit compares greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Suit {
    Clubs = 0,
    Diamonds = 1,
    Hearts = 2,
    Spades = 3,
}

impl Suit {
    /// All suits in ascending strength order
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

    /// Convert from numeric index (0-3)
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Suit::Clubs),
            1 => Some(Suit::Diamonds),
            2 => Some(Suit::Hearts),
            3 => Some(Suit::Spades),
            _ => None,
        }
    }

    /// Numeric index (0-3), for table addressing
    pub fn index(self) -> usize {
        self as usize
    }

    /// Get the suit as a single character (C, D, H, S)
    pub fn to_char(self) -> char {
        match self {
            Suit::Clubs => 'C',
            Suit::Diamonds => 'D',
            Suit::Hearts => 'H',
            Suit::Spades => 'S',
        }
    }

    /// Parse a suit character, either case
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'C' | 'c' => Some(Suit::Clubs),
            'D' | 'd' => Some(Suit::Diamonds),
            'H' | 'h' => Some(Suit::Hearts),
            'S' | 's' => Some(Suit::Spades),
            _ => None,
        }
    }
}

/// Trump selection for a solve: one of the four suits, or no-trump.
///
/// No-trump is the distinguished maximum of the ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Strain {
    Clubs = 0,
    Diamonds = 1,
    Hearts = 2,
    Spades = 3,
    NoTrump = 4,
}

impl Strain {
    /// All five strains in ascending strength order
    pub const ALL: [Strain; 5] = [
        Strain::Clubs,
        Strain::Diamonds,
        Strain::Hearts,
        Strain::Spades,
        Strain::NoTrump,
    ];

    /// Convert from numeric index (0-4)
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Strain::Clubs),
            1 => Some(Strain::Diamonds),
            2 => Some(Strain::Hearts),
            3 => Some(Strain::Spades),
            4 => Some(Strain::NoTrump),
            _ => None,
        }
    }

    /// Numeric index (0-4), for table addressing
    pub fn index(self) -> usize {
        self as usize
    }

    /// Convert from a Suit
    pub fn from_suit(suit: Suit) -> Self {
        match suit {
            Suit::Clubs => Strain::Clubs,
            Suit::Diamonds => Strain::Diamonds,
            Suit::Hearts => Strain::Hearts,
            Suit::Spades => Strain::Spades,
        }
    }

    /// The trump suit, or None for no-trump
    pub fn trump_suit(self) -> Option<Suit> {
        match self {
            Strain::Clubs => Some(Suit::Clubs),
            Strain::Diamonds => Some(Suit::Diamonds),
            Strain::Hearts => Some(Suit::Hearts),
            Strain::Spades => Some(Suit::Spades),
            Strain::NoTrump => None,
        }
    }

    /// Get the strain as a single character (C, D, H, S, N)
    pub fn to_char(self) -> char {
        match self {
            Strain::Clubs => 'C',
            Strain::Diamonds => 'D',
            Strain::Hearts => 'H',
            Strain::Spades => 'S',
            Strain::NoTrump => 'N',
        }
    }

    /// Parse a strain character, either case
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'N' | 'n' => Some(Strain::NoTrump),
            _ => Suit::from_char(c).map(Strain::from_suit),
        }
    }
}
