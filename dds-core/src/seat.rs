use std::ops::Add;

/// The four seats at the table, in clockwise play order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Seat {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

impl Seat {
    /// All seats in clockwise order starting from North
    pub const ALL: [Seat; 4] = [Seat::North, Seat::East, Seat::South, Seat::West];

    /// Convert from numeric index (0-3)
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Seat::North),
            1 => Some(Seat::East),
            2 => Some(Seat::South),
            3 => Some(Seat::West),
            _ => None,
        }
    }

    /// Numeric index (0-3), for table addressing
    pub fn index(self) -> usize {
        self as usize
    }

    /// Get the seat as a character (N, E, S, W)
    pub fn to_char(self) -> char {
        match self {
            Seat::North => 'N',
            Seat::East => 'E',
            Seat::South => 'S',
            Seat::West => 'W',
        }
    }

    /// Parse a seat character, either case
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'N' | 'n' => Some(Seat::North),
            'E' | 'e' => Some(Seat::East),
            'S' | 's' => Some(Seat::South),
            'W' | 'w' => Some(Seat::West),
            _ => None,
        }
    }

    /// The next seat to play, clockwise
    pub fn next(self) -> Seat {
        match self {
            Seat::North => Seat::East,
            Seat::East => Seat::South,
            Seat::South => Seat::West,
            Seat::West => Seat::North,
        }
    }

    /// Partner seat
    pub fn partner(self) -> Seat {
        match self {
            Seat::North => Seat::South,
            Seat::East => Seat::West,
            Seat::South => Seat::North,
            Seat::West => Seat::East,
        }
    }

    /// Left-hand opponent (plays after this seat)
    pub fn lho(self) -> Seat {
        self.next()
    }

    /// Right-hand opponent (plays before this seat)
    pub fn rho(self) -> Seat {
        match self {
            Seat::North => Seat::West,
            Seat::East => Seat::North,
            Seat::South => Seat::East,
            Seat::West => Seat::South,
        }
    }

    /// True for the North-South partnership
    pub fn is_ns(self) -> bool {
        matches!(self, Seat::North | Seat::South)
    }
}

/// Relative order of a seat within one trick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TrickPosition {
    First = 0,
    Second = 1,
    Third = 2,
    Fourth = 3,
}

impl TrickPosition {
    /// All positions in play order
    pub const ALL: [TrickPosition; 4] = [
        TrickPosition::First,
        TrickPosition::Second,
        TrickPosition::Third,
        TrickPosition::Fourth,
    ];

    /// Convert from numeric index (0-3)
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(TrickPosition::First),
            1 => Some(TrickPosition::Second),
            2 => Some(TrickPosition::Third),
            3 => Some(TrickPosition::Fourth),
            _ => None,
        }
    }

    /// Numeric index (0-3)
    pub fn index(self) -> usize {
        self as usize
    }

    /// The position `seat` occupies in a trick led by `leader`
    pub fn of_seat(leader: Seat, seat: Seat) -> TrickPosition {
        let offset = (seat.index() + 4 - leader.index()) % 4;
        match offset {
            0 => TrickPosition::First,
            1 => TrickPosition::Second,
            2 => TrickPosition::Third,
            _ => TrickPosition::Fourth,
        }
    }
}

/// A leader seat plus a trick position gives the seat playing there.
impl Add<TrickPosition> for Seat {
    type Output = Seat;

    fn add(self, position: TrickPosition) -> Seat {
        let mut seat = self;
        for _ in 0..position.index() {
            seat = seat.next();
        }
        seat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clockwise_rotation() {
        assert_eq!(Seat::North.next(), Seat::East);
        assert_eq!(Seat::East.next(), Seat::South);
        assert_eq!(Seat::South.next(), Seat::West);
        assert_eq!(Seat::West.next(), Seat::North);
    }

    #[test]
    fn test_partner_and_opponents() {
        for seat in Seat::ALL {
            assert_eq!(seat.partner().partner(), seat);
            assert_eq!(seat.lho(), seat.next());
            assert_eq!(seat.rho().next(), seat);
            assert_ne!(seat.partner(), seat.lho());
            assert_eq!(seat.is_ns(), seat.partner().is_ns());
            assert_ne!(seat.is_ns(), seat.lho().is_ns());
        }
    }

    #[test]
    fn test_seat_plus_position() {
        assert_eq!(Seat::North + TrickPosition::First, Seat::North);
        assert_eq!(Seat::North + TrickPosition::Third, Seat::South);
        assert_eq!(Seat::West + TrickPosition::Second, Seat::North);
        assert_eq!(Seat::South + TrickPosition::Fourth, Seat::East);
    }

    #[test]
    fn test_position_of_seat() {
        for leader in Seat::ALL {
            for position in TrickPosition::ALL {
                let seat = leader + position;
                assert_eq!(TrickPosition::of_seat(leader, seat), position);
            }
        }
    }

    #[test]
    fn test_char_round_trip() {
        for seat in Seat::ALL {
            assert_eq!(Seat::from_char(seat.to_char()), Some(seat));
        }
        assert_eq!(Seat::from_char('X'), None);
    }
}
