//! The 5x4 trick table for a single board.
//!
//! A cell holds the number of tricks the leading side takes with best
//! play, indexed by strain and by the seat on lead.

use std::fmt;

use dds_core::{Seat, Strain};

/// Double-dummy results for all twenty strain/leader combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrickTable {
    cells: [[u8; 4]; 5],
}

impl TrickTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tricks for the leading side in the given cell.
    pub fn get(&self, strain: Strain, leader: Seat) -> u8 {
        self.cells[strain.index()][leader.index()]
    }

    pub fn set(&mut self, strain: Strain, leader: Seat, tricks: u8) {
        self.cells[strain.index()][leader.index()] = tricks;
    }

    /// All cells in strain-major order, the order table mode solves them.
    pub fn iter(&self) -> impl Iterator<Item = (Strain, Seat, u8)> + '_ {
        Strain::ALL.into_iter().flat_map(move |strain| {
            Seat::ALL
                .into_iter()
                .map(move |leader| (strain, leader, self.get(strain, leader)))
        })
    }
}

impl fmt::Display for TrickTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "    ")?;
        for leader in Seat::ALL {
            write!(f, "{:>3}", leader.to_char())?;
        }
        writeln!(f)?;
        for strain in Strain::ALL.into_iter().rev() {
            write!(f, "{:>3} ", strain.to_char())?;
            for leader in Seat::ALL {
                write!(f, "{:>3}", self.get(strain, leader))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set() {
        let mut table = TrickTable::new();
        assert_eq!(table.get(Strain::NoTrump, Seat::West), 0);
        table.set(Strain::NoTrump, Seat::West, 9);
        table.set(Strain::Spades, Seat::North, 4);
        assert_eq!(table.get(Strain::NoTrump, Seat::West), 9);
        assert_eq!(table.get(Strain::Spades, Seat::North), 4);
        assert_eq!(table.get(Strain::Spades, Seat::East), 0);
    }

    #[test]
    fn test_iter_covers_all_cells() {
        let mut table = TrickTable::new();
        for (i, (strain, leader)) in Strain::ALL
            .into_iter()
            .flat_map(|s| Seat::ALL.into_iter().map(move |l| (s, l)))
            .enumerate()
        {
            table.set(strain, leader, i as u8);
        }
        let cells: Vec<_> = table.iter().collect();
        assert_eq!(cells.len(), 20);
        for (i, (strain, leader, tricks)) in cells.into_iter().enumerate() {
            assert_eq!(tricks, i as u8);
            assert_eq!(table.get(strain, leader), tricks);
        }
    }

    #[test]
    fn test_display_shape() {
        let mut table = TrickTable::new();
        table.set(Strain::NoTrump, Seat::North, 13);
        let text = table.to_string();
        assert_eq!(text.lines().count(), 6);
        // Header row lists the leaders, first body row is no-trump.
        assert!(text.lines().next().unwrap().contains('N'));
        assert!(text.lines().nth(1).unwrap().contains("13"));
    }
}
