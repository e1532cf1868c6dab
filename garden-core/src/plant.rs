use glam::Vec2;

use crate::types::{BalloonColor, Direction, StemVariant};

#[derive(Clone, Debug)]
pub struct StemSegment {
    /// Top-left anchor on the stem axis; the segment spans `pos.y..pos.y + h`.
    pub pos: Vec2,
    pub variant: StemVariant,
    pub revealed: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BranchKind {
    DiagonalSplit,
    FlowerBranch,
}

#[derive(Clone, Debug)]
pub struct Flower {
    pub pos: Vec2,
    pub color: BalloonColor,
    pub revealed: bool,
}

#[derive(Clone, Debug)]
pub struct Branch {
    pub pos: Vec2,
    pub direction: Direction,
    pub kind: BranchKind,
    pub flowers: Vec<Flower>,
    pub revealed: bool,
}

/// Terminal cluster floating directly above a lineage that grew to its
/// full height. Has no stem geometry of its own.
#[derive(Clone, Debug)]
pub struct Crown {
    pub pos: Vec2,
    pub flowers: Vec<Flower>,
}

#[derive(Clone, Debug)]
pub struct PlantStructure {
    /// Seed position on the ground line.
    pub origin: Vec2,
    pub variant: StemVariant,
    pub segments: Vec<StemSegment>,
    pub branches: Vec<Branch>,
    pub crowns: Vec<Crown>,
}

impl Flower {
    pub fn new(pos: Vec2, color: BalloonColor) -> Self {
        Self {
            pos,
            color,
            revealed: false,
        }
    }
}

impl PlantStructure {
    pub fn new(origin: Vec2, variant: StemVariant) -> Self {
        Self {
            origin,
            variant,
            segments: Vec::with_capacity(32),
            branches: Vec::with_capacity(8),
            crowns: Vec::with_capacity(4),
        }
    }

    pub fn add_segment(&mut self, pos: Vec2) -> usize {
        let id = self.segments.len();
        self.segments.push(StemSegment {
            pos,
            variant: self.variant,
            revealed: false,
        });
        id
    }

    pub fn add_branch(
        &mut self,
        pos: Vec2,
        direction: Direction,
        kind: BranchKind,
        flowers: Vec<Flower>,
    ) -> usize {
        let id = self.branches.len();
        self.branches.push(Branch {
            pos,
            direction,
            kind,
            flowers,
            revealed: false,
        });
        id
    }

    pub fn add_crown(&mut self, pos: Vec2, flowers: Vec<Flower>) -> usize {
        let id = self.crowns.len();
        self.crowns.push(Crown { pos, flowers });
        id
    }

    /// All balloons of the plant: branch flowers first, then crown flowers.
    pub fn flowers(&self) -> impl Iterator<Item = &Flower> {
        self.branches
            .iter()
            .flat_map(|b| b.flowers.iter())
            .chain(self.crowns.iter().flat_map(|c| c.flowers.iter()))
    }

    pub fn element_count(&self) -> usize {
        self.segments.len() + self.branches.len() + self.flowers().count()
    }

    pub fn is_fully_revealed(&self) -> bool {
        self.segments.iter().all(|s| s.revealed)
            && self.branches.iter().all(|b| b.revealed)
            && self.flowers().all(|f| f.revealed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flowers_iterates_branches_then_crowns() {
        let mut plant = PlantStructure::new(Vec2::new(0.0, 190.0), StemVariant::Straight);
        plant.add_branch(
            Vec2::new(0.0, 150.0),
            Direction::Left,
            BranchKind::FlowerBranch,
            vec![Flower::new(Vec2::new(-12.0, 150.0), BalloonColor::Red)],
        );
        plant.add_crown(
            Vec2::new(0.0, 100.0),
            vec![
                Flower::new(Vec2::new(-5.0, 85.0), BalloonColor::Blue),
                Flower::new(Vec2::new(5.0, 85.0), BalloonColor::Green),
            ],
        );

        let colors: Vec<BalloonColor> = plant.flowers().map(|f| f.color).collect();
        assert_eq!(
            colors,
            vec![BalloonColor::Red, BalloonColor::Blue, BalloonColor::Green]
        );
        assert_eq!(plant.element_count(), 4);
    }

    #[test]
    fn new_elements_start_hidden() {
        let mut plant = PlantStructure::new(Vec2::ZERO, StemVariant::Thick);
        let id = plant.add_segment(Vec2::new(0.0, -8.0));

        assert_eq!(id, 0);
        assert_eq!(plant.segments[0].variant, StemVariant::Thick);
        assert!(!plant.is_fully_revealed());

        plant.segments[0].revealed = true;
        assert!(plant.is_fully_revealed());
    }
}
