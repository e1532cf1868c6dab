//! Bottom-up reveal of a generated plant.
//!
//! [`RevealQueue::build`] flattens a [`PlantStructure`] into items sorted by
//! descending canvas y (lowest on screen first). Playback then flips one
//! item visible per [`TimingConfig::reveal_interval`](crate::config::TimingConfig)
//! milliseconds, strictly in queue order.

use crate::plant::PlantStructure;
use crate::types::{Millis, PlantId};

/// Reference to one drawable element of a plant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementRef {
    Segment(usize),
    Branch(usize),
    BranchFlower { branch: usize, flower: usize },
    CrownFlower { crown: usize, flower: usize },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RevealItem {
    pub element: ElementRef,
    pub plant: PlantId,
    pub y: f32,
    pub visible: bool,
}

#[derive(Clone, Debug)]
pub struct RevealQueue {
    items: Vec<RevealItem>,
    cursor: usize,
    interval: Millis,
    next_due: Option<Millis>,
}

impl RevealQueue {
    /// Builds the queue for one plant.
    ///
    /// Items are collected in generation order (segments, then each branch
    /// followed by its flowers, then crown flowers) and stable-sorted by
    /// descending y, so ties keep their insertion order.
    pub fn build(plant_id: PlantId, plant: &PlantStructure, interval: Millis) -> Self {
        let mut items = Vec::with_capacity(plant.element_count());
        let item = |element, y| RevealItem {
            element,
            plant: plant_id,
            y,
            visible: false,
        };

        for (i, s) in plant.segments.iter().enumerate() {
            items.push(item(ElementRef::Segment(i), s.pos.y));
        }
        for (b, branch) in plant.branches.iter().enumerate() {
            items.push(item(ElementRef::Branch(b), branch.pos.y));
            for (f, flower) in branch.flowers.iter().enumerate() {
                items.push(item(
                    ElementRef::BranchFlower { branch: b, flower: f },
                    flower.pos.y,
                ));
            }
        }
        for (c, crown) in plant.crowns.iter().enumerate() {
            for (f, flower) in crown.flowers.iter().enumerate() {
                items.push(item(ElementRef::CrownFlower { crown: c, flower: f }, flower.pos.y));
            }
        }

        items.sort_by(|a, b| b.y.total_cmp(&a.y));

        Self {
            items,
            cursor: 0,
            interval,
            next_due: None,
        }
    }

    pub fn items(&self) -> &[RevealItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items already revealed.
    pub fn revealed(&self) -> usize {
        self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.items.len()
    }

    /// Starts playback; the first item becomes due immediately.
    pub fn start(&mut self, now: Millis) {
        if self.next_due.is_none() {
            self.next_due = Some(now);
        }
    }

    /// Reveals every item that is due at `now`.
    ///
    /// Each revealed item pushes the next due time forward by one interval,
    /// so a long frame reveals several items in order rather than skipping.
    ///
    /// ### Returns
    /// The number of items revealed by this call.
    pub fn advance(&mut self, plant: &mut PlantStructure, now: Millis) -> usize {
        let Some(mut due) = self.next_due else {
            return 0;
        };

        let mut revealed = 0;
        while self.cursor < self.items.len() && now >= due {
            let item = &mut self.items[self.cursor];
            item.visible = true;
            set_revealed(plant, item.element);

            self.cursor += 1;
            revealed += 1;
            due += self.interval;
        }

        self.next_due = Some(due);
        revealed
    }
}

fn set_revealed(plant: &mut PlantStructure, element: ElementRef) {
    match element {
        ElementRef::Segment(i) => plant.segments[i].revealed = true,
        ElementRef::Branch(i) => plant.branches[i].revealed = true,
        ElementRef::BranchFlower { branch, flower } => {
            plant.branches[branch].flowers[flower].revealed = true
        }
        ElementRef::CrownFlower { crown, flower } => {
            plant.crowns[crown].flowers[flower].revealed = true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GrowthConfig;
    use crate::generator::PlantGenerator;
    use crate::plant::{BranchKind, Flower};
    use crate::types::{BalloonColor, Direction, StemVariant};
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn generated(seed: u64) -> PlantStructure {
        PlantGenerator::new(GrowthConfig::default())
            .pre_generate(
                Vec2::new(100.0, 190.0),
                170.0,
                &mut ChaCha8Rng::seed_from_u64(seed),
            )
            .structure
    }

    #[test]
    fn queue_is_sorted_bottom_up() {
        for seed in 0..50 {
            let plant = generated(seed);
            let queue = RevealQueue::build(0, &plant, 50);

            assert_eq!(queue.len(), plant.element_count());
            for pair in queue.items().windows(2) {
                assert!(pair[0].y >= pair[1].y, "seed {seed}: {pair:?}");
            }
        }
    }

    #[test]
    fn building_twice_gives_identical_order() {
        let plant = generated(17);
        let a = RevealQueue::build(3, &plant, 50);
        let b = RevealQueue::build(3, &plant, 50);
        assert_eq!(a.items(), b.items());
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut plant = PlantStructure::new(Vec2::new(0.0, 100.0), StemVariant::Straight);
        plant.add_segment(Vec2::new(0.0, 92.0));
        plant.add_branch(
            Vec2::new(0.0, 92.0),
            Direction::Right,
            BranchKind::FlowerBranch,
            vec![Flower::new(Vec2::new(12.0, 92.0), BalloonColor::Yellow)],
        );

        let queue = RevealQueue::build(0, &plant, 50);
        let order: Vec<ElementRef> = queue.items().iter().map(|i| i.element).collect();
        assert_eq!(
            order,
            vec![
                ElementRef::Segment(0),
                ElementRef::Branch(0),
                ElementRef::BranchFlower { branch: 0, flower: 0 },
            ]
        );
    }

    #[test]
    fn playback_reveals_one_item_per_interval() {
        let mut plant = generated(2);
        let mut queue = RevealQueue::build(0, &plant, 50);
        let total = queue.len();
        assert!(total > 3);

        // Nothing happens before start.
        assert_eq!(queue.advance(&mut plant, 1_000), 0);

        queue.start(1_000);
        assert_eq!(queue.advance(&mut plant, 1_000), 1);
        assert_eq!(queue.advance(&mut plant, 1_049), 0);
        assert_eq!(queue.advance(&mut plant, 1_050), 1);
        // A long frame catches up in order.
        assert_eq!(queue.advance(&mut plant, 1_150), 2);
        assert_eq!(queue.revealed(), 4);

        let first = queue.items()[0].element;
        assert!(queue.items()[..4].iter().all(|i| i.visible));
        assert!(queue.items()[4..].iter().all(|i| !i.visible));
        if let ElementRef::Segment(i) = first {
            assert!(plant.segments[i].revealed);
        }

        queue.advance(&mut plant, 1_000 + 50 * total as u64);
        assert!(queue.is_finished());
        assert!(plant.is_fully_revealed());
    }
}
