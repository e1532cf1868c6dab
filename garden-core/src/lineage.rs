use crate::types::{LineageId, StemVariant};

/// The three things a growing lineage can do in one cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Grow,
    Split,
    Flower,
}

/// Terminal state of a lineage. Exactly one value at any time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineageStatus {
    Growing,
    EndedBySplit,
    EndedByFlower,
}

/// One independently-growing vertical stem thread within a plant.
#[derive(Clone, Debug)]
pub struct StemLineage {
    pub id: LineageId,
    pub parent: Option<LineageId>,
    pub x: f32,
    pub current_height: f32,
    pub max_height: f32,
    pub spawn_height: f32,
    pub variant: StemVariant,
    pub last_split_height: f32,
    pub segments_since_split: u32,
    pub split_depth: u32,
    pub last_action: Action,
    pub status: LineageStatus,
}

impl StemLineage {
    /// Creates the root lineage of a plant.
    ///
    /// The root starts as if its last split happened `min_split_spacing`
    /// below the ground, so the spacing rule never blocks its first split.
    pub fn new_root(
        x: f32,
        max_height: f32,
        variant: StemVariant,
        min_split_spacing: f32,
    ) -> Self {
        Self {
            id: 0,
            parent: None,
            x,
            current_height: 0.0,
            max_height,
            spawn_height: 0.0,
            variant,
            last_split_height: -min_split_spacing,
            segments_since_split: 0,
            split_depth: 0,
            last_action: Action::Grow,
            status: LineageStatus::Growing,
        }
    }

    /// Creates a child of `parent` starting at the parent's current height.
    pub fn new_child(parent: &StemLineage, id: LineageId, x: f32, max_height: f32) -> Self {
        Self {
            id,
            parent: Some(parent.id),
            x,
            current_height: parent.current_height,
            max_height,
            spawn_height: parent.current_height,
            variant: parent.variant,
            last_split_height: parent.current_height,
            segments_since_split: 0,
            split_depth: parent.split_depth + 1,
            last_action: Action::Split,
            status: LineageStatus::Growing,
        }
    }

    /// Fraction of the height budget already used.
    #[inline]
    pub fn progress(&self) -> f32 {
        if self.max_height <= 0.0 {
            1.0
        } else {
            self.current_height / self.max_height
        }
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.current_height >= self.max_height
    }

    #[inline]
    pub fn has_ending_flower(&self) -> bool {
        self.status == LineageStatus::EndedByFlower
    }

    #[inline]
    pub fn ended_by_split(&self) -> bool {
        self.status == LineageStatus::EndedBySplit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_inherits_height_and_increments_depth() {
        let mut root = StemLineage::new_root(100.0, 170.0, StemVariant::Curved, 16.0);
        root.current_height = 48.0;

        let child = StemLineage::new_child(&root, 7, 101.0, 165.0);

        assert_eq!(child.parent, Some(0));
        assert_eq!(child.split_depth, 1);
        assert_eq!(child.current_height, 48.0);
        assert_eq!(child.spawn_height, 48.0);
        assert_eq!(child.last_split_height, 48.0);
        assert_eq!(child.last_action, Action::Split);
        assert_eq!(child.variant, StemVariant::Curved);
        assert_eq!(child.status, LineageStatus::Growing);
    }

    #[test]
    fn status_flags_are_mutually_exclusive() {
        let mut l = StemLineage::new_root(0.0, 10.0, StemVariant::Straight, 16.0);
        assert!(!l.has_ending_flower() && !l.ended_by_split());

        l.status = LineageStatus::EndedBySplit;
        assert!(l.ended_by_split() && !l.has_ending_flower());

        l.status = LineageStatus::EndedByFlower;
        assert!(l.has_ending_flower() && !l.ended_by_split());
    }

    #[test]
    fn progress_handles_degenerate_budget() {
        let l = StemLineage::new_root(0.0, 0.0, StemVariant::Thick, 16.0);
        assert_eq!(l.progress(), 1.0);
        assert!(l.is_finished());
    }
}
