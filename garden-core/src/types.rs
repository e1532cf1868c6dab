/// Identifier for a plant in [`crate::garden::GardenState`].
///
/// This is an index into the garden's plant list, and is only meaningful
/// within the lifetime of a given session.
pub type PlantId = usize;

/// Identifier for a stem lineage inside one plant generation.
pub type LineageId = usize;

/// Identifier handed out for each admitted seed planting.
pub type SeedId = u64;

/// Milliseconds on the garden's monotonic clock.
pub type Millis = u64;

/// Horizontal direction of a branch or split.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// `-1.0` for [`Direction::Left`], `1.0` for [`Direction::Right`].
    pub fn sign(self) -> f32 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Visual stem kind, chosen once per plant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StemVariant {
    Straight,
    Curved,
    Thick,
}

impl StemVariant {
    pub const ALL: [StemVariant; 3] = [
        StemVariant::Straight,
        StemVariant::Curved,
        StemVariant::Thick,
    ];

    /// Drawn stem width in canvas units.
    pub fn width(self) -> f32 {
        match self {
            StemVariant::Straight => 8.0,
            StemVariant::Curved => 10.0,
            StemVariant::Thick => 12.0,
        }
    }
}

/// Balloon palette used for flower clusters and decorative balloons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BalloonColor {
    Blue,
    Green,
    Red,
    Yellow,
}

impl BalloonColor {
    pub const ALL: [BalloonColor; 4] = [
        BalloonColor::Blue,
        BalloonColor::Green,
        BalloonColor::Red,
        BalloonColor::Yellow,
    ];
}
