use std::fmt;

use serde::{Deserialize, Serialize};

/// Lowest value the minimum bound may take
pub const MINIMUM_FLOOR: i32 = 5;
/// Highest value the maximum bound may take
pub const MAXIMUM_CEILING: i32 = 33;
/// Highest target the panel accepts
pub const TARGET_CEILING: i32 = 28;
/// The minimum must stay strictly below the target, so the target can never go under this
pub const TARGET_FLOOR: i32 = MINIMUM_FLOOR + 1;

/// The three operating bounds pushed to the microcontroller.
///
/// `MINIMUM_FLOOR <= minimum < target < maximum <= MAXIMUM_CEILING` holds after every
/// operation. Moving the target drags whichever bound it would cross along with it.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Setpoint{
    target: i32,
    minimum: i32,
    maximum: i32,
}

/// Why a triple of values is not a valid setpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetpointError{
    TargetOutOfRange(i32),
    MinimumOutOfRange{minimum: i32, target: i32},
    MaximumOutOfRange{maximum: i32, target: i32},
}

impl fmt::Display for SetpointError{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self{
            SetpointError::TargetOutOfRange(t) => write!(f, "target {} outside {}..={}", t, TARGET_FLOOR, TARGET_CEILING),
            SetpointError::MinimumOutOfRange{minimum, target} => write!(f, "minimum {} must be within {}..{}", minimum, MINIMUM_FLOOR, target),
            SetpointError::MaximumOutOfRange{maximum, target} => write!(f, "maximum {} must be within {}..={}", maximum, target + 1, MAXIMUM_CEILING),
        }
    }
}

impl std::error::Error for SetpointError{}

impl Setpoint{
    /// Builds a setpoint, refusing any triple that breaks the ordering
    pub fn new(target: i32, minimum: i32, maximum: i32) -> Result<Setpoint, SetpointError> {
        if !(TARGET_FLOOR..=TARGET_CEILING).contains(&target){
            return Err(SetpointError::TargetOutOfRange(target));
        }
        if minimum < MINIMUM_FLOOR || minimum >= target{
            return Err(SetpointError::MinimumOutOfRange{minimum, target});
        }
        if maximum <= target || maximum > MAXIMUM_CEILING{
            return Err(SetpointError::MaximumOutOfRange{maximum, target});
        }
        Ok(Self{target, minimum, maximum})
    }

    pub fn target(&self) -> i32 {
        self.target
    }
    pub fn minimum(&self) -> i32 {
        self.minimum
    }
    pub fn maximum(&self) -> i32 {
        self.maximum
    }

    pub fn increment_target(&mut self){
        if self.target < TARGET_CEILING{
            self.target += 1;
            self.drag_bounds();
        }
    }
    pub fn decrement_target(&mut self){
        if self.target > TARGET_FLOOR{
            self.target -= 1;
            self.drag_bounds();
        }
    }
    pub fn increment_minimum(&mut self){
        if self.minimum < self.target - 1{
            self.minimum += 1;
        }
    }
    pub fn decrement_minimum(&mut self){
        if self.minimum > MINIMUM_FLOOR{
            self.minimum -= 1;
        }
    }
    pub fn increment_maximum(&mut self){
        if self.maximum < MAXIMUM_CEILING{
            self.maximum += 1;
        }
    }
    pub fn decrement_maximum(&mut self){
        if self.maximum > self.target + 1{
            self.maximum -= 1;
        }
    }

    fn drag_bounds(&mut self){
        if self.minimum >= self.target{
            self.minimum = MINIMUM_FLOOR.max(self.target - 1);
        }
        if self.maximum <= self.target{
            self.maximum = MAXIMUM_CEILING.min(self.target + 1);
        }
    }

    /// Checks the ordering invariant
    pub fn is_valid(&self) -> bool {
        Self::new(self.target, self.minimum, self.maximum).is_ok()
    }
}

impl Default for Setpoint{
    fn default() -> Self {
        Self{
            target: TARGET_FLOOR,
            minimum: MINIMUM_FLOOR,
            maximum: TARGET_FLOOR + 1,
        }
    }
}

impl fmt::Display for Setpoint{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target={}, minimo={}, maximo={}", self.target, self.minimum, self.maximum)
    }
}
