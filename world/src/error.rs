//! Error types raised while constructing grids and dispatching detail hooks.

use glam::Vec3;
use plinth_core::PlacementError;
use thiserror::Error;

use crate::object::GridObject;

/// Failures that prevent a grid from being constructed.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum GridError {
    /// The highest layer index was negative.
    #[error("y axis maximum must not be negative, got {0}")]
    NegativeLayerMax(i32),
    /// The cell size was zero, negative or not finite.
    #[error("cell size must be a positive finite number, got {0}")]
    InvalidCellSize(f32),
    /// A sloped surface could not be interpreted as a ramp.
    #[error(transparent)]
    Ramp(#[from] RampError),
}

/// Failures raised while classifying a sloped surface.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum RampError {
    /// The probed surface faces straight up and has no slope to classify.
    #[error("a flat surface cannot describe a ramp")]
    FlatSurface,
    /// Neither horizontal axis showed a change in elevation.
    #[error("unable to determine ramp direction for the surface hit at {0}")]
    Indeterminate(Vec3),
}

/// Failures reported by a cell detail registry or a detail lifecycle hook.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DetailError {
    /// A detail of the same concrete type is already registered.
    #[error("a detail of type `{type_name}` is already registered")]
    Duplicate {
        /// Name of the rejected detail type.
        type_name: &'static str,
    },
    /// A detail refused to let its owner leave the grid.
    #[error("detail `{type_name}` failed during removal: {reason}")]
    RemovalRefused {
        /// Name of the failing detail type.
        type_name: &'static str,
        /// Explanation supplied by the detail.
        reason: String,
    },
}

/// Placement failure that hands the rejected object back to the caller.
#[derive(Debug, Error)]
#[error("placement rejected: {reason:?}")]
pub struct PlacementRejection {
    /// The object that could not be placed, unchanged.
    pub object: GridObject,
    /// Reason the grid refused the placement.
    pub reason: PlacementError,
}

/// Detail registration failure that hands the object back unchanged.
#[derive(Debug, Error)]
#[error("detail rejected: {error}")]
pub struct DetailRejection {
    /// The object the detail was meant for, without the rejected detail.
    pub object: GridObject,
    /// Reason the registry refused the detail.
    #[source]
    pub error: DetailError,
}
