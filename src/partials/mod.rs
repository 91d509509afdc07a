//! Measurement partial derivatives
use std::ops::Range;

use log::trace;
use nalgebra::{DMatrix, Matrix6};

use crate::{
    frame::{LegEnd, Rotation},
    measurement::Sensitivity,
    participant::{ParticipantId, StateAccessor, StmElement},
    prelude::Error,
    signal::SignalPath,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameters measurements may be differentiated against.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SolveForKind {
    /// Position and velocity
    CartesianState,
    Position,
    Velocity,
    /// Solar radiation pressure reflectivity coefficient
    ReflectivityCoefficient,
    /// Atmospheric drag coefficient
    DragCoefficient,
    /// Measurement bias
    Bias,
}

impl std::fmt::Display for SolveForKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::CartesianState => write!(f, "CartesianState"),
            Self::Position => write!(f, "Position"),
            Self::Velocity => write!(f, "Velocity"),
            Self::ReflectivityCoefficient => write!(f, "Cr"),
            Self::DragCoefficient => write!(f, "Cd"),
            Self::Bias => write!(f, "Bias"),
        }
    }
}

impl std::str::FromStr for SolveForKind {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cartesianstate" | "cartesianx" | "state" => Ok(Self::CartesianState),
            "position" => Ok(Self::Position),
            "velocity" => Ok(Self::Velocity),
            "cr" | "reflectivity" => Ok(Self::ReflectivityCoefficient),
            "cd" | "drag" => Ok(Self::DragCoefficient),
            "bias" => Ok(Self::Bias),
            _ => Err(Error::UnknownSolveFor(s.to_string())),
        }
    }
}

/// [SolveFor] is a [SolveForKind] resolved once and for all to the
/// state transition matrix columns it spans.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveFor {
    pub kind: SolveForKind,
    /// Participant this parameter belongs to (none for measurement biases)
    pub participant: Option<ParticipantId>,
    /// Participant name, for reporting
    pub name: String,
    /// Columns of the participant's state transition matrix
    pub columns: Range<usize>,
}

impl SolveFor {
    /// Resolves this [SolveForKind] for the named participant.
    pub fn new(
        accessor: &StateAccessor,
        participant: &str,
        kind: SolveForKind,
    ) -> Result<Self, Error> {
        let id = accessor.id(participant)?;
        let p = accessor.participant(id)?;

        let columns = match kind {
            SolveForKind::CartesianState => p.stm_columns(StmElement::CartesianState)?,
            SolveForKind::Position => {
                let cols = p.stm_columns(StmElement::CartesianState)?;
                cols.start..cols.start + 3
            },
            SolveForKind::Velocity => {
                let cols = p.stm_columns(StmElement::CartesianState)?;
                cols.start + 3..cols.end
            },
            SolveForKind::ReflectivityCoefficient => {
                p.stm_columns(StmElement::ReflectivityCoefficient)?
            },
            SolveForKind::DragCoefficient => p.stm_columns(StmElement::DragCoefficient)?,
            SolveForKind::Bias => 0..0,
        };

        Ok(Self {
            kind,
            participant: Some(id),
            name: participant.to_string(),
            columns,
        })
    }

    /// Measurement bias.
    pub fn bias() -> Self {
        Self {
            kind: SolveForKind::Bias,
            participant: None,
            name: String::new(),
            columns: 0..0,
        }
    }
}

/// Measurement partial derivatives: one row per observable value,
/// one column per solved-for element.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivativeMatrix {
    pub kind: SolveForKind,
    /// Participant name (empty for measurement biases)
    pub participant: String,
    pub matrix: DMatrix<f64>,
}

impl DerivativeMatrix {
    pub fn nrows(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.matrix.ncols()
    }

    /// Partial derivative of the observable `row`, with respect to element `col`.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.matrix.get((row, col)).copied()
    }
}

/// Participant state (expressed in its own frame) to inertial state Jacobian.
fn state_rotation(rotation: &Rotation) -> DMatrix<f64> {
    let mut jacobian = Matrix6::<f64>::zeros();
    jacobian.fixed_view_mut::<3, 3>(0, 0).copy_from(&rotation.matrix);
    jacobian.fixed_view_mut::<3, 3>(3, 0).copy_from(&rotation.rate);
    jacobian.fixed_view_mut::<3, 3>(3, 3).copy_from(&rotation.matrix);
    DMatrix::from_column_slice(6, 6, jacobian.as_slice())
}

/// Chains the leg sensitivities of one path down to the solved-for columns.
fn chain_path(
    path: &SignalPath,
    sensitivity: &[DMatrix<f64>],
    id: ParticipantId,
    columns: &Range<usize>,
    total: &mut DMatrix<f64>,
) -> Result<(), Error> {
    for (leg, sens) in path.legs().iter().zip(sensitivity.iter()) {
        for (end, sign) in [(LegEnd::Transmit, -1.0), (LegEnd::Receive, 1.0)] {
            if leg.participant(end) != id {
                continue;
            }

            let stm = &leg.state(end).stm;
            if stm.nrows() < 6 || stm.ncols() < columns.end {
                return Err(Error::StmDimension);
            }

            let jacobian = state_rotation(leg.frames.inertial_from(end));
            let phi = stm.view((0, columns.start), (6, columns.len()));

            trace!("leg #{} - {} end partials", leg.index, end);
            *total += sens * jacobian * phi * sign;
        }
    }
    Ok(())
}

/// Partial derivatives of an observable, from its [Sensitivity] to the
/// resolved path(s), with respect to this [SolveFor].
pub(crate) fn partials(
    path: &SignalPath,
    start: Option<&SignalPath>,
    sensitivity: &Sensitivity,
    dimension: usize,
    solve_for: &SolveFor,
) -> Result<DerivativeMatrix, Error> {
    let id = match solve_for.participant {
        Some(id) => id,
        None => {
            return Ok(DerivativeMatrix {
                kind: SolveForKind::Bias,
                participant: String::new(),
                matrix: DMatrix::identity(dimension, dimension),
            });
        },
    };

    let involved = path.involves(id) || start.map(|start| start.involves(id)).unwrap_or(false);

    if !involved {
        return Err(Error::NotAParticipant(solve_for.name.clone()));
    }

    let mut matrix = DMatrix::zeros(dimension, solve_for.columns.len());

    chain_path(path, &sensitivity.path, id, &solve_for.columns, &mut matrix)?;

    if let Some(start) = start {
        chain_path(start, &sensitivity.start, id, &solve_for.columns, &mut matrix)?;
    }

    Ok(DerivativeMatrix {
        kind: solve_for.kind,
        participant: solve_for.name.clone(),
        matrix,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::Matrix3;
    use std::str::FromStr;

    #[test]
    fn solve_for_parsing() {
        assert_eq!(
            SolveForKind::from_str("Position").unwrap(),
            SolveForKind::Position
        );
        assert_eq!(
            SolveForKind::from_str("CartesianX").unwrap(),
            SolveForKind::CartesianState
        );
        assert_eq!(SolveForKind::from_str("Cr").unwrap(), SolveForKind::ReflectivityCoefficient);
        assert_eq!(SolveForKind::from_str("bias").unwrap(), SolveForKind::Bias);
        assert!(SolveForKind::from_str("attitude").is_err());
    }

    #[test]
    fn rotating_state_jacobian() {
        let rotation = Rotation {
            matrix: Matrix3::new(0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0),
            rate: Matrix3::new(-1.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 0.0),
            t: None,
        };

        let jacobian = state_rotation(&rotation);
        assert_eq!(jacobian[(1, 0)], 1.0);
        assert_eq!(jacobian[(0, 1)], -1.0);
        assert_eq!(jacobian[(3, 0)], -1.0);
        assert_eq!(jacobian[(4, 3)], 1.0);
        assert_eq!(jacobian[(0, 3)], 0.0);
        assert_eq!(jacobian[(5, 5)], 1.0);
    }
}
