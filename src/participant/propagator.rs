use std::collections::HashMap;

use nalgebra::DVector;

/// Elements a [Propagator] state vector is made of.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LayoutElement {
    /// Position (km) then velocity (km/s)
    CartesianState,
    /// State transition matrix, row major
    Stm,
}

/// Locates each participant's elements within a [Propagator] state vector.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StateLayout {
    starts: HashMap<(String, LayoutElement), usize>,
}

impl StateLayout {
    /// Declares where this element starts in the state vector.
    pub fn with_element(mut self, participant: &str, element: LayoutElement, start: usize) -> Self {
        self.starts.insert((participant.to_string(), element), start);
        self
    }

    /// Start index of this element, if present.
    pub fn start(&self, participant: &str, element: LayoutElement) -> Option<usize> {
        self.starts
            .get(&(participant.to_string(), element))
            .copied()
    }
}

/// Numerical or analytical integrator attached to one spacecraft.
/// Integration itself is out of our scope: this is all we need from it.
pub trait Propagator {
    /// Advance by `dt_s` seconds (possibly negative) and return
    /// the complete state vector. On failure, the propagator must be
    /// left at the instant it was advanced from: the next request is
    /// expressed relative to that same instant.
    fn advance_by(&mut self, dt_s: f64) -> Result<DVector<f64>, String>;

    /// Current state vector, without any propagation.
    fn state(&self) -> DVector<f64>;

    /// Layout of the state vector.
    fn layout(&self) -> &StateLayout;

    /// Name of the body forces are integrated about.
    fn force_origin(&self) -> &str;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn layout() {
        let layout = StateLayout::default()
            .with_element("sat", LayoutElement::CartesianState, 0)
            .with_element("sat", LayoutElement::Stm, 6);

        assert_eq!(layout.start("sat", LayoutElement::CartesianState), Some(0));
        assert_eq!(layout.start("sat", LayoutElement::Stm), Some(6));
        assert_eq!(layout.start("other", LayoutElement::Stm), None);
    }
}
