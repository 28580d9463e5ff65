//! Flow element interface.

use afn_air::AirState;

/// Everything a component needs to evaluate one link.
#[derive(Debug, Clone, Copy)]
pub struct FlowInput<'a> {
    /// Pressure at the from side minus the to side at the link [Pa],
    /// stack effect included.
    pub pressure_drop: f64,
    /// Number of identical elements in parallel.
    pub multiplier: f64,
    /// Opening factor, speed ratio or on-fraction, depending on the element.
    pub control: f64,
    /// Use the linearized branch (laminar initialization pass).
    pub linear: bool,
    /// Air at the from node.
    pub from: &'a AirState,
    /// Air at the to node.
    pub to: &'a AirState,
}

impl<'a> FlowInput<'a> {
    pub fn new(pressure_drop: f64, from: &'a AirState, to: &'a AirState) -> Self {
        Self {
            pressure_drop,
            multiplier: 1.0,
            control: 1.0,
            linear: false,
            from,
            to,
        }
    }

    pub fn with_control(mut self, control: f64) -> Self {
        self.control = control;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_linear(mut self, linear: bool) -> Self {
        self.linear = linear;
        self
    }

    /// Air on the upstream side of the pressure difference.
    pub fn upwind(&self) -> &'a AirState {
        if self.pressure_drop >= 0.0 {
            self.from
        } else {
            self.to
        }
    }
}

/// Flow through a link and its derivative with respect to the pressure
/// difference.
///
/// Most elements produce a single flow. Large vertical openings with a
/// neutral plane produce two opposite flows; `count` is then 2.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ComponentFlow {
    /// Mass flow [kg/s], positive from -> to.
    pub flow: [f64; 2],
    /// dF/d(dp) [kg/(s·Pa)] of each flow.
    pub derivative: [f64; 2],
    pub count: usize,
}

impl ComponentFlow {
    pub fn single(flow: f64, derivative: f64) -> Self {
        Self {
            flow: [flow, 0.0],
            derivative: [derivative, 0.0],
            count: 1,
        }
    }

    pub fn two_way(flow: [f64; 2], derivative: [f64; 2]) -> Self {
        Self {
            flow,
            derivative,
            count: 2,
        }
    }

    pub fn zero() -> Self {
        Self::single(0.0, 0.0)
    }

    /// Net mass flow from -> to.
    pub fn net(&self) -> f64 {
        self.flow[0] + self.flow[1]
    }

    /// Derivative of the net flow.
    pub fn total_derivative(&self) -> f64 {
        self.derivative[0] + self.derivative[1]
    }

    /// Sum of flow magnitudes, the characteristic flow used by the
    /// relative convergence test.
    pub fn magnitude(&self) -> f64 {
        self.flow[0].abs() + self.flow[1].abs()
    }

    /// Mass flow moving from -> to.
    pub fn forward(&self) -> f64 {
        self.flow.iter().filter(|f| **f > 0.0).fold(0.0, |a, f| a + f)
    }

    /// Mass flow moving to -> from, as a positive number.
    pub fn reverse(&self) -> f64 {
        self.flow.iter().filter(|f| **f < 0.0).fold(0.0, |a, f| a - f)
    }

    pub fn scaled(self, factor: f64) -> Self {
        Self {
            flow: [self.flow[0] * factor, self.flow[1] * factor],
            derivative: [self.derivative[0] * factor, self.derivative[1] * factor],
            count: self.count,
        }
    }

    /// Replace non-finite entries with zero and negative derivatives with zero.
    pub fn sanitized(self) -> Self {
        let clean = |v: f64| if v.is_finite() { v } else { 0.0 };
        Self {
            flow: [clean(self.flow[0]), clean(self.flow[1])],
            derivative: [
                clean(self.derivative[0]).max(0.0),
                clean(self.derivative[1]).max(0.0),
            ],
            count: self.count,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.flow.iter().chain(self.derivative.iter()).all(|v| v.is_finite())
    }
}

/// A flow-resistance element.
///
/// Implementations are pure functions of their parameters and the input, so
/// the solver may call them at arbitrary iterates. They return the flow of a
/// single element; the link multiplier is applied by
/// [`Component::calculate`](crate::Component::calculate).
pub trait FlowElement {
    /// Short type name for diagnostics.
    fn type_name(&self) -> &'static str;

    /// Flow and derivative for the given link state.
    fn calculate(&self, input: &FlowInput<'_>) -> ComponentFlow;

    /// Whether the element has a preferred flow direction (fans, dampers,
    /// flow sources).
    fn is_directional(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_and_reverse_split() {
        let f = ComponentFlow::two_way([0.3, -0.1], [0.01, 0.02]);
        assert!((f.net() - 0.2).abs() < 1e-15);
        assert!((f.forward() - 0.3).abs() < 1e-15);
        assert!((f.reverse() - 0.1).abs() < 1e-15);
        assert!((f.magnitude() - 0.4).abs() < 1e-15);
        assert!((f.total_derivative() - 0.03).abs() < 1e-15);
    }

    #[test]
    fn one_way_flow_has_positive_zero_on_the_other_side() {
        let back = ComponentFlow::single(-0.2, 0.01);
        assert!(back.forward() == 0.0 && back.forward().is_sign_positive());
        assert!((back.reverse() - 0.2).abs() < 1e-15);
        let ahead = ComponentFlow::single(0.2, 0.01);
        assert!(ahead.reverse() == 0.0 && ahead.reverse().is_sign_positive());
        let still = ComponentFlow::single(0.0, 0.01);
        assert!(still.forward().is_sign_positive() && still.reverse().is_sign_positive());
    }

    #[test]
    fn sanitized_removes_non_finite() {
        let f = ComponentFlow::single(f64::NAN, f64::INFINITY).sanitized();
        assert_eq!(f, ComponentFlow::single(0.0, 0.0));
        assert!(f.is_finite());
    }

    #[test]
    fn upwind_follows_pressure_sign() {
        let warm = AirState::new(25.0, 0.0, 101_325.0).unwrap();
        let cold = AirState::new(0.0, 0.0, 101_325.0).unwrap();
        let fwd = FlowInput::new(2.0, &warm, &cold);
        let rev = FlowInput::new(-2.0, &warm, &cold);
        assert_eq!(fwd.upwind().temperature_c(), 25.0);
        assert_eq!(rev.upwind().temperature_c(), 0.0);
    }
}
