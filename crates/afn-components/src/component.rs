//! The closed set of network elements.

use crate::crack::SurfaceCrack;
use crate::damper::Damper;
use crate::duct::{Coil, Duct, HeatExchanger};
use crate::fan::{ConstantVolumeFan, DetailedFan, ZoneExhaustFan};
use crate::horizontal::HorizontalOpening;
use crate::leakage::{EffectiveLeakageArea, EffectiveLeakageRatio};
use crate::opening::{DetailedOpening, SimpleOpening};
use crate::pressure_drop::ConstantPressureDrop;
use crate::source::{SpecifiedMassFlow, SpecifiedVolumeFlow};
use crate::traits::{ComponentFlow, FlowElement, FlowInput};

/// A flow element of any supported kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    SurfaceCrack(SurfaceCrack),
    EffectiveLeakageArea(EffectiveLeakageArea),
    EffectiveLeakageRatio(EffectiveLeakageRatio),
    SimpleOpening(SimpleOpening),
    DetailedOpening(DetailedOpening),
    HorizontalOpening(HorizontalOpening),
    Duct(Duct),
    HeatExchanger(HeatExchanger),
    Coil(Coil),
    Damper(Damper),
    DetailedFan(DetailedFan),
    ConstantVolumeFan(ConstantVolumeFan),
    ZoneExhaustFan(ZoneExhaustFan),
    ConstantPressureDrop(ConstantPressureDrop),
    SpecifiedMassFlow(SpecifiedMassFlow),
    SpecifiedVolumeFlow(SpecifiedVolumeFlow),
}

impl Component {
    fn element(&self) -> &dyn FlowElement {
        match self {
            Component::SurfaceCrack(c) => c,
            Component::EffectiveLeakageArea(c) => c,
            Component::EffectiveLeakageRatio(c) => c,
            Component::SimpleOpening(c) => c,
            Component::DetailedOpening(c) => c,
            Component::HorizontalOpening(c) => c,
            Component::Duct(c) => c,
            Component::HeatExchanger(c) => c,
            Component::Coil(c) => c,
            Component::Damper(c) => c,
            Component::DetailedFan(c) => c,
            Component::ConstantVolumeFan(c) => c,
            Component::ZoneExhaustFan(c) => c,
            Component::ConstantPressureDrop(c) => c,
            Component::SpecifiedMassFlow(c) => c,
            Component::SpecifiedVolumeFlow(c) => c,
        }
    }

    /// Flow through `input.multiplier` parallel elements.
    ///
    /// Never returns non-finite values or negative derivatives.
    pub fn calculate(&self, input: &FlowInput<'_>) -> ComponentFlow {
        self.element()
            .calculate(input)
            .scaled(input.multiplier)
            .sanitized()
    }

    pub fn type_name(&self) -> &'static str {
        self.element().type_name()
    }

    pub fn is_directional(&self) -> bool {
        self.element().is_directional()
    }

    /// Whether the element's flow is set by its control rather than by the
    /// pressure difference, so a controller can drive it.
    pub fn is_flow_source(&self) -> bool {
        matches!(
            self,
            Component::SpecifiedMassFlow(_)
                | Component::SpecifiedVolumeFlow(_)
                | Component::ZoneExhaustFan(_)
                | Component::ConstantVolumeFan(_)
        )
    }
}

macro_rules! impl_from_element {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Component {
                fn from(c: $variant) -> Self {
                    Component::$variant(c)
                }
            }
        )*
    };
}

impl_from_element!(
    SurfaceCrack,
    EffectiveLeakageArea,
    EffectiveLeakageRatio,
    SimpleOpening,
    DetailedOpening,
    HorizontalOpening,
    Duct,
    HeatExchanger,
    Coil,
    Damper,
    DetailedFan,
    ConstantVolumeFan,
    ZoneExhaustFan,
    ConstantPressureDrop,
    SpecifiedMassFlow,
    SpecifiedVolumeFlow,
);

#[cfg(test)]
mod tests {
    use super::*;
    use afn_air::AirState;
    use afn_core::units::{kgps, m3ps};

    #[test]
    fn multiplier_scales_flow_and_derivative() {
        let air = AirState::standard();
        let c: Component = SurfaceCrack::new(0.01, 0.65).unwrap().into();
        let one = c.calculate(&FlowInput::new(5.0, &air, &air));
        let three = c.calculate(&FlowInput::new(5.0, &air, &air).with_multiplier(3.0));
        assert!((three.net() - 3.0 * one.net()).abs() < 1e-15);
        assert!((three.total_derivative() - 3.0 * one.total_derivative()).abs() < 1e-15);
    }

    #[test]
    fn dispatch_reports_kind() {
        let c: Component = SpecifiedMassFlow::new(kgps(0.1)).unwrap().into();
        assert_eq!(c.type_name(), "specified mass flow");
        assert!(c.is_directional());
        assert!(c.is_flow_source());

        let c: Component = ConstantVolumeFan::new(m3ps(0.1)).unwrap().into();
        assert!(c.is_flow_source());
        let c: Component = SurfaceCrack::new(0.01, 0.65).unwrap().into();
        assert!(!c.is_directional());
    }
}
