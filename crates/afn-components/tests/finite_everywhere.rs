//! Every element returns finite flows and non-negative derivatives across
//! the pressure range a network solve can visit.

use afn_air::AirState;
use afn_components::*;
use afn_core::units::{kgps, m, m2, m3ps, pa};

fn all_components() -> Vec<Component> {
    let crack = || SurfaceCrack::new(0.002, 0.65).unwrap();
    vec![
        crack().into(),
        EffectiveLeakageArea::new(m2(0.005), 1.0, pa(4.0), 0.65)
            .unwrap()
            .into(),
        EffectiveLeakageRatio::new(0.05, m3ps(0.5), pa(75.0), 0.6)
            .unwrap()
            .into(),
        SimpleOpening::new(m(0.9), m(2.0), 0.6, 0.001, 0.65, 1e-4)
            .unwrap()
            .into(),
        DetailedOpening::new(
            m(1.2),
            m(1.4),
            vec![
                OpeningFactorPoint::new(0.0, 0.001, 0.0, 0.0, 0.0),
                OpeningFactorPoint::new(1.0, 0.65, 1.0, 1.0, 0.0),
            ],
            0.001,
            0.65,
        )
        .unwrap()
        .into(),
        HorizontalOpening::new(m(1.0), m(3.0), 35.0, 0.6, 0.001, 0.65)
            .unwrap()
            .into(),
        Duct::round(m(12.0), m(0.25), m(9e-5), 2.0).unwrap().into(),
        HeatExchanger::new(m(0.6), m(0.02)).unwrap().into(),
        Coil::new(m(0.3), m(0.5)).unwrap().into(),
        Damper::new(0.5, 0.001, 0.3, [0.0, 0.3, 0.0, 0.0], 0.55)
            .unwrap()
            .into(),
        DetailedFan::new(
            FanCurve::new([400.0, -100.0, -300.0, 0.0], m3ps(1.0)).unwrap(),
            crack(),
        )
        .into(),
        ConstantVolumeFan::new(m3ps(0.3)).unwrap().into(),
        ZoneExhaustFan::new(m3ps(0.05), crack()).unwrap().into(),
        ConstantPressureDrop::new(pa(30.0), kgps(0.4)).unwrap().into(),
        SpecifiedMassFlow::new(kgps(0.2)).unwrap().into(),
        SpecifiedVolumeFlow::new(m3ps(-0.1)).unwrap().into(),
    ]
}

#[test]
fn all_elements_finite_for_extreme_inputs() {
    let hot = AirState::new(45.0, 0.02, 101_325.0).unwrap();
    let cold = AirState::new(-30.0, 0.0003, 101_325.0).unwrap();
    let pressures = [
        -1.0e5, -2000.0, -50.0, -1.0, -1.0e-5, 0.0, 1.0e-9, 1.0e-4, 0.3, 7.0, 400.0, 1.0e5,
    ];
    let controls = [0.0, 0.01, 0.5, 1.0];

    for comp in all_components() {
        for &dp in &pressures {
            for &control in &controls {
                for linear in [false, true] {
                    for (from, to) in [(&hot, &cold), (&cold, &hot), (&hot, &hot)] {
                        let input = FlowInput::new(dp, from, to)
                            .with_control(control)
                            .with_linear(linear)
                            .with_multiplier(2.0);
                        let f = comp.calculate(&input);
                        assert!(
                            f.is_finite(),
                            "{} dp={dp} control={control} linear={linear}",
                            comp.type_name()
                        );
                        assert!(f.derivative.iter().all(|d| *d >= 0.0));
                        assert!(f.count == 1 || f.count == 2);
                    }
                }
            }
        }
    }
}

#[test]
fn pressure_driven_elements_have_positive_derivative_near_zero() {
    let air = AirState::standard();
    for comp in all_components() {
        if comp.is_flow_source() {
            continue;
        }
        let f = comp.calculate(&FlowInput::new(0.0, &air, &air));
        assert!(
            f.total_derivative() > 0.0,
            "{} has no conductance at zero pressure difference",
            comp.type_name()
        );
    }
}
