//! Structural and numerical properties of assembled and solved networks.

use afn_air::AirState;
use afn_components::{Component, Duct, SimpleOpening, SpecifiedMassFlow, SurfaceCrack};
use afn_core::NodeId;
use afn_core::units::{kgps, m, pa};
use afn_graph::{Network, NetworkBuilder};
use afn_solver::{MatrixForm, SolverConfig, SolverContext};
use nalgebra::DVector;
use proptest::prelude::*;

/// Two outdoor faces, three zones in a row and a ducted riser.
///
/// Zone 2 has no boundary neighbours.
struct Building {
    network: Network,
    components: Vec<Component>,
    windward: NodeId,
    leeward: NodeId,
    zones: [NodeId; 3],
}

fn building(coefficients: [f64; 3], exponents: [f64; 3]) -> Building {
    let mut b = NetworkBuilder::new();
    let windward = b.add_external_node("Windward", 0.0);
    let z1 = b.add_zone_node("Zone 1", 0.0);
    let z2 = b.add_zone_node("Zone 2", 0.0);
    let z3 = b.add_zone_node("Zone 3", 3.0);
    let leeward = b.add_external_node("Leeward", 0.0);
    let junction = b.add_duct_node("Junction", 3.0);

    let wall = b.add_component("Wall");
    let door = b.add_component("Door");
    let stair = b.add_component("Stair");
    let duct = b.add_component("Duct");

    b.add_link("W-Z1", windward, z1, wall);
    b.add_link("Z1-Z2", z1, z2, door);
    let stair_link = b.add_link("Z2-Z3", z2, z3, stair);
    b.set_link_heights(stair_link, [3.0, 0.0]);
    b.add_link("Z3-L", z3, leeward, wall);
    let riser = b.add_link("Z2-J", z2, junction, duct);
    b.set_link_heights(riser, [3.0, 0.0]);
    b.add_link("J-Z3", junction, z3, duct);
    let network = b.build().unwrap();

    let components = vec![
        SurfaceCrack::new(coefficients[0], exponents[0]).unwrap().into(),
        SurfaceCrack::new(coefficients[1], exponents[1]).unwrap().into(),
        SurfaceCrack::new(coefficients[2], exponents[2]).unwrap().into(),
        Duct::round(m(4.0), m(0.2), m(1e-4), 1.5).unwrap().into(),
    ];
    Building {
        network,
        components,
        windward,
        leeward,
        zones: [z1, z2, z3],
    }
}

fn context(b: &Building, config: SolverConfig, pw: f64, pl: f64) -> SolverContext {
    let mut ctx = SolverContext::new(b.network.clone(), b.components.clone(), config).unwrap();
    ctx.set_boundary_pressure(b.windward, pa(pw)).unwrap();
    ctx.set_boundary_pressure(b.leeward, pa(pl)).unwrap();
    ctx
}

fn default_building() -> Building {
    building([0.01, 0.05, 0.03], [0.65, 0.5, 0.6])
}

#[test]
fn jacobian_is_symmetric_with_zero_row_sums_inside() {
    let b = default_building();
    let config = SolverConfig {
        matrix_form: MatrixForm::Unsymmetric,
        ..SolverConfig::default()
    };
    let mut ctx = context(&b, config, 8.0, -4.0);
    ctx.set_node_air(b.zones[2], AirState::new(26.0, 0.008, 101_325.0).unwrap())
        .unwrap();
    ctx.solve();

    let assembly = ctx.assemble(false);
    let dense = assembly.matrix.to_dense();
    let n = dense.nrows();
    assert_eq!(n, 4);
    for i in 0..n {
        for j in 0..n {
            assert_eq!(dense[(i, j)], dense[(j, i)]);
        }
    }

    // Z1-Z2 is link 1; both ends unknown.
    let d = assembly.link_flows[1].total_derivative();
    assert_eq!(dense[(0, 1)], -d);

    // Zone 2 (equation 1) only touches unknown nodes.
    let row_sum: f64 = (0..n).map(|j| dense[(1, j)]).sum();
    assert!(row_sum.abs() <= 1e-12 * dense[(1, 1)].abs());

    // Zone 1 touches the windward boundary, so its row sum is positive.
    let row_sum: f64 = (0..n).map(|j| dense[(0, j)]).sum();
    assert!(row_sum > 0.0);
}

#[test]
fn resolve_from_converged_state_is_immediate() {
    let b = default_building();
    let mut ctx = context(&b, SolverConfig::default(), 12.0, -6.0);
    let first = ctx.solve();
    assert!(first.status.is_converged(), "{first:?}");

    let again = ctx.solve();
    assert!(again.status.is_converged());
    assert!(again.iterations <= 2);
}

#[test]
fn compressed_and_plain_skyline_agree() {
    // A zero-derivative supply between zone 1 and zone 3 leaves a zero at
    // the top of zone 3's column.
    let mut b = NetworkBuilder::new();
    let out = b.add_external_node("Out", 0.0);
    let z1 = b.add_zone_node("Z1", 0.0);
    let z2 = b.add_zone_node("Z2", 0.0);
    let z3 = b.add_zone_node("Z3", 0.0);
    let crack = b.add_component("Crack");
    let supply = b.add_component("Supply");
    b.add_link("Out-Z1", out, z1, crack);
    b.add_link("Z1-Z2", z1, z2, crack);
    b.add_link("Z2-Z3", z2, z3, crack);
    b.add_link("Z3-Out", z3, out, crack);
    b.add_link("Z1-Z3 supply", z1, z3, supply);
    let network = b.build().unwrap();
    let components: Vec<Component> = vec![
        SurfaceCrack::new(0.02, 0.6).unwrap().into(),
        SpecifiedMassFlow::new(kgps(0.05)).unwrap().into(),
    ];

    let mut pressures = Vec::new();
    for compress in [false, true] {
        let config = SolverConfig {
            compress_zero_columns: compress,
            ..SolverConfig::default()
        };
        let mut ctx = SolverContext::new(network.clone(), components.clone(), config).unwrap();
        let report = ctx.solve();
        assert!(report.status.is_converged(), "{report:?}");
        pressures.push(ctx.pressures().to_vec());
    }
    for (a, b) in pressures[0].iter().zip(&pressures[1]) {
        assert!((a - b).abs() < 1e-9, "{a} vs {b}");
    }
}

#[test]
fn skyline_correction_matches_dense_lu() {
    let b = default_building();
    let mut ctx = context(&b, SolverConfig::default(), 10.0, -3.0);
    let assembly = ctx.assemble(false).clone();

    let dense = assembly.matrix.to_dense();
    let rhs = DVector::from_column_slice(&assembly.residual);
    let expected = dense.lu().solve(&rhs).unwrap();

    let mut matrix = assembly.matrix.clone();
    let mut x = assembly.residual.clone();
    matrix.factor(1e-12).unwrap();
    matrix.solve(&mut x);
    for (a, e) in x.iter().zip(expected.iter()) {
        assert!((a - e).abs() <= 1e-9 * e.abs().max(1.0));
    }
}

#[test]
fn opening_network_converges_with_two_way_flow() {
    let mut b = NetworkBuilder::new();
    let out = b.add_external_node("Out", 0.0);
    let zone = b.add_zone_node("Zone", 0.0);
    let window = b.add_component("Window");
    let crack = b.add_component("Crack");
    let w = b.add_link("Window", out, zone, window);
    b.set_link_heights(w, [1.0, 1.0]);
    let c = b.add_link("Roof crack", zone, out, crack);
    b.set_link_heights(c, [3.0, 3.0]);
    let network = b.build().unwrap();

    let components: Vec<Component> = vec![
        SimpleOpening::new(m(1.0), m(2.0), 0.6, 0.001, 0.65, 0.0001)
            .unwrap()
            .into(),
        SurfaceCrack::new(0.005, 0.65).unwrap().into(),
    ];
    let mut ctx = SolverContext::new(network, components, SolverConfig::default()).unwrap();
    let outdoor = AirState::new(0.0, 0.002, 101_325.0).unwrap();
    ctx.set_node_air(out, outdoor).unwrap();
    ctx.set_ambient_density(outdoor.density()).unwrap();
    ctx.set_node_air(zone, AirState::new(22.0, 0.006, 101_325.0).unwrap())
        .unwrap();

    let report = ctx.solve();
    assert!(report.status.is_converged(), "{report:?}");
    let window_flow = *ctx.link_flow(w).unwrap();
    assert!(window_flow.forward > 0.0 && window_flow.reverse > 0.0);
    let crack_flow = ctx.link_flow(c).unwrap().net;
    let solution = ctx.solution().unwrap();
    let imbalance = solution.node_imbalance(ctx.network(), zone);
    let throughput = window_flow.forward + window_flow.reverse + crack_flow.abs();
    assert!(imbalance.abs() <= 1e-6 + 1e-4 * throughput);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn converged_solutions_conserve_mass(
        c1 in 1e-4f64..0.1,
        c2 in 1e-4f64..0.1,
        c3 in 1e-4f64..0.1,
        n1 in 0.5f64..1.0,
        n2 in 0.5f64..1.0,
        n3 in 0.5f64..1.0,
        pw in -50.0f64..50.0,
        pl in -50.0f64..50.0,
    ) {
        let b = building([c1, c2, c3], [n1, n2, n3]);
        let mut ctx = context(&b, SolverConfig::default(), pw, pl);
        let report = ctx.solve();
        prop_assert!(report.status.is_converged(), "{:?}", report);

        let solution = ctx.solution().unwrap();
        for node in b.zones {
            let imbalance = solution.node_imbalance(ctx.network(), node);
            let throughput: f64 = ctx
                .network()
                .node_links(node)
                .iter()
                .map(|l| solution.link_flow(*l).unwrap().net.abs())
                .sum();
            prop_assert!(imbalance.abs() <= 1e-6 + 1e-4 * throughput);
        }
    }
}
