//! Hydrostatic (stack) pressure across links.
//!
//! Node pressures are gauge pressures at the node elevation relative to an
//! outdoor column of density `ρo`. A link whose two sides hold air of the
//! same density as outdoors sees no stack pressure.

use afn_air::AirState;
use afn_core::NodeId;
use afn_core::constants::G0_MPS2;
use afn_graph::{Link, Network};

/// Stack pressure added to `P1 - P2` for one link [Pa].
///
/// `stack = -ρo g (z1 - z2) - g (ρ1 h1 - ρ2 h2)` with node elevations `z`,
/// connection heights `h` relative to each node and node densities `ρ`.
pub fn stack_pressure(
    elevations: [f64; 2],
    heights: [f64; 2],
    densities: [f64; 2],
    ambient_density: f64,
) -> f64 {
    -ambient_density * G0_MPS2 * (elevations[0] - elevations[1])
        - G0_MPS2 * (densities[0] * heights[0] - densities[1] * heights[1])
}

/// Stack pressure of `link` using the node table and per-node air states.
pub fn link_stack_pressure(
    network: &Network,
    link: &Link,
    air: &[AirState],
    ambient_density: f64,
) -> f64 {
    let [a, b] = link.nodes;
    let elevation = |id: NodeId| network.node(id).map_or(0.0, |n| n.elevation);
    let density = |id: NodeId| {
        air.get(id.index())
            .map_or(ambient_density, |s| s.density())
    };
    stack_pressure(
        [elevation(a), elevation(b)],
        link.heights,
        [density(a), density(b)],
        ambient_density,
    )
}

/// Fill `out[link]` with the stack pressure of every link.
pub fn compute_stack(network: &Network, air: &[AirState], ambient_density: f64, out: &mut [f64]) {
    for (slot, link) in out.iter_mut().zip(network.links()) {
        *slot = link_stack_pressure(network, link, air, ambient_density);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use afn_graph::NetworkBuilder;

    #[test]
    fn isothermal_column_has_no_stack() {
        // Floor 1 at 0 m and floor 2 at 3 m, joined by a stair opening at 3 m.
        let rho = 1.2;
        let dp = stack_pressure([0.0, 3.0], [3.0, 0.0], [rho, rho], rho);
        assert!(dp.abs() < 1e-12);
    }

    #[test]
    fn warm_zone_pushes_out_at_the_top() {
        // Wall opening 5 m above a warm zone at ground level, outdoors cold.
        let warm = AirState::new(25.0, 0.0, 101_325.0).unwrap();
        let cold = AirState::new(0.0, 0.0, 101_325.0).unwrap();
        let dp = stack_pressure(
            [0.0, 0.0],
            [5.0, 5.0],
            [warm.density(), cold.density()],
            cold.density(),
        );
        // Zone minus outdoor at the opening is positive for equal node pressures.
        assert!(dp > 0.0);
        let expected = G0_MPS2 * 5.0 * (cold.density() - warm.density());
        assert!((dp - expected).abs() < 1e-12);
    }

    #[test]
    fn fills_every_link() {
        let mut b = NetworkBuilder::new();
        let out = b.add_external_node("Out", 0.0);
        let up = b.add_zone_node("Up", 4.0);
        let c = b.add_component("Crack");
        let l = b.add_link("L", out, up, c);
        b.set_link_heights(l, [5.0, 1.0]);
        let net = b.build().unwrap();

        let air = vec![AirState::standard(); 2];
        let rho = air[0].density();
        let mut stack = vec![f64::NAN; 1];
        compute_stack(&net, &air, rho, &mut stack);
        // Both ends at 5 m absolute with uniform density.
        assert!(stack[0].abs() < 1e-12);
    }
}
