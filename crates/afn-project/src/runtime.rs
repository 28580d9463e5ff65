//! Compilation of a `ProjectDef` into a runnable airflow network.

use std::collections::HashMap;

use afn_components::{
    Coil, Component, ConstantPressureDrop, ConstantVolumeFan, Damper, DetailedFan,
    DetailedOpening, Duct, EffectiveLeakageArea, EffectiveLeakageRatio, FanCurve,
    HeatExchanger, HorizontalOpening, OpeningFactorPoint, SimpleOpening, SpecifiedMassFlow,
    SpecifiedVolumeFlow, SurfaceCrack, ZoneExhaustFan,
};
use afn_core::units::{degc, kgps, m, m2, m3ps, pa};
use afn_core::{LinkId, NodeId};
use afn_graph::NetworkBuilder;
use afn_sim::{
    AirflowNetwork, CpAngleBasis, CpCurve, FacadeWind, PressureController, SimulationOptions,
    WindProfile, ZoneConditions,
};
use afn_solver::{InitializationType, MatrixForm, SolveMode, SolverConfig, SolverContext};
use tracing::info;

use crate::schema::{
    ComponentKind, CpBasisDef, CpCurveDef, CpCurveKind, InitializationDef, MatrixFormDef,
    NodeKindDef, ProjectDef, SimulationDef, SolverDef, WindDef,
};
use crate::validate::validate_project;
use crate::{ProjectError, ProjectResult};

/// A compiled project with its name lookups.
#[derive(Debug)]
pub struct NetworkRuntime {
    pub network: AirflowNetwork,
    pub node_ids: HashMap<String, NodeId>,
    pub link_ids: HashMap<String, LinkId>,
}

impl NetworkRuntime {
    pub fn node(&self, name: &str) -> Option<NodeId> {
        self.node_ids.get(name).copied()
    }

    pub fn link(&self, name: &str) -> Option<LinkId> {
        self.link_ids.get(name).copied()
    }
}

/// Validate `project` and build its airflow network.
///
/// Zone nodes without a temperature start at 20 °C dry air. Facade pressures
/// are applied by the first `update_boundaries` call.
pub fn build_network(project: &ProjectDef) -> ProjectResult<NetworkRuntime> {
    validate_project(project)?;

    let mut builder = NetworkBuilder::new();
    let mut node_ids = HashMap::new();
    for node in &project.nodes {
        let id = match node.kind {
            NodeKindDef::Zone => builder.add_zone_node(&node.name, node.elevation_m),
            NodeKindDef::External => builder.add_external_node(&node.name, node.elevation_m),
            NodeKindDef::DuctJunction => builder.add_duct_node(&node.name, node.elevation_m),
        };
        node_ids.insert(node.name.clone(), id);
    }

    let mut comp_ids = HashMap::new();
    for component in &project.components {
        comp_ids.insert(component.name.clone(), builder.add_component(&component.name));
    }

    let mut link_ids = HashMap::new();
    for link in &project.links {
        let id = builder.add_link(
            &link.name,
            lookup(&node_ids, &link.from)?,
            lookup(&node_ids, &link.to)?,
            lookup(&comp_ids, &link.component)?,
        );
        builder.set_link_multiplier(id, link.multiplier);
        builder.set_link_heights(id, link.heights_m);
        link_ids.insert(link.name.clone(), id);
    }
    let graph = builder.build()?;

    let components = project
        .components
        .iter()
        .map(|c| {
            build_component(&c.kind).map_err(|e| ProjectError::Build {
                what: format!("component '{}': {e}", c.name),
            })
        })
        .collect::<ProjectResult<Vec<_>>>()?;

    let context = SolverContext::new(graph, components, solver_config(&project.solver))?;
    let mut network = AirflowNetwork::new(context, simulation_options(&project.simulation))?;
    network.set_wind_profile(wind_profile(&project.wind))?;

    let mut curve_ids = HashMap::new();
    for curve in &project.cp_curves {
        let index = network.add_cp_curve(build_cp_curve(curve)?);
        curve_ids.insert(curve.name.clone(), index);
    }

    for node in &project.nodes {
        let id = lookup(&node_ids, &node.name)?;
        if let Some(facade) = &node.facade {
            network.add_facade(FacadeWind {
                node: id,
                curve: lookup(&curve_ids, &facade.cp_curve)?,
                azimuth_deg: facade.azimuth_deg,
                height: facade.height_m.unwrap_or(node.elevation_m),
            })?;
        }
        if let Some(p) = node.pressure_pa {
            network.set_boundary_pressure(id, pa(p))?;
        }
        if node.kind != NodeKindDef::External {
            let conditions = ZoneConditions::new(
                degc(node.temperature_c.unwrap_or(20.0)),
                node.humidity_ratio.unwrap_or(0.0),
            );
            network.set_zone_conditions(id, &conditions)?;
        }
    }

    for link in &project.links {
        if let Some(control) = link.control {
            network.set_link_control(lookup(&link_ids, &link.name)?, control)?;
        }
    }

    if let Some(ctl) = &project.pressure_controller {
        let controller = PressureController::new(
            lookup(&node_ids, &ctl.node)?,
            lookup(&link_ids, &ctl.link)?,
            pa(ctl.setpoint_pa),
        )
        .with_tolerance(ctl.tolerance_pa);
        network.set_pressure_controller(controller)?;
    }

    info!(
        project = %project.name,
        nodes = node_ids.len(),
        links = link_ids.len(),
        "airflow network built"
    );
    Ok(NetworkRuntime {
        network,
        node_ids,
        link_ids,
    })
}

fn lookup<T: Copy>(map: &HashMap<String, T>, name: &str) -> ProjectResult<T> {
    map.get(name).copied().ok_or_else(|| ProjectError::Build {
        what: format!("unresolved name '{name}'"),
    })
}

pub fn solver_config(def: &SolverDef) -> SolverConfig {
    SolverConfig {
        max_iterations: def.max_iterations,
        relative_tolerance: def.relative_tolerance,
        absolute_tolerance: def.absolute_tolerance,
        convergence_acceleration_limit: def.convergence_acceleration_limit,
        max_pressure_change: def.max_pressure_change_pa,
        initialization: match def.initialization {
            InitializationDef::Linear => InitializationType::LinearInitialization,
            InitializationDef::ZeroPressures => InitializationType::ZeroNodePressures,
        },
        mode: if def.initialization_only {
            SolveMode::InitializationOnly
        } else {
            SolveMode::IterateToConvergence
        },
        matrix_form: match def.matrix_form {
            MatrixFormDef::Symmetric => MatrixForm::Symmetric,
            MatrixFormDef::Unsymmetric => MatrixForm::Unsymmetric,
        },
        compress_zero_columns: def.compress_zero_columns,
        ..SolverConfig::default()
    }
}

pub fn simulation_options(def: &SimulationDef) -> SimulationOptions {
    SimulationOptions {
        strict: def.strict,
        max_node_pressure: def.max_node_pressure_pa,
        max_link_flow: def.max_link_flow_kg_s,
        warning_limit: def.warning_limit,
    }
}

pub fn wind_profile(def: &WindDef) -> WindProfile {
    WindProfile {
        exponent: def.exponent,
        boundary_layer: def.boundary_layer_m,
        met_exponent: def.met_exponent,
        met_boundary_layer: def.met_boundary_layer_m,
        met_height: def.met_height_m,
    }
}

fn build_cp_curve(def: &CpCurveDef) -> ProjectResult<CpCurve> {
    let curve = match &def.kind {
        CpCurveKind::Table {
            points,
            symmetric,
            basis,
        } => {
            let basis = match basis {
                CpBasisDef::Absolute => CpAngleBasis::Absolute,
                CpBasisDef::Relative => CpAngleBasis::Relative,
            };
            CpCurve::new(&def.name, points, *symmetric, basis)?
        }
        CpCurveKind::LowRise { side_ratio } => CpCurve::low_rise(&def.name, *side_ratio)?,
        CpCurveKind::HighRise { side_ratio } => CpCurve::high_rise(&def.name, *side_ratio)?,
    };
    Ok(curve)
}

/// Construct the flow element described by `kind`.
pub fn build_component(kind: &ComponentKind) -> ProjectResult<Component> {
    let component: Component = match kind {
        ComponentKind::Crack {
            coefficient,
            exponent,
            reference,
        } => {
            let mut crack = SurfaceCrack::new(*coefficient, *exponent)?;
            if let Some(r) = reference {
                crack = crack.with_reference_conditions(
                    r.temperature_c,
                    r.pressure_pa,
                    r.humidity_ratio,
                )?;
            }
            crack.into()
        }
        ComponentKind::EffectiveLeakageArea {
            area_m2,
            discharge_coefficient,
            reference_pressure_pa,
            exponent,
        } => EffectiveLeakageArea::new(
            m2(*area_m2),
            *discharge_coefficient,
            pa(*reference_pressure_pa),
            *exponent,
        )?
        .into(),
        ComponentKind::EffectiveLeakageRatio {
            ratio,
            max_flow_m3_s,
            reference_pressure_pa,
            exponent,
        } => EffectiveLeakageRatio::new(
            *ratio,
            m3ps(*max_flow_m3_s),
            pa(*reference_pressure_pa),
            *exponent,
        )?
        .into(),
        ComponentKind::SimpleOpening {
            width_m,
            height_m,
            discharge_coefficient,
            closed_coefficient,
            closed_exponent,
            min_density_difference,
        } => SimpleOpening::new(
            m(*width_m),
            m(*height_m),
            *discharge_coefficient,
            *closed_coefficient,
            *closed_exponent,
            *min_density_difference,
        )?
        .into(),
        ComponentKind::DetailedOpening {
            width_m,
            height_m,
            points,
            closed_coefficient,
            closed_exponent,
            min_density_difference,
            extra_crack_length_m,
        } => {
            let points = points
                .iter()
                .map(|p| {
                    OpeningFactorPoint::new(
                        p.factor,
                        p.discharge_coefficient,
                        p.width_factor,
                        p.height_factor,
                        p.start_height_factor,
                    )
                })
                .collect();
            DetailedOpening::new(
                m(*width_m),
                m(*height_m),
                points,
                *closed_coefficient,
                *closed_exponent,
            )?
            .with_min_density_difference(*min_density_difference)?
            .with_extra_crack_length(m(*extra_crack_length_m))?
            .into()
        }
        ComponentKind::HorizontalOpening {
            width_m,
            depth_m,
            slope_deg,
            discharge_coefficient,
            closed_coefficient,
            closed_exponent,
        } => HorizontalOpening::new(
            m(*width_m),
            m(*depth_m),
            *slope_deg,
            *discharge_coefficient,
            *closed_coefficient,
            *closed_exponent,
        )?
        .into(),
        ComponentKind::Duct {
            length_m,
            diameter_m,
            area_m2,
            roughness_m,
            fitting_loss,
        } => {
            let duct = match area_m2 {
                Some(area) => Duct::new(
                    m(*length_m),
                    m(*diameter_m),
                    m2(*area),
                    m(*roughness_m),
                    *fitting_loss,
                )?,
                None => {
                    Duct::round(m(*length_m), m(*diameter_m), m(*roughness_m), *fitting_loss)?
                }
            };
            duct.into()
        }
        ComponentKind::HeatExchanger {
            length_m,
            diameter_m,
        } => HeatExchanger::new(m(*length_m), m(*diameter_m))?.into(),
        ComponentKind::Coil {
            length_m,
            diameter_m,
        } => Coil::new(m(*length_m), m(*diameter_m))?.into(),
        ComponentKind::Damper {
            laminar_threshold_pa,
            min_coefficient,
            max_coefficient,
            polynomial,
            exponent,
        } => Damper::new(
            *laminar_threshold_pa,
            *min_coefficient,
            *max_coefficient,
            *polynomial,
            *exponent,
        )?
        .into(),
        ComponentKind::DetailedFan {
            coefficients,
            free_delivery_m3_s,
            leakage_coefficient,
            leakage_exponent,
            reference_density,
        } => {
            let curve = FanCurve::new(*coefficients, m3ps(*free_delivery_m3_s))?;
            let leakage = SurfaceCrack::new(*leakage_coefficient, *leakage_exponent)?;
            let mut fan = DetailedFan::new(curve, leakage);
            if let Some(rho) = reference_density {
                fan = fan.with_reference_density(*rho)?;
            }
            fan.into()
        }
        ComponentKind::ConstantVolumeFan { flow_m3_s } => {
            ConstantVolumeFan::new(m3ps(*flow_m3_s))?.into()
        }
        ComponentKind::ZoneExhaustFan {
            flow_m3_s,
            closed_coefficient,
            closed_exponent,
        } => ZoneExhaustFan::new(
            m3ps(*flow_m3_s),
            SurfaceCrack::new(*closed_coefficient, *closed_exponent)?,
        )?
        .into(),
        ComponentKind::ConstantPressureDrop {
            pressure_drop_pa,
            design_flow_kg_s,
        } => ConstantPressureDrop::new(pa(*pressure_drop_pa), kgps(*design_flow_kg_s))?.into(),
        ComponentKind::SpecifiedMassFlow { flow_kg_s } => {
            SpecifiedMassFlow::new(kgps(*flow_kg_s))?.into()
        }
        ComponentKind::SpecifiedVolumeFlow { flow_m3_s } => {
            SpecifiedVolumeFlow::new(m3ps(*flow_m3_s))?.into()
        }
    };
    Ok(component)
}
