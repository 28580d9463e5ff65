//! Project schema definitions.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectDef {
    #[serde(default = "default_version")]
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub solver: SolverDef,
    #[serde(default)]
    pub simulation: SimulationDef,
    #[serde(default)]
    pub wind: WindDef,
    #[serde(default)]
    pub cp_curves: Vec<CpCurveDef>,
    #[serde(default)]
    pub nodes: Vec<NodeDef>,
    #[serde(default)]
    pub components: Vec<ComponentDef>,
    #[serde(default)]
    pub links: Vec<LinkDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure_controller: Option<PressureControllerDef>,
}

fn default_version() -> u32 {
    crate::validate::LATEST_VERSION
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SolverDef {
    pub max_iterations: usize,
    pub relative_tolerance: f64,
    pub absolute_tolerance: f64,
    pub convergence_acceleration_limit: f64,
    pub max_pressure_change_pa: f64,
    pub initialization: InitializationDef,
    /// Stop after the laminar initialization pass.
    pub initialization_only: bool,
    pub matrix_form: MatrixFormDef,
    pub compress_zero_columns: bool,
}

impl Default for SolverDef {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            relative_tolerance: 1e-4,
            absolute_tolerance: 1e-6,
            convergence_acceleration_limit: -0.5,
            max_pressure_change_pa: 500.0,
            initialization: InitializationDef::Linear,
            initialization_only: false,
            matrix_form: MatrixFormDef::Symmetric,
            compress_zero_columns: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InitializationDef {
    Linear,
    ZeroPressures,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatrixFormDef {
    Symmetric,
    Unsymmetric,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationDef {
    pub strict: bool,
    pub max_node_pressure_pa: f64,
    pub max_link_flow_kg_s: f64,
    pub warning_limit: usize,
}

impl Default for SimulationDef {
    fn default() -> Self {
        Self {
            strict: false,
            max_node_pressure_pa: 1.0e4,
            max_link_flow_kg_s: 100.0,
            warning_limit: 5,
        }
    }
}

/// Site and weather station boundary layers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindDef {
    pub exponent: f64,
    pub boundary_layer_m: f64,
    pub met_exponent: f64,
    pub met_boundary_layer_m: f64,
    pub met_height_m: f64,
}

impl Default for WindDef {
    fn default() -> Self {
        Self {
            exponent: 0.14,
            boundary_layer_m: 270.0,
            met_exponent: 0.14,
            met_boundary_layer_m: 270.0,
            met_height_m: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CpCurveDef {
    pub name: String,
    pub kind: CpCurveKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CpCurveKind {
    /// Tabulated `(angle_deg, cp)` points.
    Table {
        points: Vec<(f64, f64)>,
        #[serde(default)]
        symmetric: bool,
        #[serde(default)]
        basis: CpBasisDef,
    },
    /// Generated low-rise curve from the facade side ratio.
    LowRise { side_ratio: f64 },
    /// Generated tall-building curve from the facade side ratio.
    HighRise { side_ratio: f64 },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CpBasisDef {
    Absolute,
    #[default]
    Relative,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeDef {
    pub name: String,
    pub kind: NodeKindDef,
    #[serde(default)]
    pub elevation_m: f64,
    /// Zone air temperature until a collaborator sets it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity_ratio: Option<f64>,
    /// Fixed pressure of an external node without wind exposure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure_pa: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facade: Option<FacadeDef>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NodeKindDef {
    Zone,
    External,
    DuctJunction,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FacadeDef {
    pub cp_curve: String,
    pub azimuth_deg: f64,
    /// Height for the local wind speed; the node elevation when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_m: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentDef {
    pub name: String,
    pub kind: ComponentKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ComponentKind {
    Crack {
        coefficient: f64,
        exponent: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reference: Option<ReferenceConditionsDef>,
    },
    EffectiveLeakageArea {
        area_m2: f64,
        discharge_coefficient: f64,
        reference_pressure_pa: f64,
        exponent: f64,
    },
    EffectiveLeakageRatio {
        ratio: f64,
        max_flow_m3_s: f64,
        reference_pressure_pa: f64,
        exponent: f64,
    },
    SimpleOpening {
        width_m: f64,
        height_m: f64,
        discharge_coefficient: f64,
        closed_coefficient: f64,
        closed_exponent: f64,
        #[serde(default = "default_min_density_difference")]
        min_density_difference: f64,
    },
    DetailedOpening {
        width_m: f64,
        height_m: f64,
        points: Vec<OpeningFactorDef>,
        closed_coefficient: f64,
        closed_exponent: f64,
        #[serde(default = "default_min_density_difference")]
        min_density_difference: f64,
        #[serde(default)]
        extra_crack_length_m: f64,
    },
    HorizontalOpening {
        width_m: f64,
        depth_m: f64,
        #[serde(default = "default_slope")]
        slope_deg: f64,
        discharge_coefficient: f64,
        closed_coefficient: f64,
        closed_exponent: f64,
    },
    Duct {
        length_m: f64,
        diameter_m: f64,
        /// Cross section for non-round ducts; round when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        area_m2: Option<f64>,
        roughness_m: f64,
        #[serde(default)]
        fitting_loss: f64,
    },
    HeatExchanger {
        length_m: f64,
        diameter_m: f64,
    },
    Coil {
        length_m: f64,
        diameter_m: f64,
    },
    Damper {
        laminar_threshold_pa: f64,
        min_coefficient: f64,
        max_coefficient: f64,
        polynomial: [f64; 4],
        exponent: f64,
    },
    DetailedFan {
        /// Pressure rise polynomial in volume flow.
        coefficients: [f64; 4],
        free_delivery_m3_s: f64,
        leakage_coefficient: f64,
        leakage_exponent: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reference_density: Option<f64>,
    },
    ConstantVolumeFan {
        flow_m3_s: f64,
    },
    ZoneExhaustFan {
        flow_m3_s: f64,
        closed_coefficient: f64,
        closed_exponent: f64,
    },
    ConstantPressureDrop {
        pressure_drop_pa: f64,
        design_flow_kg_s: f64,
    },
    SpecifiedMassFlow {
        flow_kg_s: f64,
    },
    SpecifiedVolumeFlow {
        flow_m3_s: f64,
    },
}

fn default_min_density_difference() -> f64 {
    1e-4
}

fn default_slope() -> f64 {
    90.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceConditionsDef {
    pub temperature_c: f64,
    pub pressure_pa: f64,
    pub humidity_ratio: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct OpeningFactorDef {
    pub factor: f64,
    pub discharge_coefficient: f64,
    pub width_factor: f64,
    pub height_factor: f64,
    #[serde(default)]
    pub start_height_factor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkDef {
    pub name: String,
    pub from: String,
    pub to: String,
    pub component: String,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Connection heights relative to the from and to node elevations.
    #[serde(default)]
    pub heights_m: [f64; 2],
    /// Initial control signal; 1 when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control: Option<f64>,
}

fn default_multiplier() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PressureControllerDef {
    pub node: String,
    pub link: String,
    pub setpoint_pa: f64,
    #[serde(default = "default_controller_tolerance")]
    pub tolerance_pa: f64,
}

fn default_controller_tolerance() -> f64 {
    0.01
}
