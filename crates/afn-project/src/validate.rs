//! Project validation logic.
//!
//! Structural checks only: names, references and value sanity. Physical
//! parameter ranges are checked by the component constructors when the
//! network is built.

use std::collections::{HashMap, HashSet};

use crate::schema::{
    ComponentDef, ComponentKind, CpCurveKind, LinkDef, NodeDef, NodeKindDef, ProjectDef,
};

pub const LATEST_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate name: {name} in {context}")]
    DuplicateName { name: String, context: String },

    #[error("Missing reference: {name} in {context}")]
    MissingReference { name: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Project has no external node; at least one boundary is required")]
    NoBoundary,

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_project(project: &ProjectDef) -> Result<(), ValidationError> {
    if project.version == 0 || project.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    let curves = unique(project.cp_curves.iter().map(|c| &c.name), "cp_curves")?;
    for curve in &project.cp_curves {
        if let CpCurveKind::Table { points, .. } = &curve.kind {
            if points.len() < 2 {
                return Err(invalid(
                    format!("cp_curves.{}.points", curve.name),
                    points.len(),
                    "at least two points are required",
                ));
            }
        }
    }

    let nodes = unique(project.nodes.iter().map(|n| &n.name), "nodes")?;
    for node in &project.nodes {
        validate_node(node, &curves)?;
    }
    if !project
        .nodes
        .iter()
        .any(|n| n.kind == NodeKindDef::External)
    {
        return Err(ValidationError::NoBoundary);
    }

    let components = unique(project.components.iter().map(|c| &c.name), "components")?;
    for component in &project.components {
        validate_component(component)?;
    }
    let links = unique(project.links.iter().map(|l| &l.name), "links")?;
    for link in &project.links {
        validate_link(link, &nodes, &components)?;
    }

    if let Some(ctl) = &project.pressure_controller {
        let kinds: HashMap<&String, NodeKindDef> =
            project.nodes.iter().map(|n| (&n.name, n.kind)).collect();
        match kinds.get(&ctl.node) {
            None => return Err(missing(&ctl.node, "pressure_controller.node")),
            Some(NodeKindDef::External) => {
                return Err(invalid(
                    "pressure_controller.node",
                    &ctl.node,
                    "controlled node must not be external",
                ));
            }
            Some(_) => {}
        }
        if !links.contains(&ctl.link) {
            return Err(missing(&ctl.link, "pressure_controller.link"));
        }
        if !ctl.setpoint_pa.is_finite() {
            return Err(invalid(
                "pressure_controller.setpoint_pa",
                ctl.setpoint_pa,
                "must be finite",
            ));
        }
        if !(ctl.tolerance_pa.is_finite() && ctl.tolerance_pa > 0.0) {
            return Err(invalid(
                "pressure_controller.tolerance_pa",
                ctl.tolerance_pa,
                "must be finite and > 0",
            ));
        }
    }

    Ok(())
}

fn validate_node(node: &NodeDef, curves: &HashSet<&String>) -> Result<(), ValidationError> {
    if !node.elevation_m.is_finite() {
        return Err(invalid(
            format!("nodes.{}.elevation_m", node.name),
            node.elevation_m,
            "must be finite",
        ));
    }
    let external = node.kind == NodeKindDef::External;
    if let Some(p) = node.pressure_pa {
        if !external {
            return Err(invalid(
                format!("nodes.{}.pressure_pa", node.name),
                p,
                "only external nodes have a fixed pressure",
            ));
        }
        if !p.is_finite() {
            return Err(invalid(
                format!("nodes.{}.pressure_pa", node.name),
                p,
                "must be finite",
            ));
        }
    }
    if let Some(facade) = &node.facade {
        if !external {
            return Err(invalid(
                format!("nodes.{}.facade", node.name),
                &facade.cp_curve,
                "only external nodes face the wind",
            ));
        }
        if !curves.contains(&facade.cp_curve) {
            return Err(missing(
                &facade.cp_curve,
                &format!("nodes.{}.facade.cp_curve", node.name),
            ));
        }
    }
    if node.temperature_c.is_some_and(|t| !t.is_finite()) {
        return Err(invalid(
            format!("nodes.{}.temperature_c", node.name),
            format!("{:?}", node.temperature_c),
            "must be finite",
        ));
    }
    Ok(())
}

fn validate_link(
    link: &LinkDef,
    nodes: &HashSet<&String>,
    components: &HashSet<&String>,
) -> Result<(), ValidationError> {
    let context = format!("links.{}", link.name);
    if !nodes.contains(&link.from) {
        return Err(missing(&link.from, &format!("{context}.from")));
    }
    if !nodes.contains(&link.to) {
        return Err(missing(&link.to, &format!("{context}.to")));
    }
    if link.from == link.to {
        return Err(invalid(
            format!("{context}.to"),
            &link.to,
            "a link must join two different nodes",
        ));
    }
    if !components.contains(&link.component) {
        return Err(missing(&link.component, &format!("{context}.component")));
    }
    if !(link.multiplier.is_finite() && link.multiplier > 0.0) {
        return Err(invalid(
            format!("{context}.multiplier"),
            link.multiplier,
            "must be finite and > 0",
        ));
    }
    if link.heights_m.iter().any(|h| !h.is_finite()) {
        return Err(invalid(
            format!("{context}.heights_m"),
            format!("{:?}", link.heights_m),
            "must be finite",
        ));
    }
    if let Some(u) = link.control {
        if !(u.is_finite() && u >= 0.0) {
            return Err(invalid(format!("{context}.control"), u, "must be finite and >= 0"));
        }
    }
    Ok(())
}

fn unique<'a>(
    names: impl Iterator<Item = &'a String>,
    context: &str,
) -> Result<HashSet<&'a String>, ValidationError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ValidationError::DuplicateName {
                name: name.clone(),
                context: context.to_string(),
            });
        }
    }
    Ok(seen)
}

fn validate_component(component: &ComponentDef) -> Result<(), ValidationError> {
    match &component.kind {
        ComponentKind::SimpleOpening {
            min_density_difference,
            ..
        }
        | ComponentKind::DetailedOpening {
            min_density_difference,
            ..
        } if !(*min_density_difference > 0.0 && *min_density_difference <= 1.0) => {
            Err(invalid(
                format!("components.{}.min_density_difference", component.name),
                min_density_difference,
                "must be in (0, 1] kg/m3",
            ))
        }
        _ => Ok(()),
    }
}

fn missing(name: &str, context: &str) -> ValidationError {
    ValidationError::MissingReference {
        name: name.to_string(),
        context: context.to_string(),
    }
}

fn invalid(
    field: impl Into<String>,
    value: impl ToString,
    reason: &str,
) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
