//! Identifier assignment and `.mse` (FAMIX-style nested S-expression)
//! serialization.
//!
//! Ids are assigned once, here, in `creation_order` -- the order entities
//! were first produced by the definition collector -- so output is
//! deterministic across runs on unchanged input. Relations that reference an
//! entity the collector never created (an unresolved name that slipped
//! through, or a retained relation from an earlier fixpoint pass whose
//! target later disappeared) are dropped rather than written with a
//! dangling id, and a warning is logged for each drop.

use std::collections::HashMap;
use std::io::{self, Write};

use crate::model::{Access, Code, Data, EntityId, Grouping, Model};
use crate::symbol_table::EntityRef;

/// Assign a dense, 1-based numeric id to every entity in `creation_order`
/// and return the `uniqueName -> id` map the relation writers need.
pub fn assign_ids(model: &mut Model) -> HashMap<String, EntityId> {
    let mut id_map = HashMap::with_capacity(model.creation_order.len());
    let mut next_id: EntityId = 1;

    for entity_ref in model.creation_order.clone() {
        let unique_name = match entity_ref {
            EntityRef::Grouping(i) => {
                model.groupings[i].id = Some(next_id);
                model.groupings[i].unique_name.clone()
            }
            EntityRef::Code(i) => {
                model.codes[i].id = Some(next_id);
                model.codes[i].unique_name.clone()
            }
            EntityRef::Data(i) => {
                model.datas[i].id = Some(next_id);
                model.datas[i].unique_name.clone()
            }
        };
        id_map.insert(unique_name, next_id);
        next_id += 1;
    }

    id_map
}

/// Write the full `.mse` document: every entity in creation order, then
/// `ParentChild`, `Call`, and `Access` relations with dangling references
/// dropped.
pub fn write_mse<W: Write>(
    model: &Model,
    id_map: &HashMap<String, EntityId>,
    out: &mut W,
) -> io::Result<()> {
    writeln!(out, "(")?;

    for entity_ref in &model.creation_order {
        match *entity_ref {
            EntityRef::Grouping(i) => write_grouping(&model.groupings[i], out)?,
            EntityRef::Code(i) => write_code(&model.codes[i], out)?,
            EntityRef::Data(i) => write_data(&model.datas[i], out)?,
        }
    }

    for pc in &model.parent_child {
        let Some(&child_id) = id_map.get(&pc.child) else {
            tracing::warn!(child = %pc.child, "dropping ParentChild with dangling child reference");
            continue;
        };
        let parent_id = match &pc.parent {
            Some(p) => match id_map.get(p) {
                Some(&id) => Some(id),
                None => {
                    tracing::warn!(parent = %p, "dropping ParentChild with dangling parent reference");
                    continue;
                }
            },
            None => None,
        };
        write_parent_child(parent_id, child_id, pc.is_main, out)?;
    }

    for call in &model.calls {
        let (Some(&caller_id), Some(&called_id)) =
            (id_map.get(&call.caller), id_map.get(&call.called))
        else {
            tracing::warn!(
                caller = %call.caller,
                called = %call.called,
                "dropping Call with dangling reference"
            );
            continue;
        };
        write_call(caller_id, called_id, out)?;
    }

    for access in &model.accesses {
        let (Some(&accessor_id), Some(&accessed_id)) =
            (id_map.get(&access.accessor), id_map.get(&access.accessed))
        else {
            tracing::warn!(
                accessor = %access.accessor,
                accessed = %access.accessed,
                "dropping Access with dangling reference"
            );
            continue;
        };
        write_access(accessor_id, accessed_id, access, out)?;
    }

    writeln!(out, ")")?;
    Ok(())
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn write_grouping<W: Write>(g: &Grouping, out: &mut W) -> io::Result<()> {
    writeln!(out, "  (SOMIX.Grouping")?;
    writeln!(out, "    (id: {})", g.id.expect("id assigned before write"))?;
    writeln!(out, "    (name {})", quote(&g.name))?;
    writeln!(out, "    (uniqueName {})", quote(&g.unique_name))?;
    writeln!(
        out,
        "    (technicalType {})",
        quote(g.technical_type.as_str())
    )?;
    if let Some(link) = &g.link_to_editor {
        writeln!(out, "    (linkToEditor {})", quote(link))?;
    }
    writeln!(out, "  )")
}

fn write_code<W: Write>(c: &Code, out: &mut W) -> io::Result<()> {
    writeln!(out, "  (SOMIX.Code")?;
    writeln!(out, "    (id: {})", c.id.expect("id assigned before write"))?;
    writeln!(out, "    (name {})", quote(&c.name))?;
    writeln!(out, "    (uniqueName {})", quote(&c.unique_name))?;
    writeln!(
        out,
        "    (technicalType {})",
        quote(c.technical_type.as_str())
    )?;
    if let Some(link) = &c.link_to_editor {
        writeln!(out, "    (linkToEditor {})", quote(link))?;
    }
    writeln!(out, "  )")
}

fn write_data<W: Write>(d: &Data, out: &mut W) -> io::Result<()> {
    writeln!(out, "  (SOMIX.Data")?;
    writeln!(out, "    (id: {})", d.id.expect("id assigned before write"))?;
    writeln!(out, "    (name {})", quote(&d.name))?;
    writeln!(out, "    (uniqueName {})", quote(&d.unique_name))?;
    writeln!(out, "    (technicalType {})", quote("PythonVariable"))?;
    if let Some(link) = &d.link_to_editor {
        writeln!(out, "    (linkToEditor {})", quote(link))?;
    }
    writeln!(out, "  )")
}

fn write_parent_child<W: Write>(
    parent_id: Option<EntityId>,
    child_id: EntityId,
    is_main: bool,
    out: &mut W,
) -> io::Result<()> {
    writeln!(out, "  (SOMIX.ParentChild")?;
    if let Some(p) = parent_id {
        writeln!(out, "    (parent (ref: {p}))")?;
    }
    writeln!(out, "    (child (ref: {child_id}))")?;
    writeln!(out, "    (isMain {is_main})")?;
    writeln!(out, "  )")
}

fn write_call<W: Write>(caller_id: EntityId, called_id: EntityId, out: &mut W) -> io::Result<()> {
    writeln!(out, "  (SOMIX.Call")?;
    writeln!(out, "    (caller (ref: {caller_id}))")?;
    writeln!(out, "    (called (ref: {called_id}))")?;
    writeln!(out, "  )")
}

fn write_access<W: Write>(
    accessor_id: EntityId,
    accessed_id: EntityId,
    access: &Access,
    out: &mut W,
) -> io::Result<()> {
    writeln!(out, "  (SOMIX.Access")?;
    writeln!(out, "    (accessor (ref: {accessor_id}))")?;
    writeln!(out, "    (accessed (ref: {accessed_id}))")?;
    writeln!(out, "    (isRead {})", access.is_read)?;
    writeln!(out, "    (isWrite {})", access.is_write)?;
    writeln!(out, "    (isDependent {})", access.is_dependent)?;
    writeln!(out, "  )")
}
