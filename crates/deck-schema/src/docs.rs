//! # Reference Documentation
//!
//! Renders a schema as Markdown: one section per table, listing the
//! table's leaf children with their type, required flag, default,
//! constraint, and description. Struct array elements appear as `name.*`.

use std::fmt;

use crate::deck::Deck;
use crate::table::Table;
use crate::view::NodeRef;

/// Markdown rendering of a schema tree.
pub struct SchemaDocs<'a> {
    root: &'a Table,
}

impl<'a> SchemaDocs<'a> {
    pub fn new(root: &'a Table) -> Self {
        Self { root }
    }
}

impl Deck {
    /// Markdown reference for the declared schema, or `None` when
    /// documentation was disabled at construction.
    pub fn write_docs(&self) -> Option<String> {
        self.options()
            .docs_enabled
            .then(|| SchemaDocs::new(self.schema()).to_string())
    }
}

impl fmt::Display for SchemaDocs<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Configuration Reference")?;
        section(f, self.root, "")
    }
}

fn section(f: &mut fmt::Formatter<'_>, table: &Table, display: &str) -> fmt::Result {
    let has_leaves = table
        .children()
        .any(|(_, node)| !matches!(node, NodeRef::Table(_)));

    if !display.is_empty() || has_leaves {
        writeln!(f)?;
        let heading = if display.is_empty() { "(root)" } else { display };
        let kind = if table.is_struct_array() { " (struct array)" } else { "" };
        writeln!(f, "## `{heading}`{kind}")?;
        if table.is_required() && !display.is_empty() {
            writeln!(f, "\nRequired.")?;
        }
        if let Some(description) = table.description() {
            writeln!(f, "\n{}", description)?;
        }
    }

    if has_leaves {
        writeln!(f)?;
        writeln!(f, "| Key | Type | Required | Default | Constraint | Description |")?;
        writeln!(f, "|-----|------|----------|---------|------------|-------------|")?;
        for (segment, node) in table.children() {
            let (ty, required, default, constraint, description) = match node {
                NodeRef::Field(field) | NodeRef::Entry(field) => (
                    if field.is_array() {
                        format!("{}[]", field.value_type())
                    } else {
                        field.value_type().to_string()
                    },
                    field.is_required(),
                    field.default_value().map(|v| v.to_string()),
                    field.constraint().map(|c| c.to_string()),
                    field.description(),
                ),
                NodeRef::Function(binding) => (
                    format!("function {}", binding.signature()),
                    binding.is_required(),
                    None,
                    None,
                    binding.description(),
                ),
                NodeRef::Table(_) | NodeRef::Element(_) => continue,
            };
            writeln!(
                f,
                "| `{segment}` | {ty} | {} | {} | {} | {} |",
                if required { "yes" } else { "no" },
                cell(default.as_deref()),
                cell(constraint.as_deref()),
                cell(description),
            )?;
        }
    }

    for (segment, node) in table.children() {
        if let NodeRef::Table(child) = node {
            let mut name = if display.is_empty() {
                segment.to_string()
            } else {
                format!("{display}.{segment}")
            };
            if child.is_struct_array() {
                name.push_str(".*");
            }
            section(f, child, &name)?;
        }
    }
    Ok(())
}

fn cell(text: Option<&str>) -> String {
    match text {
        Some(t) if !t.is_empty() => t.replace('|', "\\|"),
        _ => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use deck_core::{FunctionType, ValueType};
    use deck_document::DocumentReader;

    use super::*;
    use crate::options::DeckOptions;

    fn schema(options: DeckOptions) -> Deck {
        let mut deck = Deck::with_options(DocumentReader::parse_str("").unwrap(), options);
        deck.add_double("solver.dt", "time step | seconds")
            .unwrap()
            .add_range(0.0, 1.0)
            .unwrap();
        deck.add_string("solver.kind", "").unwrap().required(true);
        deck.add_array("mesh.cells", ValueType::Integer, "cells per axis").unwrap();
        let bcs = deck.add_struct_array("bcs", "boundary conditions").unwrap();
        bcs.add_string("kind", "").unwrap().add_discrete_set(["dirichlet", "neumann"]).unwrap();
        bcs.add_function("value", FunctionType::Double, [FunctionType::Vec3D], "").unwrap();
        deck
    }

    #[test]
    fn renders_every_table() {
        let docs = schema(DeckOptions::default()).write_docs().unwrap();
        assert!(docs.starts_with("# Configuration Reference"));
        assert!(docs.contains("## `solver`"));
        assert!(docs.contains("## `bcs.*` (struct array)"));
        assert!(docs.contains("| `dt` | double | no | - | [0, 1] | time step \\| seconds |"));
        assert!(docs.contains("| `kind` | string | yes | - | - | - |"));
        assert!(docs.contains("| `cells` | integer[] |"));
        assert!(docs.contains(r#"{"dirichlet", "neumann"}"#));
        assert!(docs.contains("function double(vec3d)"));
        assert!(docs.contains("boundary conditions"));
    }

    #[test]
    fn disabled_docs_produce_nothing() {
        let deck = schema(DeckOptions { docs_enabled: false });
        assert!(deck.write_docs().is_none());
    }
}
