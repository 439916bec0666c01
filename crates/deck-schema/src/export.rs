//! # Mirror Export
//!
//! Copies every resolved value of a deck into a [`Mirror`], laid out by
//! concrete path. Tables and struct array elements become groups, scalar
//! fields become views (defaults included), and scalar arrays become
//! groups of per-index views. Function bindings have no stored form and
//! are skipped, as is anything absent from the document.
//!
//! Export is meant to follow a passing [`Deck::verify`]; values of the
//! wrong type are left out rather than reported.

use deck_core::{DeckResult, KeyPath, Mirror};

use crate::deck::Deck;
use crate::field::Field;
use crate::table::Table;
use crate::view::{Context, NodeRef};

impl Deck {
    /// Write every resolved value into `mirror`.
    ///
    /// # Errors
    ///
    /// Whatever the mirror returns when it cannot store a node.
    pub fn mirror_into(&self, mirror: &mut dyn Mirror) -> DeckResult<()> {
        let mut exporter = Exporter {
            ctx: self.context(),
            mirror,
            written: 0,
        };
        exporter.table(self.schema(), &KeyPath::root())?;
        tracing::info!(values = exporter.written, "mirrored deck");
        Ok(())
    }
}

struct Exporter<'a, 'm> {
    ctx: Context<'a>,
    mirror: &'m mut dyn Mirror,
    written: usize,
}

impl Exporter<'_, '_> {
    fn table(&mut self, table: &Table, path: &KeyPath) -> DeckResult<()> {
        if !path.is_root() && !self.ctx.reader.contains(path) {
            return Ok(());
        }
        if !table.is_struct_array() {
            if !path.is_root() {
                self.mirror.create_group(path)?;
            }
            return self.body(table, path);
        }

        self.mirror.create_group(path)?;
        for i in self.ctx.reader.get_indices(path).unwrap_or_default() {
            let element = path.child(i);
            self.mirror.create_group(&element)?;
            self.body(table, &element)?;
        }
        Ok(())
    }

    fn body(&mut self, table: &Table, path: &KeyPath) -> DeckResult<()> {
        for (segment, node) in table.children() {
            let child = path.child(segment.clone());
            match node {
                NodeRef::Table(t) | NodeRef::Element(t) => self.table(t, &child)?,
                NodeRef::Field(f) | NodeRef::Entry(f) if f.is_array() => self.array(f, &child)?,
                NodeRef::Field(f) | NodeRef::Entry(f) => {
                    if let Some(value) = f.resolve(self.ctx.reader, &child) {
                        self.mirror.create_view(&child, value)?;
                        self.written += 1;
                    }
                }
                NodeRef::Function(_) => {}
            }
        }
        Ok(())
    }

    fn array(&mut self, field: &Field, path: &KeyPath) -> DeckResult<()> {
        let Some((accepted, _)) = field.resolve_array(self.ctx.reader, path) else {
            return Ok(());
        };
        self.mirror.create_group(path)?;
        for (i, value) in accepted {
            self.mirror.create_view(&path.child(i), value)?;
            self.written += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use deck_core::{Arity, FunctionType, TreeStore, Value, ValueType};
    use deck_document::DocumentReader;
    use serde_json::json;

    use super::*;

    #[test]
    fn mirrors_resolved_values() {
        let mut reader =
            DocumentReader::parse_str("solver: {dt: 0.5}\nxs: [1, 2]\nbcs: {3: {v: 1}}").unwrap();
        reader
            .define_function("f", Arity::Fixed(1), |a| Ok(a.to_vec()))
            .unwrap();
        let mut deck = Deck::new(reader);
        deck.add_double("solver.dt", "").unwrap();
        deck.add_int("solver.n", "").unwrap().add_default(8).unwrap();
        deck.add_string("solver.label", "").unwrap();
        deck.add_array("xs", ValueType::Integer, "").unwrap();
        deck.add_struct_array("bcs", "").unwrap().add_double("v", "").unwrap();
        deck.add_table("absent", "").unwrap().add_int("k", "").unwrap();
        deck.add_function("f", FunctionType::Double, [FunctionType::Double], "").unwrap();

        let mut store = TreeStore::new();
        deck.mirror_into(&mut store).unwrap();
        assert_eq!(
            store.to_json(),
            json!({
                "solver": {"dt": 0.5, "n": 8},
                "xs": {"0": 1, "1": 2},
                "bcs": {"3": {"v": 1.0}},
            })
        );
        assert_eq!(
            store.view(&KeyPath::parse("solver.n").unwrap()),
            Some(&Value::Integer(8))
        );
    }
}
