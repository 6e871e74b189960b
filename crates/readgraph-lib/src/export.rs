//! Read-only graph export for external visualization
//!
//! Exporters receive a shared reference to the graph and never touch its
//! traversal state, so exporting before or after partitioning gives the
//! same output.

use crate::graph::ReadGraph;
use std::io::{self, Write};

/// A sink that serializes a read graph
pub trait GraphExport {
    /// Write `graph` to `out`
    fn export(&self, graph: &ReadGraph, out: &mut dyn Write) -> io::Result<()>;
}

/// Graph Modelling Language writer
///
/// Nodes are labeled with read names; edges carry their weight.
#[derive(Debug, Clone, Copy, Default)]
pub struct GmlExporter;

/// GML strings cannot contain a bare double quote
fn escape_gml(label: &str) -> String {
    label.replace('&', "&amp;").replace('"', "&quot;")
}

impl GraphExport for GmlExporter {
    fn export(&self, graph: &ReadGraph, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "graph [")?;
        writeln!(out, "  directed 0")?;
        for (node, read) in graph.reads().enumerate() {
            writeln!(out, "  node [")?;
            writeln!(out, "    id {node}")?;
            writeln!(out, "    label \"{}\"", escape_gml(&read.id))?;
            writeln!(out, "  ]")?;
        }
        for edge in graph.edges() {
            writeln!(out, "  edge [")?;
            writeln!(out, "    source {}", edge.a)?;
            writeln!(out, "    target {}", edge.b)?;
            writeln!(out, "    weight {}", edge.weight)?;
            writeln!(out, "  ]")?;
        }
        writeln!(out, "]")?;
        Ok(())
    }
}
