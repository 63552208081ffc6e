//! GraphML exporter

use crate::graph::CitationGraph;
use crate::output::traits::{escape_xml, GraphExporter, OutputError, OutputResult};
use crate::output::{node_attributes, AttributeKind, NODE_ATTRIBUTES};
use std::fmt::Write;

/// Writes `<prefix>.graphml`
#[derive(Debug, Default, Clone, Copy)]
pub struct GraphmlExporter;

impl GraphExporter for GraphmlExporter {
    fn extension(&self) -> &'static str {
        "graphml"
    }

    fn render(&self, graph: &CitationGraph) -> OutputResult<String> {
        let mut out = String::new();
        render_into(&mut out, graph)
            .map_err(|e| OutputError::Format(format!("GraphML rendering failed: {}", e)))?;
        Ok(out)
    }
}

fn render_into(out: &mut String, graph: &CitationGraph) -> std::fmt::Result {
    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        out,
        r#"<graphml xmlns="http://graphml.graphdrawing.org/xmlns" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://graphml.graphdrawing.org/xmlns http://graphml.graphdrawing.org/xmlns/1.0/graphml.xsd">"#
    )?;

    writeln!(out, r#"  <key id="label" for="node" attr.name="label" attr.type="string"/>"#)?;
    for (name, kind) in NODE_ATTRIBUTES {
        let attr_type = match kind {
            AttributeKind::Text => "string",
            AttributeKind::Integer => "long",
        };
        writeln!(
            out,
            r#"  <key id="{0}" for="node" attr.name="{0}" attr.type="{1}"/>"#,
            name, attr_type
        )?;
    }

    writeln!(out, r#"  <graph id="citations" edgedefault="directed">"#)?;
    for node in graph.nodes() {
        writeln!(out, r#"    <node id="{}">"#, escape_xml(&node.id))?;
        writeln!(out, r#"      <data key="label">{}</data>"#, escape_xml(&node.label))?;
        for ((name, _), value) in NODE_ATTRIBUTES.iter().zip(node_attributes(node)) {
            if let Some(value) = value {
                writeln!(out, r#"      <data key="{}">{}</data>"#, name, escape_xml(&value))?;
            }
        }
        writeln!(out, "    </node>")?;
    }
    for (from, to) in graph.edge_ids() {
        writeln!(
            out,
            r#"    <edge source="{}" target="{}"/>"#,
            escape_xml(from),
            escape_xml(to)
        )?;
    }
    writeln!(out, "  </graph>")?;
    writeln!(out, "</graphml>")
}
