//! GEXF 1.2 exporter

use crate::graph::CitationGraph;
use crate::output::traits::{escape_xml, GraphExporter, OutputError, OutputResult};
use crate::output::{node_attributes, AttributeKind, NODE_ATTRIBUTES};
use std::fmt::Write;

/// Writes `<prefix>.gexf` for Gephi and similar tools
#[derive(Debug, Default, Clone, Copy)]
pub struct GexfExporter;

impl GexfExporter {
    fn attribute_type(kind: AttributeKind) -> &'static str {
        match kind {
            AttributeKind::Text => "string",
            AttributeKind::Integer => "long",
        }
    }
}

impl GraphExporter for GexfExporter {
    fn extension(&self) -> &'static str {
        "gexf"
    }

    fn render(&self, graph: &CitationGraph) -> OutputResult<String> {
        let mut out = String::new();
        render_into(&mut out, graph)
            .map_err(|e| OutputError::Format(format!("GEXF rendering failed: {}", e)))?;
        Ok(out)
    }
}

fn render_into(out: &mut String, graph: &CitationGraph) -> std::fmt::Result {
    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        out,
        r#"<gexf xmlns="http://www.gexf.net/1.2draft" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://www.gexf.net/1.2draft http://www.gexf.net/1.2draft/gexf.xsd" version="1.2">"#
    )?;
    writeln!(
        out,
        r#"  <meta lastmodifieddate="{}">"#,
        chrono::Utc::now().format("%Y-%m-%d")
    )?;
    writeln!(out, "    <creator>cite-ripple {}</creator>", env!("CARGO_PKG_VERSION"))?;
    writeln!(out, "  </meta>")?;
    writeln!(out, r#"  <graph mode="static" defaultedgetype="directed">"#)?;

    writeln!(out, r#"    <attributes class="node">"#)?;
    for (index, (name, kind)) in NODE_ATTRIBUTES.iter().enumerate() {
        writeln!(
            out,
            r#"      <attribute id="{}" title="{}" type="{}"/>"#,
            index,
            name,
            GexfExporter::attribute_type(*kind)
        )?;
    }
    writeln!(out, "    </attributes>")?;

    writeln!(out, "    <nodes>")?;
    for node in graph.nodes() {
        writeln!(
            out,
            r#"      <node id="{}" label="{}">"#,
            escape_xml(&node.id),
            escape_xml(&node.label)
        )?;
        writeln!(out, "        <attvalues>")?;
        for (index, value) in node_attributes(node).iter().enumerate() {
            if let Some(value) = value {
                writeln!(
                    out,
                    r#"          <attvalue for="{}" value="{}"/>"#,
                    index,
                    escape_xml(value)
                )?;
            }
        }
        writeln!(out, "        </attvalues>")?;
        writeln!(out, "      </node>")?;
    }
    writeln!(out, "    </nodes>")?;

    writeln!(out, "    <edges>")?;
    for (index, (from, to)) in graph.edge_ids().enumerate() {
        writeln!(
            out,
            r#"      <edge id="{}" source="{}" target="{}"/>"#,
            index,
            escape_xml(from),
            escape_xml(to)
        )?;
    }
    writeln!(out, "    </edges>")?;

    writeln!(out, "  </graph>")?;
    writeln!(out, "</gexf>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{CitationRecord, PageContext};

    #[test]
    fn test_render_nodes_edges_and_attributes() {
        let mut graph = CitationGraph::new();
        let mut record = CitationRecord::new("a", "Graphs & Trees");
        record.year = Some("2020".to_string());
        record.cited_by_count = Some(12);
        let context = PageContext {
            id: "b".to_string(),
            title: "Root".to_string(),
            cited_by_count: None,
        };
        graph.insert(&record, Some(&context));
        graph.recompute_derived(None);

        let xml = GexfExporter.render(&graph).unwrap();

        assert!(xml.contains(r#"defaultedgetype="directed""#));
        assert!(xml.contains(r#"<node id="a" label="Graphs &amp; Trees">"#));
        assert!(xml.contains(r#"<node id="b" label="Root">"#));
        assert!(xml.contains(r#"<edge id="0" source="a" target="b"/>"#));
        assert!(xml.contains(r#"title="cited_by" type="long""#));
        assert!(xml.contains(r#"value="2020""#));
        assert!(xml.trim_end().ends_with("</gexf>"));
    }
}
