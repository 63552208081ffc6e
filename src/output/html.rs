//! Force-directed HTML view
//!
//! A single self-contained page: the node-link JSON is embedded in the
//! document and drawn with d3's force simulation. Node radius follows `size`
//! and colour follows `community`; clicking a node opens its URL.

use crate::graph::CitationGraph;
use crate::output::json::to_node_link_json;
use crate::output::traits::{escape_xml, GraphExporter, OutputResult};

const TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>cite-ripple: __OPTIONS__</title>
<style>
  html, body { margin: 0; height: 100%; font-family: sans-serif; }
  #options { position: absolute; top: 8px; left: 12px; color: #555; font-size: 12px; }
  #tooltip { position: absolute; pointer-events: none; background: #fff; border: 1px solid #ccc;
             padding: 4px 8px; font-size: 12px; display: none; max-width: 360px; }
  svg { width: 100%; height: 100%; }
  line { stroke: #999; stroke-opacity: 0.5; }
  circle { stroke: #fff; stroke-width: 1px; cursor: pointer; }
</style>
<script src="https://cdn.jsdelivr.net/npm/d3@7"></script>
</head>
<body>
<div id="options">__OPTIONS__</div>
<div id="tooltip"></div>
<svg></svg>
<script>
const graph = __GRAPH_JSON__;
const svg = d3.select("svg");
const width = window.innerWidth, height = window.innerHeight;
const color = d3.scaleOrdinal(d3.schemeCategory10);
const maxSize = d3.max(graph.nodes, d => d.size) || 1;
const radius = d => 4 + 16 * (d.size / maxSize);
const tooltip = d3.select("#tooltip");

svg.append("defs").append("marker")
  .attr("id", "arrow").attr("viewBox", "0 -4 8 8").attr("refX", 8)
  .attr("markerWidth", 6).attr("markerHeight", 6).attr("orient", "auto")
  .append("path").attr("d", "M0,-4L8,0L0,4").attr("fill", "#999");

const view = svg.append("g");
svg.call(d3.zoom().on("zoom", e => view.attr("transform", e.transform)));

const link = view.append("g").selectAll("line").data(graph.links).join("line")
  .attr("marker-end", "url(#arrow)");

const node = view.append("g").selectAll("circle").data(graph.nodes).join("circle")
  .attr("r", radius)
  .attr("fill", d => color(d.community))
  .on("click", (e, d) => { if (d.url) window.open(d.url, "_blank"); })
  .on("mouseover", (e, d) => {
    tooltip.style("display", "block").text(
      [d.title, d.authors, d.year, d.cited_by != null ? "Cited by " + d.cited_by : null]
        .filter(Boolean).join(" · "));
  })
  .on("mousemove", e => tooltip.style("left", (e.pageX + 12) + "px").style("top", (e.pageY + 12) + "px"))
  .on("mouseout", () => tooltip.style("display", "none"))
  .call(d3.drag()
    .on("start", (e, d) => { if (!e.active) simulation.alphaTarget(0.3).restart(); d.fx = d.x; d.fy = d.y; })
    .on("drag", (e, d) => { d.fx = e.x; d.fy = e.y; })
    .on("end", (e, d) => { if (!e.active) simulation.alphaTarget(0); d.fx = null; d.fy = null; }));

const simulation = d3.forceSimulation(graph.nodes)
  .force("link", d3.forceLink(graph.links).distance(60))
  .force("charge", d3.forceManyBody().strength(-120))
  .force("collide", d3.forceCollide().radius(d => radius(d) + 2))
  .force("center", d3.forceCenter(width / 2, height / 2))
  .on("tick", () => {
    link.attr("x1", d => d.source.x).attr("y1", d => d.source.y)
        .attr("x2", d => d.target.x).attr("y2", d => d.target.y);
    node.attr("cx", d => d.x).attr("cy", d => d.y);
  });
</script>
</body>
</html>
"##;

/// Writes `<prefix>.html`
#[derive(Debug, Clone, Default)]
pub struct HtmlExporter {
    options: String,
}

impl HtmlExporter {
    /// Creates an exporter that shows `options` (the crawl invocation) in the page
    pub fn new(options: impl Into<String>) -> Self {
        Self {
            options: options.into(),
        }
    }
}

impl GraphExporter for HtmlExporter {
    fn extension(&self) -> &'static str {
        "html"
    }

    fn render(&self, graph: &CitationGraph) -> OutputResult<String> {
        // "</" inside a script element would end it early
        let json = to_node_link_json(graph)?.replace("</", "<\\/");
        Ok(TEMPLATE
            .replace("__OPTIONS__", &escape_xml(&self.options))
            .replace("__GRAPH_JSON__", &json))
    }
}
