// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Serializes a recovered [`crate::cfg::Graph`] to Graphviz DOT text,
//! the one external sink this crate ships.  The original tool this
//! project was distilled from built the same shape of graph with
//! `gvgen.GvGen()`; a hand-written `digraph { ... }` emitter covers
//! the same ground without pulling in a graph-layout dependency this
//! crate has no other use for.

use std::fmt::Write as _;

use crate::cfg::Graph;
use crate::render::render_block;

/// Render `graph` as a DOT `digraph`, quoting each block's normalized
/// text as its node label.  Blocks with an unresolved jump get an
/// edge to a synthetic `"[anywhere]"` node.
pub fn to_dot(graph: &Graph) -> String {
    let mut out = String::new();
    out.push_str("digraph cfg {\n");
    out.push_str("  node [shape=box fontname=monospace];\n");

    for (addr, block) in &graph.blocks {
        let label = render_block(block).replace('\\', "\\\\").replace('"', "\\\"");
        let _ = writeln!(out, "  n{addr} [label=\"{label}\"];", addr = addr, label = label.replace('\n', "\\l"));
    }
    if graph.anywhere_from.len() > 0 {
        out.push_str("  anywhere [label=\"[anywhere]\" shape=ellipse];\n");
    }
    for edge in &graph.edges {
        let _ = writeln!(out, "  n{} -> n{};", edge.0, edge.1);
    }
    for addr in &graph.anywhere_from {
        let _ = writeln!(out, "  n{addr} -> anywhere;", addr = addr);
    }
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{block::segment, cfg::resolve};

    #[test]
    fn test_dot_contains_nodes_and_edges() {
        // PUSH1 4; JUMP; JUMPDEST; STOP
        let blocks = segment(&[0x60, 0x04, 0x56, 0x5b, 0x00]);
        let graph = resolve(blocks);
        let dot = to_dot(&graph);
        assert!(dot.starts_with("digraph cfg {\n"));
        assert!(dot.contains("n0"));
        assert!(dot.contains("n3"));
        assert!(dot.contains("n0 -> n3;"));
        assert!(dot.ends_with("}\n"));
    }

    #[test]
    fn test_dot_anywhere_sink_present_when_unresolved() {
        // JUMPDEST; JUMP
        let blocks = segment(&[0x5b, 0x56]);
        let graph = resolve(blocks);
        let dot = to_dot(&graph);
        assert!(dot.contains("[anywhere]"));
        assert!(dot.contains("n0 -> anywhere;"));
    }
}
