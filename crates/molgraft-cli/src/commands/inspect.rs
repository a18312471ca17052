use super::read_graph;
use crate::cli::InspectArgs;
use crate::error::Result;
use molgraft::core::models::graph::DGraph;

pub fn run(args: InspectArgs) -> Result<()> {
    let graph = read_graph(&args.graph)?;
    print!("{}", summary(&graph));
    Ok(())
}

fn summary(graph: &DGraph) -> String {
    let int_ids = |ids: Vec<_>| -> Vec<u32> {
        ids.into_iter()
            .filter_map(|v| graph.vertex(v).map(|x| x.id))
            .collect()
    };
    let mut out = String::new();
    out.push_str(&format!(
        "Graph: {} vertices, {} edges, {} rings\n",
        graph.vertex_count(),
        graph.edge_count(),
        graph.rings().len()
    ));
    out.push_str(&format!("Ring-closing vertices: {:?}\n", int_ids(graph.rcvs())));
    out.push_str(&format!("Free ring-closing vertices: {:?}\n", int_ids(graph.free_rcvs())));
    for vid in graph.vertex_ids_sorted() {
        let Some(vertex) = graph.vertex(vid) else {
            continue;
        };
        let bb_id = vertex
            .bb_id()
            .map_or_else(|| "-".to_string(), |id| id.to_string());
        out.push_str(&format!(
            "  vertex {:>4}  {:<9} bb {:>4}  aps {}/{} free{}\n",
            vertex.id,
            vertex.bb_type().to_string(),
            bb_id,
            vertex.free_ap_count(),
            vertex.ap_count(),
            if vertex.is_template() { "  [template]" } else { "" }
        ));
    }
    let nested = graph.nested_graphs().len() - 1;
    if nested > 0 {
        out.push_str(&format!("Embedded graphs: {nested}\n"));
    }
    out
}
