use gel_core::Node;

/// Serialize every node's emitted text, in order, one newline after each.
pub fn emit(nodes: &[Node]) -> String {
    let mut out = String::with_capacity(nodes.iter().map(|n| n.emitted().len() + 1).sum());
    for node in nodes {
        out.push_str(node.emitted());
        out.push('\n');
    }
    out
}
