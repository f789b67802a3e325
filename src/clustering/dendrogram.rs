// Plain-text dendrogram renderer.
//
//   + 7.0711
//   |-- + 1.0000
//   |   |-- alice
//   |   `-- bob
//   `-- + 1.0000
//       |-- carol
//       `-- dave

use super::traits::{ClusterOutcome, DendrogramRenderer};

#[derive(Debug, Clone, Copy, Default)]
pub struct TextDendrogram;

impl DendrogramRenderer for TextDendrogram {
    fn render(&self, outcome: &ClusterOutcome, labels: &[String]) -> String {
        let n = labels.len();
        let mut out = String::new();

        if outcome.merges.is_empty() {
            for label in labels {
                out.push_str(label);
                out.push('\n');
            }
            return out;
        }

        let root = n + outcome.merges.len() - 1;
        render_node(outcome, labels, root, "", None, &mut out);
        out
    }
}

/// `last` is `None` for the root, otherwise whether the node is the final
/// child of its parent.
fn render_node(
    outcome: &ClusterOutcome,
    labels: &[String],
    node: usize,
    prefix: &str,
    last: Option<bool>,
    out: &mut String,
) {
    let n = labels.len();
    let (connector, child_prefix) = match last {
        None => (String::new(), String::new()),
        Some(true) => (format!("{prefix}`-- "), format!("{prefix}    ")),
        Some(false) => (format!("{prefix}|-- "), format!("{prefix}|   ")),
    };

    if node < n {
        out.push_str(&format!("{connector}{}\n", labels[node]));
        return;
    }

    let merge = &outcome.merges[node - n];
    out.push_str(&format!("{connector}+ {:.4}\n", merge.distance));
    render_node(outcome, labels, merge.left, &child_prefix, Some(false), out);
    render_node(outcome, labels, merge.right, &child_prefix, Some(true), out);
}
