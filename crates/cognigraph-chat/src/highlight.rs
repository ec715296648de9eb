//! Map an answer back to graph node ids for highlighting.
//!
//! A node is highlighted when its name shows up in the answer text
//! (substring for names longer than 3 chars, or at least half of its
//! tokens) AND the node is grounded in the retrieval: one of its
//! mention chunks was retrieved, or its name appears in the retrieved
//! text. No match is not an error; the set may be empty.

use std::collections::HashSet;

use cognigraph_graph::{GraphNode, KnowledgeGraph};

/// Select node ids to highlight for an answer.
pub fn select_nodes(
    graph: &KnowledgeGraph,
    answer: &str,
    retrieved_chunk_ids: &HashSet<String>,
    retrieved_text: &str,
) -> Vec<String> {
    let answer_lower = answer.to_lowercase();
    let answer_tokens = token_set(answer);
    let retrieved_lower = retrieved_text.to_lowercase();
    let retrieved_tokens = token_set(retrieved_text);

    let mut selected: Vec<String> = graph
        .nodes()
        .filter(|node| {
            appears_in(node, &answer_lower, &answer_tokens)
                && is_grounded(node, retrieved_chunk_ids, &retrieved_lower, &retrieved_tokens)
        })
        .map(|node| node.id.clone())
        .collect();

    selected.sort();
    selected
}

/// Does the node's name appear in this text?
fn appears_in(node: &GraphNode, text_lower: &str, text_tokens: &HashSet<String>) -> bool {
    // Substring match, for names long enough not to fire on noise.
    if node.id.len() > 3 && text_lower.contains(&node.id) {
        return true;
    }

    // Token overlap: at least half of the node's tokens present.
    let node_tokens: Vec<String> = node
        .id
        .split_whitespace()
        .filter(|t| t.len() > 2)
        .map(normalize_token)
        .collect();
    if node_tokens.is_empty() {
        return false;
    }
    let matched = node_tokens
        .iter()
        .filter(|t| text_tokens.contains(*t))
        .count();
    matched * 2 >= node_tokens.len()
}

fn is_grounded(
    node: &GraphNode,
    retrieved_chunk_ids: &HashSet<String>,
    retrieved_lower: &str,
    retrieved_tokens: &HashSet<String>,
) -> bool {
    if node
        .mentions
        .iter()
        .any(|chunk_id| retrieved_chunk_ids.contains(chunk_id))
    {
        return true;
    }
    appears_in(node, retrieved_lower, retrieved_tokens)
}

/// Lowercased alphanumeric tokens, markdown emphasis stripped.
fn token_set(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

fn normalize_token(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cognigraph_graph::NodeType;

    fn sample_graph() -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::new();
        graph.upsert_node("Alice", NodeType::Person, "s:0");
        graph.upsert_node("Acme Corp", NodeType::Organization, "s:0");
        graph.upsert_node("Bob", NodeType::Person, "s:5");
        graph
    }

    fn ids(values: &[&str]) -> HashSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_substring_match_with_retrieved_mention() {
        let graph = sample_graph();
        let selected = select_nodes(
            &graph,
            "Alice works at Acme Corp.",
            &ids(&["s:0"]),
            "Alice works at Acme Corp.",
        );
        assert_eq!(selected, vec!["acme corp", "alice"]);
    }

    #[test]
    fn test_unretrieved_node_is_not_highlighted() {
        let graph = sample_graph();
        // Bob's only mention (s:5) was not retrieved and Bob is not in
        // the retrieved text.
        let selected = select_nodes(
            &graph,
            "Bob is mentioned in the answer.",
            &ids(&["s:0"]),
            "Alice works at Acme Corp.",
        );
        assert!(selected.is_empty());
    }

    #[test]
    fn test_token_overlap_matches_partial_name() {
        let graph = sample_graph();
        // "Acme" alone is half of "acme corp"'s tokens.
        let selected = select_nodes(
            &graph,
            "The company **Acme** was founded long ago.",
            &ids(&["s:0"]),
            "Acme Corp appears here.",
        );
        assert_eq!(selected, vec!["acme corp"]);
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let graph = sample_graph();
        let selected = select_nodes(
            &graph,
            "This information is not available in the uploaded document.",
            &ids(&["s:0"]),
            "Alice works at Acme Corp.",
        );
        assert!(selected.is_empty());
    }

    #[test]
    fn test_case_insensitive_matching() {
        let graph = sample_graph();
        let selected = select_nodes(
            &graph,
            "ALICE is the protagonist.",
            &ids(&["s:0"]),
            "alice appears in this excerpt",
        );
        assert_eq!(selected, vec!["alice"]);
    }
}
