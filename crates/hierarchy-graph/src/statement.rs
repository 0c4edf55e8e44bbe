use hierarchy_core::HierarchyId;

/// Column every statement returns its nodes under.
pub const RETURN_COLUMN: &str = "n";

/// Shape of a statement, used for logging and by clients that do not speak Cypher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Liveness probe against the whole database
    Probe,
    /// Any node of the hierarchy (existence and code list check)
    AnyNode,
    /// Nodes without an outgoing parent edge
    Root,
    /// Nodes matching a code
    Node,
    /// Direct children of a code, ordered by label
    Children,
    /// Transitive parents of a code, nearest first
    Ancestors,
}

impl StatementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::Probe => "probe",
            StatementKind::AnyNode => "any_node",
            StatementKind::Root => "root",
            StatementKind::Node => "node",
            StatementKind::Children => "children",
            StatementKind::Ancestors => "ancestors",
        }
    }
}

/// A parameterized Cypher statement scoped to one hierarchy's node label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub kind: StatementKind,
    /// Node label of the hierarchy, `None` for database-wide statements
    pub label: Option<String>,
    /// Bound to `$code`
    pub code: Option<String>,
    pub cypher: String,
}

impl Statement {
    pub fn probe() -> Self {
        Self {
            kind: StatementKind::Probe,
            label: None,
            code: None,
            cypher: format!("MATCH ({n}) RETURN {n} LIMIT 1", n = RETURN_COLUMN),
        }
    }

    pub fn any_node(id: &HierarchyId) -> Self {
        let label = id.node_label();
        let cypher = format!(
            "MATCH ({n}:`{label}`) RETURN {n} LIMIT 1",
            n = RETURN_COLUMN,
            label = escape_label(&label)
        );
        Self::scoped(StatementKind::AnyNode, label, None, cypher)
    }

    pub fn root(id: &HierarchyId) -> Self {
        let label = id.node_label();
        let cypher = format!(
            "MATCH ({n}:`{label}`) WHERE NOT ({n})-[:hasParent]->() RETURN {n}",
            n = RETURN_COLUMN,
            label = escape_label(&label)
        );
        Self::scoped(StatementKind::Root, label, None, cypher)
    }

    pub fn node(id: &HierarchyId, code: &str) -> Self {
        let label = id.node_label();
        let cypher = format!(
            "MATCH ({n}:`{label}` {{code: $code}}) RETURN {n}",
            n = RETURN_COLUMN,
            label = escape_label(&label)
        );
        Self::scoped(StatementKind::Node, label, Some(code), cypher)
    }

    pub fn children(id: &HierarchyId, code: &str) -> Self {
        let label = id.node_label();
        let cypher = format!(
            "MATCH (:`{label}` {{code: $code}})<-[:hasParent]-({n}) RETURN {n} ORDER BY {n}.label",
            n = RETURN_COLUMN,
            label = escape_label(&label)
        );
        Self::scoped(StatementKind::Children, label, Some(code), cypher)
    }

    /// Unbounded `hasParent*` traversal; ordering on path length puts the
    /// nearest ancestor first and the root last.
    pub fn ancestors(id: &HierarchyId, code: &str) -> Self {
        let label = id.node_label();
        let cypher = format!(
            "MATCH p = (:`{label}` {{code: $code}})-[:hasParent*]->({n}) RETURN {n} ORDER BY length(p)",
            n = RETURN_COLUMN,
            label = escape_label(&label)
        );
        Self::scoped(StatementKind::Ancestors, label, Some(code), cypher)
    }

    fn scoped(kind: StatementKind, label: String, code: Option<&str>, cypher: String) -> Self {
        Self {
            kind,
            label: Some(label),
            code: code.map(str::to_string),
            cypher,
        }
    }
}

/// Backticks inside a quoted Cypher identifier are escaped by doubling.
fn escape_label(label: &str) -> String {
    label.replace('`', "``")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hierarchy() -> HierarchyId {
        HierarchyId::new("hier12", "dim34")
    }

    #[test]
    fn statements_are_scoped_to_the_hierarchy_label() {
        let st = Statement::node(&hierarchy(), "cpi1");
        assert_eq!(
            st.cypher,
            "MATCH (n:`_hierarchy_node_hier12_dim34` {code: $code}) RETURN n"
        );
        assert_eq!(st.label.as_deref(), Some("_hierarchy_node_hier12_dim34"));
        assert_eq!(st.code.as_deref(), Some("cpi1"));
    }

    #[test]
    fn code_is_bound_not_interpolated() {
        let st = Statement::children(&hierarchy(), "x' OR 1=1");
        assert!(!st.cypher.contains("OR 1=1"));
        assert!(st.cypher.ends_with("ORDER BY n.label"));
    }

    #[test]
    fn ancestors_are_unbounded_and_ordered_by_distance() {
        let st = Statement::ancestors(&hierarchy(), "c");
        assert!(st.cypher.contains("[:hasParent*]"));
        assert!(st.cypher.ends_with("ORDER BY length(p)"));
    }

    #[test]
    fn root_excludes_nodes_with_a_parent() {
        let st = Statement::root(&hierarchy());
        assert!(st.cypher.contains("WHERE NOT (n)-[:hasParent]->()"));
        assert!(st.code.is_none());
    }

    #[test]
    fn backticks_in_identity_are_escaped() {
        let st = Statement::any_node(&HierarchyId::new("a`b", "d"));
        assert!(st.cypher.contains("`_hierarchy_node_a``b_d`"));
    }
}
