//! Graph document persistence in `graph_nodes` / `graph_edges`.
//!
//! [`GraphStore::export`] replaces the whole stored graph with a
//! [`GraphDocument`]; [`GraphStore::import`] reads it back. Node and edge
//! properties are stored as JSONB, labels as `TEXT[]`.

use caravan_world::{GraphDocument, GraphEdge, GraphNode};
use serde_json::{Map, Value};
use sqlx::PgPool;

use crate::error::DbError;

/// Operations on the `graph_nodes` and `graph_edges` tables.
pub struct GraphStore<'a> {
    pool: &'a PgPool,
}

impl<'a> GraphStore<'a> {
    /// Create a new graph store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Replace the stored graph with `doc` in one transaction.
    ///
    /// Nodes and edges are each written with a single UNNEST insert. Edge
    /// ids follow document order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if any statement fails, for example
    /// when an edge points at a node missing from the document.
    pub async fn export(&self, doc: &GraphDocument) -> Result<(), DbError> {
        let nodes = NodeColumns::from_nodes(&doc.nodes);
        let edges = EdgeColumns::from_edges(&doc.edges);

        let mut tx = self.pool.begin().await?;

        // Cascades to graph_edges.
        sqlx::query("DELETE FROM graph_nodes").execute(&mut *tx).await?;

        sqlx::query(
            r"INSERT INTO graph_nodes (id, labels, properties)
              SELECT id, ARRAY(SELECT jsonb_array_elements_text(labels)), properties
              FROM UNNEST($1::TEXT[], $2::JSONB[], $3::JSONB[]) AS t (id, labels, properties)",
        )
        .bind(&nodes.ids)
        .bind(&nodes.labels)
        .bind(&nodes.properties)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"INSERT INTO graph_edges (source, target, rel_type, properties)
              SELECT source, target, rel_type, properties
              FROM UNNEST($1::TEXT[], $2::TEXT[], $3::TEXT[], $4::JSONB[])
                   WITH ORDINALITY AS t (source, target, rel_type, properties, ord)
              ORDER BY ord",
        )
        .bind(&edges.sources)
        .bind(&edges.targets)
        .bind(&edges.rel_types)
        .bind(&edges.properties)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            nodes = nodes.ids.len(),
            edges = edges.sources.len(),
            "Exported graph to PostgreSQL"
        );
        Ok(())
    }

    /// Read the stored graph back as a document.
    ///
    /// Nodes come back ordered by id, edges in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if a query fails, or
    /// [`DbError::CorruptRow`] if stored properties are not JSON objects.
    pub async fn import(&self) -> Result<GraphDocument, DbError> {
        let nodes = sqlx::query_as::<_, GraphNodeRow>(
            "SELECT id, labels, properties FROM graph_nodes ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;

        let edges = sqlx::query_as::<_, GraphEdgeRow>(
            "SELECT source, target, rel_type, properties FROM graph_edges ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;

        let doc = GraphDocument {
            nodes: nodes
                .into_iter()
                .map(|row| {
                    Ok(GraphNode {
                        properties: object(row.properties, &row.id)?,
                        id: row.id,
                        labels: row.labels,
                    })
                })
                .collect::<Result<_, DbError>>()?,
            edges: edges
                .into_iter()
                .map(|row| {
                    let owner = format!("{}->{}", row.source, row.target);
                    Ok(GraphEdge {
                        properties: object(row.properties, &owner)?,
                        source: row.source,
                        target: row.target,
                        rel_type: row.rel_type,
                    })
                })
                .collect::<Result<_, DbError>>()?,
        };

        tracing::debug!(
            nodes = doc.nodes.len(),
            edges = doc.edges.len(),
            "Imported graph from PostgreSQL"
        );
        Ok(doc)
    }
}

/// A row from the `graph_nodes` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GraphNodeRow {
    /// Node identifier.
    pub id: String,
    /// Node labels.
    pub labels: Vec<String>,
    /// Node properties.
    pub properties: Value,
}

/// A row from the `graph_edges` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GraphEdgeRow {
    /// Source node identifier.
    pub source: String,
    /// Target node identifier.
    pub target: String,
    /// Relation type.
    pub rel_type: String,
    /// Edge properties.
    pub properties: Value,
}

/// Per-column arrays for the `graph_nodes` insert. Labels travel as JSON
/// arrays since `TEXT[][]` cannot hold rows of different lengths.
#[derive(Debug, Default)]
struct NodeColumns {
    ids: Vec<String>,
    labels: Vec<Value>,
    properties: Vec<Value>,
}

impl NodeColumns {
    fn from_nodes(nodes: &[GraphNode]) -> Self {
        let mut columns = Self::default();
        for node in nodes {
            columns.ids.push(node.id.clone());
            columns.labels.push(Value::from(node.labels.clone()));
            columns.properties.push(Value::Object(node.properties.clone()));
        }
        columns
    }
}

/// Per-column arrays for the `graph_edges` insert.
#[derive(Debug, Default)]
struct EdgeColumns {
    sources: Vec<String>,
    targets: Vec<String>,
    rel_types: Vec<String>,
    properties: Vec<Value>,
}

impl EdgeColumns {
    fn from_edges(edges: &[GraphEdge]) -> Self {
        let mut columns = Self::default();
        for edge in edges {
            columns.sources.push(edge.source.clone());
            columns.targets.push(edge.target.clone());
            columns.rel_types.push(edge.rel_type.clone());
            columns.properties.push(Value::Object(edge.properties.clone()));
        }
        columns
    }
}

fn object(value: Value, owner: &str) -> Result<Map<String, Value>, DbError> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(DbError::CorruptRow(format!(
            "properties of {owner} are not an object: {other}"
        ))),
    }
}
