//! Neo4j-backed record store
//!
//! Each document is a node labelled after its collection. The JSON body lives
//! in the `doc` property; `order`, `createdSeq` and the collection's lookup
//! fields are promoted to indexed properties so list and lookup queries are
//! index-assisted.

use super::models::{document_order, document_str, merge_document, Collection, Document};
use super::traits::RecordStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use neo4rs::{query, Graph, Query};
use std::sync::Arc;
use uuid::Uuid;

/// Client for Neo4j operations
pub struct Neo4jRecordStore {
    graph: Arc<Graph>,
}

impl Neo4jRecordStore {
    /// Create a new Neo4j record store
    pub async fn new(uri: &str, user: &str, password: &str) -> Result<Self> {
        let graph = Graph::new(uri, user, password)
            .await
            .context("Failed to connect to Neo4j")?;

        let client = Self {
            graph: Arc::new(graph),
        };

        // Initialize schema
        client.init_schema().await?;

        Ok(client)
    }

    /// Initialize constraints and indexes for every collection
    async fn init_schema(&self) -> Result<()> {
        let mut statements = Vec::new();

        for collection in Collection::ALL {
            let name = collection.name();
            let label = collection.label();
            statements.push(format!(
                "CREATE CONSTRAINT {name}_id IF NOT EXISTS FOR (r:{label}) REQUIRE r.id IS UNIQUE"
            ));
            if collection.is_ordered() {
                statements.push(format!(
                    "CREATE INDEX {name}_order IF NOT EXISTS FOR (r:{label}) ON (r.order)"
                ));
            }
            for field in collection.lookup_fields() {
                if collection.unique_fields().contains(field) {
                    statements.push(format!(
                        "CREATE CONSTRAINT {name}_{field} IF NOT EXISTS FOR (r:{label}) REQUIRE r.{field} IS UNIQUE"
                    ));
                } else {
                    statements.push(format!(
                        "CREATE INDEX {name}_{field} IF NOT EXISTS FOR (r:{label}) ON (r.{field})"
                    ));
                }
            }
        }

        for statement in statements {
            if let Err(e) = self.graph.run(query(&statement)).await {
                tracing::warn!("Schema statement may already exist: {}", e);
            }
        }

        Ok(())
    }

    /// Execute a parameterized query and collect the `doc` column
    async fn fetch_docs(&self, q: Query) -> Result<Vec<Document>> {
        let mut result = self.graph.execute(q).await?;
        let mut docs = Vec::new();
        while let Some(row) = result.next().await? {
            let raw: String = row.get("doc")?;
            docs.push(parse_doc(&raw)?);
        }
        Ok(docs)
    }

    /// Execute a parameterized query returning a single `n` count column
    async fn fetch_count(&self, q: Query) -> Result<i64> {
        let mut result = self.graph.execute(q).await?;
        match result.next().await? {
            Some(row) => Ok(row.get::<i64>("n")?),
            None => Ok(0),
        }
    }
}

fn parse_doc(raw: &str) -> Result<Document> {
    serde_json::from_str(raw).context("Stored document is not a JSON object")
}

/// Attach the promoted lookup properties of `doc` to a query as `$lk_<field>`
fn with_lookup_params(mut q: Query, collection: Collection, doc: &Document) -> Query {
    for field in collection.lookup_fields() {
        let value = document_str(doc, field).unwrap_or_default().to_string();
        q = q.param(&format!("lk_{}", field), value);
    }
    q
}

/// `, r.slug = $lk_slug` style SET fragment for the lookup properties
fn lookup_set_clause(collection: Collection) -> String {
    collection
        .lookup_fields()
        .iter()
        .map(|field| format!(", r.{field} = $lk_{field}"))
        .collect()
}

#[async_trait]
impl RecordStore for Neo4jRecordStore {
    async fn insert(&self, collection: Collection, id: Uuid, doc: Document) -> Result<()> {
        let lookups = collection
            .lookup_fields()
            .iter()
            .map(|field| format!(", {field}: $lk_{field}"))
            .collect::<String>();
        let cypher = format!(
            "CREATE (r:{} {{id: $id, doc: $doc, order: $order, createdSeq: $seq{}}})",
            collection.label(),
            lookups
        );

        let q = query(&cypher)
            .param("id", id.to_string())
            .param("doc", serde_json::to_string(&doc)?)
            .param("order", document_order(&doc))
            .param("seq", chrono::Utc::now().timestamp_micros());
        let q = with_lookup_params(q, collection, &doc);

        self.graph
            .run(q)
            .await
            .with_context(|| format!("Failed to insert into {}", collection))?;
        Ok(())
    }

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Document>> {
        let cypher = format!(
            "MATCH (r:{} {{id: $id}}) RETURN r.doc AS doc",
            collection.label()
        );
        let q = query(&cypher).param("id", id.to_string());
        Ok(self.fetch_docs(q).await?.into_iter().next())
    }

    async fn list_by_order(&self, collection: Collection) -> Result<Vec<Document>> {
        let cypher = format!(
            r#"
            MATCH (r:{})
            RETURN r.doc AS doc
            ORDER BY r.order ASC, r.createdSeq ASC
            "#,
            collection.label()
        );
        self.fetch_docs(query(&cypher)).await
    }

    async fn find_first(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Option<Document>> {
        let field = collection.lookup_field(field)?;
        let cypher = format!(
            r#"
            MATCH (r:{})
            WHERE r.{} = $value
            RETURN r.doc AS doc
            ORDER BY r.createdSeq ASC
            LIMIT 1
            "#,
            collection.label(),
            field
        );
        let q = query(&cypher).param("value", value);
        Ok(self.fetch_docs(q).await?.into_iter().next())
    }

    async fn patch(&self, collection: Collection, id: Uuid, fields: Document) -> Result<bool> {
        // Read-merge-write: two statements, last writer wins
        let Some(mut doc) = self.get(collection, id).await? else {
            return Ok(false);
        };
        merge_document(&mut doc, fields);

        let cypher = format!(
            r#"
            MATCH (r:{} {{id: $id}})
            SET r.doc = $doc, r.order = $order{}
            RETURN count(r) AS n
            "#,
            collection.label(),
            lookup_set_clause(collection)
        );
        let q = query(&cypher)
            .param("id", id.to_string())
            .param("doc", serde_json::to_string(&doc)?)
            .param("order", document_order(&doc));
        let q = with_lookup_params(q, collection, &doc);

        let n = self
            .fetch_count(q)
            .await
            .with_context(|| format!("Failed to patch {} {}", collection, id))?;
        Ok(n > 0)
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool> {
        let cypher = format!(
            r#"
            MATCH (r:{} {{id: $id}})
            WITH r, count(r) AS n
            DETACH DELETE r
            RETURN n
            "#,
            collection.label()
        );
        let q = query(&cypher).param("id", id.to_string());
        let n = self
            .fetch_count(q)
            .await
            .with_context(|| format!("Failed to delete {} {}", collection, id))?;
        Ok(n > 0)
    }

    async fn count(&self, collection: Collection) -> Result<usize> {
        let cypher = format!("MATCH (r:{}) RETURN count(r) AS n", collection.label());
        Ok(self.fetch_count(query(&cypher)).await? as usize)
    }

    async fn health_check(&self) -> Result<bool> {
        let mut result = self.graph.execute(query("RETURN 1 AS ok")).await?;
        Ok(result.next().await?.is_some())
    }
}
