//! SQLite-backed graph store.
//!
//! # Responsibility
//! - Persist nodes, sibling order and alias edges in the `nodes` table.
//! - Keep SQL details behind the `GraphStore` boundary.
//!
//! # Invariants
//! - Child listing is deterministic: `sort_order ASC, node_uuid ASC`.
//! - Alias rows copy the source heading so `(parent_uuid, heading)` stays
//!   unique across aliases and ordinary children.
//! - Exactly one row has `parent_uuid IS NULL`.

use super::{check_alias_install, check_child_heading, GraphStore, StoreError, StoreResult};
use crate::db::migrations::latest_version;
use crate::model::node::{Node, NodeId, ROOT_HEADING};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const NODE_COLUMNS: [&str; 9] = [
    "node_uuid",
    "parent_uuid",
    "heading",
    "title",
    "body",
    "sort_order",
    "alias_src_uuid",
    "created_at",
    "updated_at",
];

/// SQLite-backed graph store over a migrated connection.
pub struct SqliteGraphStore<'conn> {
    conn: &'conn Connection,
    root: NodeId,
}

impl<'conn> SqliteGraphStore<'conn> {
    /// Creates a store from a migrated connection, inserting the root row
    /// when the table is empty.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_graph_connection_ready(conn)?;
        let root = match load_root(conn)? {
            Some(root) => root,
            None => {
                let root = Uuid::new_v4();
                conn.execute(
                    "INSERT INTO nodes (node_uuid, parent_uuid, heading, title, sort_order)
                     VALUES (?1, NULL, ?2, ?2, 0);",
                    params![root.to_string(), ROOT_HEADING],
                )?;
                info!("event=graph_root_init module=store status=ok root={root}");
                root
            }
        };
        Ok(Self { conn, root })
    }

    fn require_node(&self, id: NodeId) -> StoreResult<()> {
        if self.exists(id)? {
            Ok(())
        } else {
            Err(StoreError::NodeNotFound(id))
        }
    }

    fn content_id(&self, id: NodeId) -> StoreResult<NodeId> {
        Ok(self.fetch_alias_source(id)?.unwrap_or(id))
    }

    fn read_text_column(&self, id: NodeId, column: &'static str) -> StoreResult<String> {
        let target = self.content_id(id)?;
        let value = self
            .conn
            .query_row(
                &format!("SELECT {column} FROM nodes WHERE node_uuid = ?1;"),
                [target.to_string()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        value.ok_or(StoreError::NodeNotFound(target))
    }

    fn write_text_column(&self, id: NodeId, column: &'static str, value: &str) -> StoreResult<()> {
        let target = self.content_id(id)?;
        let changed = self.conn.execute(
            &format!(
                "UPDATE nodes
                 SET {column} = ?2,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE node_uuid = ?1;"
            ),
            params![target.to_string(), value],
        )?;
        if changed == 0 {
            return Err(StoreError::NodeNotFound(target));
        }
        Ok(())
    }

    fn ensure_heading_free(&self, parent: NodeId, heading: &str) -> StoreResult<()> {
        let taken: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM nodes WHERE parent_uuid = ?1 AND heading = ?2
            );",
            params![parent.to_string(), heading],
            |row| row.get(0),
        )?;
        if taken == 1 {
            return Err(StoreError::DuplicateHeading {
                parent,
                heading: heading.to_string(),
            });
        }
        Ok(())
    }

    fn ensure_can_own_children(&self, parent: NodeId) -> StoreResult<()> {
        if self.is_alias(parent)? {
            return Err(StoreError::InvalidAlias(format!(
                "alias {parent} cannot own children"
            )));
        }
        Ok(())
    }

    fn strict_ancestors(&self, id: NodeId) -> StoreResult<Vec<NodeId>> {
        let mut ancestors = Vec::new();
        let mut current = self.fetch_parent(id)?;
        while let Some(parent) = current {
            if ancestors.contains(&parent) {
                return Err(StoreError::InvalidData(format!(
                    "parent cycle detected at {parent}"
                )));
            }
            ancestors.push(parent);
            current = self.fetch_parent(parent)?;
        }
        Ok(ancestors)
    }

    fn insert_row(
        &self,
        parent: NodeId,
        heading: &str,
        title: &str,
        alias_src: Option<NodeId>,
    ) -> StoreResult<NodeId> {
        let id = Uuid::new_v4();
        let sort_order = next_sort_order(self.conn, parent)?;
        self.conn.execute(
            "INSERT INTO nodes (
                node_uuid,
                parent_uuid,
                heading,
                title,
                sort_order,
                alias_src_uuid
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                id.to_string(),
                parent.to_string(),
                heading,
                title,
                sort_order,
                alias_src.map(|value| value.to_string()),
            ],
        )?;
        Ok(id)
    }
}

impl GraphStore for SqliteGraphStore<'_> {
    fn root_node(&self) -> NodeId {
        self.root
    }

    fn exists(&self, id: NodeId) -> StoreResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM nodes WHERE node_uuid = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn fetch_node(&self, id: NodeId) -> StoreResult<Node> {
        let mut stmt = self.conn.prepare(
            "SELECT
                n.node_uuid,
                n.parent_uuid,
                COALESCE(s.heading, n.heading),
                COALESCE(s.title, n.title),
                COALESCE(s.body, n.body),
                n.alias_src_uuid
             FROM nodes n
             LEFT JOIN nodes s ON s.node_uuid = n.alias_src_uuid
             WHERE n.node_uuid = ?1;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => parse_node_row(row),
            None => Err(StoreError::NodeNotFound(id)),
        }
    }

    fn fetch_parent(&self, id: NodeId) -> StoreResult<Option<NodeId>> {
        let parent = self
            .conn
            .query_row(
                "SELECT parent_uuid FROM nodes WHERE node_uuid = ?1;",
                [id.to_string()],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?
            .ok_or(StoreError::NodeNotFound(id))?;
        parent
            .map(|value| parse_uuid(&value, "parent_uuid"))
            .transpose()
    }

    fn fetch_children(&self, id: NodeId) -> StoreResult<Vec<NodeId>> {
        self.require_node(id)?;
        let mut stmt = self.conn.prepare(
            "SELECT node_uuid
             FROM nodes
             WHERE parent_uuid = ?1
             ORDER BY sort_order ASC, node_uuid ASC;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        let mut children = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            children.push(parse_uuid(&value, "node_uuid")?);
        }
        Ok(children)
    }

    fn fetch_heading(&self, id: NodeId) -> StoreResult<String> {
        self.read_text_column(id, "heading")
    }

    fn fetch_title(&self, id: NodeId) -> StoreResult<String> {
        self.read_text_column(id, "title")
    }

    fn fetch_body(&self, id: NodeId) -> StoreResult<String> {
        self.read_text_column(id, "body")
    }

    fn update_title(&mut self, id: NodeId, title: &str) -> StoreResult<()> {
        self.write_text_column(id, "title", title)
    }

    fn update_body(&mut self, id: NodeId, body: &str) -> StoreResult<()> {
        self.write_text_column(id, "body", body)
    }

    fn create_child(
        &mut self,
        parent: NodeId,
        heading: &str,
        title: &str,
    ) -> StoreResult<NodeId> {
        check_child_heading(heading)?;
        self.require_node(parent)?;
        self.ensure_can_own_children(parent)?;
        self.ensure_heading_free(parent, heading)?;
        self.insert_row(parent, heading, title, None)
    }

    fn erase_node(&mut self, id: NodeId) -> StoreResult<()> {
        if id == self.root {
            return Err(StoreError::RootImmutable);
        }
        self.require_node(id)?;
        if !self.fetch_children(id)?.is_empty() {
            return Err(StoreError::NodeHasChildren(id));
        }
        if !self.fetch_aliases_to(id)?.is_empty() {
            return Err(StoreError::InvalidAlias(format!(
                "node {id} is still referenced by aliases"
            )));
        }
        self.conn.execute(
            "DELETE FROM nodes WHERE node_uuid = ?1;",
            [id.to_string()],
        )?;
        Ok(())
    }

    fn is_alias(&self, id: NodeId) -> StoreResult<bool> {
        Ok(self.fetch_alias_source(id)?.is_some())
    }

    fn fetch_alias_source(&self, id: NodeId) -> StoreResult<Option<NodeId>> {
        let source = self
            .conn
            .query_row(
                "SELECT alias_src_uuid FROM nodes WHERE node_uuid = ?1;",
                [id.to_string()],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?
            .ok_or(StoreError::NodeNotFound(id))?;
        source
            .map(|value| parse_uuid(&value, "alias_src_uuid"))
            .transpose()
    }

    fn fetch_aliases_to(&self, src: NodeId) -> StoreResult<Vec<NodeId>> {
        self.require_node(src)?;
        let mut stmt = self.conn.prepare(
            "SELECT node_uuid
             FROM nodes
             WHERE alias_src_uuid = ?1
             ORDER BY node_uuid ASC;",
        )?;
        let mut rows = stmt.query([src.to_string()])?;
        let mut aliases = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            aliases.push(parse_uuid(&value, "node_uuid")?);
        }
        Ok(aliases)
    }

    fn install_alias(&mut self, src: NodeId, dst: NodeId) -> StoreResult<NodeId> {
        let src_is_alias = self.is_alias(src)?;
        let heading = self.fetch_heading(src)?;
        self.require_node(dst)?;
        self.ensure_can_own_children(dst)?;
        let ancestors = self.strict_ancestors(dst)?;
        check_alias_install(self.root, src, dst, &heading, src_is_alias, &ancestors)?;
        self.ensure_heading_free(dst, &heading)?;
        self.insert_row(dst, &heading, "", Some(src))
    }
}

fn load_root(conn: &Connection) -> StoreResult<Option<NodeId>> {
    let root = conn
        .query_row(
            "SELECT node_uuid FROM nodes WHERE parent_uuid IS NULL;",
            [],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    root.map(|value| parse_uuid(&value, "node_uuid")).transpose()
}

fn next_sort_order(conn: &Connection, parent: NodeId) -> StoreResult<i64> {
    let next = conn.query_row(
        "SELECT COALESCE(MAX(sort_order), -1) + 1
         FROM nodes
         WHERE parent_uuid = ?1;",
        [parent.to_string()],
        |row| row.get(0),
    )?;
    Ok(next)
}

fn parse_node_row(row: &Row<'_>) -> StoreResult<Node> {
    let id: String = row.get(0)?;
    let parent: Option<String> = row.get(1)?;
    let alias_source: Option<String> = row.get(5)?;
    Ok(Node {
        id: parse_uuid(&id, "node_uuid")?,
        parent: parent
            .map(|value| parse_uuid(&value, "parent_uuid"))
            .transpose()?,
        heading: row.get(2)?,
        title: row.get(3)?,
        body: row.get(4)?,
        alias_source: alias_source
            .map(|value| parse_uuid(&value, "alias_src_uuid"))
            .transpose()?,
    })
}

fn parse_uuid(value: &str, column: &'static str) -> StoreResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| StoreError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn ensure_graph_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let mut stmt = conn.prepare("PRAGMA table_info(nodes);")?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get::<_, String>(1)?);
    }
    if columns.is_empty() {
        return Err(StoreError::MissingSchema("table `nodes`".to_string()));
    }
    for column in NODE_COLUMNS {
        if !columns.iter().any(|current| current == column) {
            return Err(StoreError::MissingSchema(format!(
                "column `{column}` in table `nodes`"
            )));
        }
    }
    Ok(())
}
